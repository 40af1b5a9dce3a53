//! Copr API surface and wire schema.
//!
//! [`CoprApi`] is the seam between the collector and the network. The HTTP
//! implementation lives in [`super::http`], an in-memory one for tests in
//! [`super::fakes`].
//!
//! Monitor responses are converted into typed records right when they are
//! received. A build status Copr reports that we do not know about fails the
//! conversion instead of travelling further as a loose string.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::build_status::CoprBuildStatus;
use crate::error::CoprError;
use crate::Result;

/// Extra per-chroot fields the collector asks the monitor endpoint for.
pub const MONITOR_FIELDS: [&str; 2] = ["url_build_log", "url_build"];

/// Read-only view of the Copr API v3.
#[async_trait]
pub trait CoprApi: Send + Sync {
    /// Fetch a project. Returns [`CoprError::NoResult`] if it does not exist.
    async fn get_project(&self, ownername: &str, projectname: &str) -> Result<ProjectInfo>;

    /// Names of all chroots Copr currently supports.
    async fn mock_chroot_list(&self) -> Result<Vec<String>>;

    /// Latest build of every package in every chroot of a project.
    async fn monitor(
        &self,
        ownername: &str,
        projectname: &str,
        additional_fields: &[&str],
    ) -> Result<MonitorResponse>;
}

/// Subset of the project record returned by `GET /api_3/project`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: u64,
    pub name: String,
    pub ownername: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response of `GET /api_3/monitor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorResponse {
    pub packages: Vec<MonitorPackage>,
}

/// One package in a monitor response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorPackage {
    pub name: String,
    /// Chroot entries in the order Copr listed them.
    pub chroots: Vec<MonitorChroot>,
}

/// The latest build of a package in one chroot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorChroot {
    pub name: String,
    pub build_id: u64,
    pub state: CoprBuildStatus,
    pub url_build_log: Option<String>,
    pub url_build: Option<String>,
}

#[derive(Deserialize)]
struct RawPackage {
    name: String,
    #[serde(default)]
    chroots: serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
struct RawChroot {
    build_id: u64,
    state: String,
    #[serde(default)]
    url_build_log: Option<String>,
    #[serde(default)]
    url_build: Option<String>,
}

impl MonitorResponse {
    /// Convert a decoded JSON body into typed records.
    pub fn from_value(body: Value) -> Result<Self> {
        let packages = body
            .get("packages")
            .cloned()
            .ok_or_else(|| CoprError::Decode("monitor response has no \"packages\"".into()))?;
        let raw_packages: Vec<RawPackage> = serde_json::from_value(packages)?;

        let packages = raw_packages
            .into_iter()
            .map(package_from_raw)
            .collect::<Result<Vec<_>>>()?;
        Ok(MonitorResponse { packages })
    }

    /// Total number of chroot entries across all packages.
    pub fn chroot_count(&self) -> usize {
        self.packages.iter().map(|p| p.chroots.len()).sum()
    }
}

fn package_from_raw(raw: RawPackage) -> Result<MonitorPackage> {
    let mut chroots = Vec::with_capacity(raw.chroots.len());
    for (chroot_name, entry) in raw.chroots {
        let entry: RawChroot = serde_json::from_value(entry).map_err(|e| {
            CoprError::Decode(format!("package {} chroot {}: {}", raw.name, chroot_name, e))
        })?;
        chroots.push(MonitorChroot {
            name: chroot_name,
            build_id: entry.build_id,
            state: entry.state.parse()?,
            url_build_log: entry.url_build_log,
            url_build: entry.url_build,
        });
    }
    Ok(MonitorPackage {
        name: raw.name,
        chroots,
    })
}

/// Chroot names from the body of `GET /api_3/mock-chroots/list`.
///
/// Copr answers with an object mapping chroot name to a description.
pub fn chroot_names_from_value(body: Value) -> Result<Vec<String>> {
    match body {
        Value::Object(map) => Ok(map.into_iter().map(|(name, _)| name).collect()),
        other => Err(CoprError::Decode(format!(
            "expected chroot object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn monitor_body() -> Value {
        json!({
            "output": "ok",
            "message": "Project monitor request successful",
            "packages": [
                {
                    "name": "llvm",
                    "chroots": {
                        "fedora-rawhide-x86_64": {
                            "build_id": 8_000_001u64,
                            "state": "succeeded",
                            "status": 1,
                            "url_build_log": "https://example.org/builder-live.log.gz",
                            "url_build": "https://example.org/results/"
                        },
                        "rhel-9-s390x": {
                            "build_id": 8_000_002u64,
                            "state": "running",
                            "url_build_log": "https://example.org/builder-live.log"
                        }
                    }
                }
            ]
        })
    }

    #[test]
    fn test_monitor_from_value() {
        let monitor = MonitorResponse::from_value(monitor_body()).unwrap();
        assert_eq!(monitor.packages.len(), 1);
        assert_eq!(monitor.chroot_count(), 2);

        let llvm = &monitor.packages[0];
        assert_eq!(llvm.name, "llvm");
        assert_eq!(llvm.chroots[0].name, "fedora-rawhide-x86_64");
        assert_eq!(llvm.chroots[0].state, CoprBuildStatus::Succeeded);
        assert!(llvm.chroots[0].url_build.is_some());
        assert_eq!(llvm.chroots[1].state, CoprBuildStatus::Running);
        assert!(llvm.chroots[1].url_build.is_none());
    }

    #[test]
    fn test_monitor_keeps_chroot_order() {
        let body = json!({
            "packages": [{
                "name": "clang",
                "chroots": {
                    "rhel-9-x86_64": { "build_id": 1, "state": "pending" },
                    "fedora-40-aarch64": { "build_id": 2, "state": "pending" },
                    "fedora-rawhide-i386": { "build_id": 3, "state": "pending" }
                }
            }]
        });
        let monitor = MonitorResponse::from_value(body).unwrap();
        let names: Vec<&str> = monitor.packages[0]
            .chroots
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["rhel-9-x86_64", "fedora-40-aarch64", "fedora-rawhide-i386"]
        );
    }

    #[test]
    fn test_monitor_unknown_state_fails() {
        let body = json!({
            "packages": [{
                "name": "llvm",
                "chroots": {
                    "fedora-rawhide-x86_64": { "build_id": 1, "state": "unknown" }
                }
            }]
        });
        let err = MonitorResponse::from_value(body).unwrap_err();
        assert!(matches!(err, CoprError::UnknownStatus { .. }));
    }

    #[test]
    fn test_monitor_missing_packages_fails() {
        let err = MonitorResponse::from_value(json!({"output": "ok"})).unwrap_err();
        assert!(matches!(err, CoprError::Decode(_)));
    }

    #[test]
    fn test_monitor_missing_build_id_names_the_chroot() {
        let body = json!({
            "packages": [{
                "name": "llvm",
                "chroots": { "fedora-40-x86_64": { "state": "failed" } }
            }]
        });
        let err = MonitorResponse::from_value(body).unwrap_err();
        assert!(err.to_string().contains("fedora-40-x86_64"));
    }

    #[test]
    fn test_package_without_chroots() {
        let body = json!({ "packages": [{ "name": "python-lit" }] });
        let monitor = MonitorResponse::from_value(body).unwrap();
        assert!(monitor.packages[0].chroots.is_empty());
    }

    #[test]
    fn test_chroot_names_from_value() {
        let body = json!({
            "fedora-rawhide-x86_64": "",
            "rhel-9-s390x": "RHEL 9 s390x"
        });
        let names = chroot_names_from_value(body).unwrap();
        assert_eq!(names, vec!["fedora-rawhide-x86_64", "rhel-9-s390x"]);

        assert!(chroot_names_from_value(json!(["a"])).is_err());
    }

    #[test]
    fn test_project_info_decodes_partial_record() {
        let info: ProjectInfo = serde_json::from_value(json!({
            "id": 42,
            "name": "llvm-snapshots",
            "ownername": "@fedora-llvm-team",
            "chroot_repos": {}
        }))
        .unwrap();
        assert_eq!(info.id, 42);
        assert!(info.full_name.is_none());
    }
}

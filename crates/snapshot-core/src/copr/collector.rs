//! Build state collection.
//!
//! One monitor request per call, no caching and no retries: the caller
//! decides how often to poll, and errors from the client reach the caller
//! unchanged.

use tracing::{debug, info};

use super::api::{CoprApi, MONITOR_FIELDS};
use crate::build_status::{BuildState, BuildStateList};
use crate::Result;

/// Every `(package, chroot)` build state of a Copr project.
///
/// Records come out in the order Copr listed them: package by package, and
/// within a package chroot by chroot.
pub async fn get_all_build_states<C>(
    client: &C,
    ownername: &str,
    projectname: &str,
) -> Result<BuildStateList>
where
    C: CoprApi + ?Sized,
{
    let monitor = client
        .monitor(ownername, projectname, &MONITOR_FIELDS)
        .await?;

    debug!(
        packages = monitor.packages.len(),
        chroots = monitor.chroot_count(),
        "copr monitor response"
    );

    let mut states = BuildStateList::new();
    for package in monitor.packages {
        for chroot in package.chroots {
            let mut state = BuildState::new(&package.name, chroot.name, chroot.state)
                .with_build_id(chroot.build_id)
                .with_project(ownername, projectname);
            if let Some(url) = chroot.url_build_log {
                state = state.with_build_log(url);
            }
            if let Some(url) = chroot.url_build {
                state = state.with_build_url(url);
            }
            states.push(state);
        }
    }

    info!(
        owner = ownername,
        project = projectname,
        count = states.len(),
        "collected copr build states"
    );
    Ok(states)
}

/// Whether a Copr project exists.
///
/// Copr's "no result" answer is the expected way to learn that a project is
/// missing, so it maps to `Ok(false)`. Any other failure is returned.
pub async fn project_exists<C>(client: &C, ownername: &str, projectname: &str) -> Result<bool>
where
    C: CoprApi + ?Sized,
{
    match client.get_project(ownername, projectname).await {
        Ok(project) => {
            debug!(id = project.id, "copr project found");
            Ok(true)
        }
        Err(err) if err.is_no_result() => {
            debug!(owner = ownername, project = projectname, "copr project not found");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_status::CoprBuildStatus;
    use crate::copr::fakes::MemoryCopr;
    use crate::CoprError;
    use serde_json::json;

    fn fake() -> MemoryCopr {
        let copr = MemoryCopr::new();
        copr.add_project(
            "@fedora-llvm-team",
            "llvm-snapshots-big-merge-20241017",
            json!({
                "packages": [
                    {
                        "name": "llvm",
                        "chroots": {
                            "fedora-rawhide-x86_64": {
                                "build_id": 100,
                                "state": "succeeded",
                                "url_build_log": "https://example.org/100/builder-live.log.gz",
                                "url_build": "https://example.org/100/"
                            },
                            "rhel-9-s390x": {
                                "build_id": 101,
                                "state": "running",
                                "url_build_log": "https://example.org/101/builder-live.log"
                            }
                        }
                    },
                    {
                        "name": "python-lit",
                        "chroots": {
                            "fedora-rawhide-x86_64": {
                                "build_id": 102,
                                "state": "pending",
                                "url_build_log": null
                            }
                        }
                    }
                ]
            }),
        );
        copr
    }

    #[tokio::test]
    async fn test_collects_one_state_per_package_and_chroot() {
        let copr = fake();
        let states =
            get_all_build_states(&copr, "@fedora-llvm-team", "llvm-snapshots-big-merge-20241017")
                .await
                .unwrap();

        assert_eq!(states.len(), 3);
        let keys: Vec<(String, String)> = states
            .iter()
            .map(|s| (s.package_name.clone(), s.chroot.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("llvm".to_string(), "fedora-rawhide-x86_64".to_string()),
                ("llvm".to_string(), "rhel-9-s390x".to_string()),
                ("python-lit".to_string(), "fedora-rawhide-x86_64".to_string()),
            ]
        );

        for state in &states {
            assert_eq!(state.copr_ownername, "@fedora-llvm-team");
            assert_eq!(state.copr_projectname, "llvm-snapshots-big-merge-20241017");
        }
    }

    #[tokio::test]
    async fn test_optional_urls_stay_optional() {
        let copr = fake();
        let states =
            get_all_build_states(&copr, "@fedora-llvm-team", "llvm-snapshots-big-merge-20241017")
                .await
                .unwrap();
        let states = states.as_slice();

        assert_eq!(states[0].copr_build_state, CoprBuildStatus::Succeeded);
        assert_eq!(states[0].url_build.as_deref(), Some("https://example.org/100/"));

        assert_eq!(states[1].copr_build_state, CoprBuildStatus::Running);
        assert!(states[1].url_build_log.is_some());
        assert!(states[1].url_build.is_none());

        assert!(states[2].url_build_log.is_none());
        assert!(states[2].url_build.is_none());
    }

    #[tokio::test]
    async fn test_requests_log_and_result_urls() {
        let copr = fake();
        get_all_build_states(&copr, "@fedora-llvm-team", "llvm-snapshots-big-merge-20241017")
            .await
            .unwrap();
        assert_eq!(copr.monitor_calls(), 1);
        assert_eq!(
            copr.last_monitor_fields(),
            vec!["url_build_log".to_string(), "url_build".to_string()]
        );
    }

    #[tokio::test]
    async fn test_errors_propagate_unchanged() {
        let copr = fake();
        copr.fail_next(CoprError::Api {
            status: 503,
            message: "maintenance".to_string(),
        });
        let err =
            get_all_build_states(&copr, "@fedora-llvm-team", "llvm-snapshots-big-merge-20241017")
                .await
                .unwrap_err();
        assert!(matches!(err, CoprError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_unknown_project_is_no_result() {
        let copr = fake();
        let err = get_all_build_states(&copr, "nobody", "nothing")
            .await
            .unwrap_err();
        assert!(err.is_no_result());
    }

    #[tokio::test]
    async fn test_project_exists() {
        let copr = fake();
        assert!(
            project_exists(&copr, "@fedora-llvm-team", "llvm-snapshots-big-merge-20241017")
                .await
                .unwrap()
        );
        assert!(!project_exists(&copr, "nobody", "nothing").await.unwrap());
    }

    #[tokio::test]
    async fn test_project_exists_propagates_other_errors() {
        let copr = fake();
        copr.fail_next(CoprError::Http("connection reset".to_string()));
        let err = project_exists(&copr, "@fedora-llvm-team", "llvm-snapshots-big-merge-20241017")
            .await
            .unwrap_err();
        assert!(matches!(err, CoprError::Http(_)));
    }

    #[tokio::test]
    async fn test_works_through_trait_object() {
        let copr = fake();
        let client: &dyn CoprApi = &copr;
        let states =
            get_all_build_states(client, "@fedora-llvm-team", "llvm-snapshots-big-merge-20241017")
                .await
                .unwrap();
        assert_eq!(states.len(), 3);
    }
}

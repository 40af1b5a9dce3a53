//! Build state model.
//!
//! One [`BuildState`] is the outcome of one build attempt of one package in
//! one chroot of a Copr project. Records are created by the collector from a
//! monitor response and never mutated afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoprError;

/// Build status as reported by Copr.
///
/// The set is closed: anything else coming from the service is rejected
/// with [`CoprError::UnknownStatus`] instead of being mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoprBuildStatus {
    Importing,
    Pending,
    Starting,
    Running,
    Succeeded,
    Forked,
    Skipped,
    Failed,
    Canceled,
    Waiting,
}

impl CoprBuildStatus {
    pub const ALL: [CoprBuildStatus; 10] = [
        CoprBuildStatus::Importing,
        CoprBuildStatus::Pending,
        CoprBuildStatus::Starting,
        CoprBuildStatus::Running,
        CoprBuildStatus::Succeeded,
        CoprBuildStatus::Forked,
        CoprBuildStatus::Skipped,
        CoprBuildStatus::Failed,
        CoprBuildStatus::Canceled,
        CoprBuildStatus::Waiting,
    ];

    /// Wire form used by the Copr API.
    pub fn as_str(&self) -> &'static str {
        match self {
            CoprBuildStatus::Importing => "importing",
            CoprBuildStatus::Pending => "pending",
            CoprBuildStatus::Starting => "starting",
            CoprBuildStatus::Running => "running",
            CoprBuildStatus::Succeeded => "succeeded",
            CoprBuildStatus::Forked => "forked",
            CoprBuildStatus::Skipped => "skipped",
            CoprBuildStatus::Failed => "failed",
            CoprBuildStatus::Canceled => "canceled",
            CoprBuildStatus::Waiting => "waiting",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CoprBuildStatus::Succeeded)
    }

    /// Whether Copr is done with this build.
    ///
    /// A forked build is a copy of a build from another project and never
    /// changes again, so it counts as terminal even though it is not a success.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CoprBuildStatus::Succeeded
                | CoprBuildStatus::Failed
                | CoprBuildStatus::Canceled
                | CoprBuildStatus::Skipped
                | CoprBuildStatus::Forked
        )
    }

    pub fn is_in_progress(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for CoprBuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoprBuildStatus {
    type Err = CoprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoprBuildStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoprError::UnknownStatus {
                status: s.to_string(),
            })
    }
}

/// A `(package, chroot)` pair, the unit of the build matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildKey {
    pub package_name: String,
    pub chroot: String,
}

impl BuildKey {
    pub fn new(package_name: impl Into<String>, chroot: impl Into<String>) -> Self {
        BuildKey {
            package_name: package_name.into(),
            chroot: chroot.into(),
        }
    }
}

impl fmt::Display for BuildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.package_name, self.chroot)
    }
}

/// One build of one package in one chroot of a Copr project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildState {
    /// Copr build ID
    pub build_id: u64,
    /// Source package name
    pub package_name: String,
    /// Chroot the package was built in, e.g. `fedora-rawhide-x86_64`
    pub chroot: String,
    /// Copr project owner (user or `@group`)
    pub copr_ownername: String,
    /// Copr project name
    pub copr_projectname: String,
    /// Current status of the build
    pub copr_build_state: CoprBuildStatus,
    /// Build log URL; absent while the build has not started
    pub url_build_log: Option<String>,
    /// Result directory URL; only present for builds that produced output
    pub url_build: Option<String>,
}

impl BuildState {
    pub fn new(
        package_name: impl Into<String>,
        chroot: impl Into<String>,
        copr_build_state: CoprBuildStatus,
    ) -> Self {
        BuildState {
            build_id: 0,
            package_name: package_name.into(),
            chroot: chroot.into(),
            copr_ownername: String::new(),
            copr_projectname: String::new(),
            copr_build_state,
            url_build_log: None,
            url_build: None,
        }
    }

    pub fn with_build_id(mut self, build_id: u64) -> Self {
        self.build_id = build_id;
        self
    }

    pub fn with_project(mut self, ownername: &str, projectname: &str) -> Self {
        self.copr_ownername = ownername.to_string();
        self.copr_projectname = projectname.to_string();
        self
    }

    pub fn with_build_log(mut self, url: impl Into<String>) -> Self {
        self.url_build_log = Some(url.into());
        self
    }

    pub fn with_build_url(mut self, url: impl Into<String>) -> Self {
        self.url_build = Some(url.into());
        self
    }

    pub fn is_successful(&self) -> bool {
        self.copr_build_state.is_success()
    }

    pub fn key(&self) -> BuildKey {
        BuildKey::new(&self.package_name, &self.chroot)
    }

    /// Link to the build page in the Copr web UI.
    pub fn build_page_url(&self, copr_url: &str) -> String {
        format!(
            "{}/coprs/build/{}",
            copr_url.trim_end_matches('/'),
            self.build_id
        )
    }
}

/// Build states in the order Copr reported them (package, then chroot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildStateList(Vec<BuildState>);

impl BuildStateList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: BuildState) {
        self.0.push(state);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BuildState> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[BuildState] {
        &self.0
    }

    /// Set of pairs that have at least one successful record.
    pub fn successful_pairs(&self) -> BTreeSet<BuildKey> {
        self.0
            .iter()
            .filter(|state| state.is_successful())
            .map(BuildState::key)
            .collect()
    }

    /// Reduce to the newest record per pair, newest meaning highest build ID.
    ///
    /// Copr allocates build IDs monotonically, so the highest ID is the most
    /// recent attempt. Records sharing the highest ID resolve to the
    /// unsuccessful one, so the outcome does not depend on input order. The
    /// result is ordered by pair.
    pub fn latest_per_pair(&self) -> BuildStateList {
        let mut latest: BTreeMap<BuildKey, &BuildState> = BTreeMap::new();
        for state in &self.0 {
            latest
                .entry(state.key())
                .and_modify(|current| {
                    if recency_rank(state) > recency_rank(current) {
                        *current = state;
                    }
                })
                .or_insert(state);
        }
        latest.into_values().cloned().collect()
    }

    /// Number of records per status, for summaries.
    pub fn status_counts(&self) -> BTreeMap<CoprBuildStatus, usize> {
        let mut counts = BTreeMap::new();
        for state in &self.0 {
            *counts.entry(state.copr_build_state).or_insert(0) += 1;
        }
        counts
    }
}

/// Total order used by [`BuildStateList::latest_per_pair`].
fn recency_rank(state: &BuildState) -> (u64, bool, CoprBuildStatus) {
    (state.build_id, !state.is_successful(), state.copr_build_state)
}

impl FromIterator<BuildState> for BuildStateList {
    fn from_iter<I: IntoIterator<Item = BuildState>>(iter: I) -> Self {
        BuildStateList(iter.into_iter().collect())
    }
}

impl From<Vec<BuildState>> for BuildStateList {
    fn from(states: Vec<BuildState>) -> Self {
        BuildStateList(states)
    }
}

impl IntoIterator for BuildStateList {
    type Item = BuildState;
    type IntoIter = std::vec::IntoIter<BuildState>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BuildStateList {
    type Item = &'a BuildState;
    type IntoIter = std::slice::Iter<'a, BuildState>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

//! Build matrix evaluation.
//!
//! A snapshot is green when every `(package, chroot)` combination of the
//! required matrix has a successful build.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::build_status::{BuildKey, BuildStateList};

/// How to treat several records for the same `(package, chroot)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Any successful record makes the pair green, even if a later
    /// rebuild of the same pair failed.
    #[default]
    AnySuccess,
    /// Only the record with the highest build ID counts.
    LatestAttempt,
}

/// Outcome of a matrix evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixVerdict {
    /// True when every expected pair has a successful build.
    pub passed: bool,
    /// Number of pairs in the required matrix.
    pub expected: usize,
    /// Pairs that are absent or not successful, sorted.
    pub missing: BTreeSet<BuildKey>,
}

impl MatrixVerdict {
    /// Missing pairs grouped as `package -> chroots`, handy for reports.
    pub fn missing_by_package(&self) -> Vec<(String, Vec<String>)> {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for key in &self.missing {
            match grouped.last_mut() {
                Some((package, chroots)) if *package == key.package_name => {
                    chroots.push(key.chroot.clone())
                }
                _ => grouped.push((key.package_name.clone(), vec![key.chroot.clone()])),
            }
        }
        grouped
    }
}

/// Cartesian product of the required packages and chroots.
pub fn expected_pairs<P, C>(required_packages: &[P], required_chroots: &[C]) -> BTreeSet<BuildKey>
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    required_packages
        .iter()
        .flat_map(|package| {
            required_chroots
                .iter()
                .map(move |chroot| BuildKey::new(package.as_ref(), chroot.as_ref()))
        })
        .collect()
}

/// Evaluate the required matrix against `states` with a given duplicate policy.
pub fn evaluate_matrix_with<P, C>(
    required_packages: &[P],
    required_chroots: &[C],
    states: &BuildStateList,
    policy: DuplicatePolicy,
) -> MatrixVerdict
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    let expected = expected_pairs(required_packages, required_chroots);
    let actual = match policy {
        DuplicatePolicy::AnySuccess => states.successful_pairs(),
        DuplicatePolicy::LatestAttempt => states.latest_per_pair().successful_pairs(),
    };

    let missing: BTreeSet<BuildKey> = expected.difference(&actual).cloned().collect();
    let passed = missing.is_empty();

    if passed {
        debug!(
            expected = expected.len(),
            ?policy,
            "all required builds succeeded"
        );
    } else {
        let pairs: Vec<String> = missing.iter().map(ToString::to_string).collect();
        error!(
            missing = missing.len(),
            expected = expected.len(),
            "These packages were not found or weren't successful: {}",
            pairs.join(", ")
        );
    }

    MatrixVerdict {
        passed,
        expected: expected.len(),
        missing,
    }
}

/// Evaluate the required matrix with [`DuplicatePolicy::AnySuccess`].
pub fn evaluate_matrix<P, C>(
    required_packages: &[P],
    required_chroots: &[C],
    states: &BuildStateList,
) -> MatrixVerdict
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    evaluate_matrix_with(
        required_packages,
        required_chroots,
        states,
        DuplicatePolicy::default(),
    )
}

/// True if every required `(package, chroot)` combination succeeded.
pub fn has_all_good_builds<P, C>(
    required_packages: &[P],
    required_chroots: &[C],
    states: &BuildStateList,
) -> bool
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    evaluate_matrix(required_packages, required_chroots, states).passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_status::{BuildState, CoprBuildStatus};

    const PACKAGES: [&str; 1] = ["llvm"];
    const CHROOTS: [&str; 2] = ["fedora-rawhide-x86_64", "rhel-9-ppc64le"];

    fn forked_rhel() -> BuildState {
        BuildState::new("llvm", "rhel-9-ppc64le", CoprBuildStatus::Forked).with_build_id(1)
    }

    fn failed_rawhide() -> BuildState {
        BuildState::new("llvm", "fedora-rawhide-x86_64", CoprBuildStatus::Failed)
            .with_build_id(2)
    }

    fn succeeded_rawhide() -> BuildState {
        BuildState::new("llvm", "fedora-rawhide-x86_64", CoprBuildStatus::Succeeded)
            .with_build_id(3)
    }

    #[test]
    fn test_forked_only_is_not_green() {
        let states: BuildStateList = vec![forked_rhel()].into();
        let verdict = evaluate_matrix(&PACKAGES, &CHROOTS, &states);
        assert!(!verdict.passed);
        assert_eq!(verdict.expected, 2);
        assert_eq!(verdict.missing.len(), 2);
    }

    #[test]
    fn test_failed_record_is_not_green() {
        let states: BuildStateList = vec![forked_rhel(), failed_rawhide()].into();
        assert!(!has_all_good_builds(&PACKAGES, &CHROOTS, &states));
    }

    #[test]
    fn test_missing_lists_exact_difference() {
        let states: BuildStateList = vec![forked_rhel(), succeeded_rawhide()].into();
        let verdict = evaluate_matrix(&PACKAGES, &CHROOTS, &states);
        assert!(!verdict.passed);
        assert_eq!(
            verdict.missing.into_iter().collect::<Vec<_>>(),
            vec![BuildKey::new("llvm", "rhel-9-ppc64le")]
        );
    }

    #[test]
    fn test_all_succeeded_is_green() {
        let states: BuildStateList = vec![
            BuildState::new("llvm", "rhel-9-ppc64le", CoprBuildStatus::Succeeded),
            succeeded_rawhide(),
        ]
        .into();
        let verdict = evaluate_matrix(&PACKAGES, &CHROOTS, &states);
        assert!(verdict.passed);
        assert!(verdict.missing.is_empty());
    }

    #[test]
    fn test_empty_required_packages_is_vacuously_green() {
        let none: [&str; 0] = [];
        let states = BuildStateList::new();
        assert!(has_all_good_builds(&none, &CHROOTS, &states));
        assert!(has_all_good_builds(&none, &none, &states));
    }

    #[test]
    fn test_extra_states_do_not_matter() {
        let states: BuildStateList = vec![
            BuildState::new("llvm", "rhel-9-ppc64le", CoprBuildStatus::Succeeded),
            succeeded_rawhide(),
            BuildState::new("clang", "fedora-40-s390x", CoprBuildStatus::Failed),
        ]
        .into();
        assert!(has_all_good_builds(&PACKAGES, &CHROOTS, &states));
    }

    #[test]
    fn test_any_success_counts_despite_later_failure() {
        let later_failure = BuildState::new(
            "llvm",
            "fedora-rawhide-x86_64",
            CoprBuildStatus::Failed,
        )
        .with_build_id(10);
        let states: BuildStateList = vec![
            BuildState::new("llvm", "rhel-9-ppc64le", CoprBuildStatus::Succeeded),
            succeeded_rawhide(),
            later_failure,
        ]
        .into();

        let any = evaluate_matrix_with(&PACKAGES, &CHROOTS, &states, DuplicatePolicy::AnySuccess);
        assert!(any.passed);

        let latest =
            evaluate_matrix_with(&PACKAGES, &CHROOTS, &states, DuplicatePolicy::LatestAttempt);
        assert!(!latest.passed);
        assert!(latest
            .missing
            .contains(&BuildKey::new("llvm", "fedora-rawhide-x86_64")));
    }

    #[test]
    fn test_latest_attempt_accepts_successful_rebuild() {
        let states: BuildStateList = vec![
            BuildState::new("llvm", "rhel-9-ppc64le", CoprBuildStatus::Succeeded),
            failed_rawhide(),
            succeeded_rawhide(),
        ]
        .into();
        assert!(
            evaluate_matrix_with(&PACKAGES, &CHROOTS, &states, DuplicatePolicy::LatestAttempt)
                .passed
        );
    }

    #[test]
    fn test_verdict_independent_of_state_order() {
        let records = vec![
            forked_rhel(),
            failed_rawhide(),
            succeeded_rawhide(),
            BuildState::new("llvm", "rhel-9-ppc64le", CoprBuildStatus::Succeeded).with_build_id(4),
        ];
        let forward: BuildStateList = records.clone().into();
        let backward: BuildStateList = records.into_iter().rev().collect();

        for policy in [DuplicatePolicy::AnySuccess, DuplicatePolicy::LatestAttempt] {
            assert_eq!(
                evaluate_matrix_with(&PACKAGES, &CHROOTS, &forward, policy),
                evaluate_matrix_with(&PACKAGES, &CHROOTS, &backward, policy)
            );
        }
    }

    #[test]
    fn test_latest_attempt_with_tied_build_ids_is_order_independent() {
        let records = vec![
            BuildState::new("llvm", "fedora-rawhide-x86_64", CoprBuildStatus::Succeeded),
            BuildState::new("llvm", "fedora-rawhide-x86_64", CoprBuildStatus::Failed),
        ];
        let forward: BuildStateList = records.clone().into();
        let backward: BuildStateList = records.into_iter().rev().collect();

        let chroots = ["fedora-rawhide-x86_64"];
        let a = evaluate_matrix_with(&["llvm"], &chroots, &forward, DuplicatePolicy::LatestAttempt);
        let b = evaluate_matrix_with(&["llvm"], &chroots, &backward, DuplicatePolicy::LatestAttempt);
        assert_eq!(a, b);
        assert!(!a.passed);
    }

    #[test]
    fn test_missing_by_package_groups_chroots() {
        let verdict = evaluate_matrix(
            &["clang", "llvm"],
            &["a", "b"],
            &vec![BuildState::new("llvm", "a", CoprBuildStatus::Succeeded)].into(),
        );
        assert_eq!(
            verdict.missing_by_package(),
            vec![
                ("clang".to_string(), vec!["a".to_string(), "b".to_string()]),
                ("llvm".to_string(), vec!["b".to_string()]),
            ]
        );
    }
}

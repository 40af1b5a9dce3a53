//! Snapshot Core: Copr build tracking for snapshot releases
//!
//! Collects the build state of every package in every chroot of a Copr
//! project and decides whether a required (package x chroot) matrix is
//! fully green.
//!
//! ## Modules
//!
//! - [`build_status`]: `CoprBuildStatus`, `BuildState`, `BuildStateList`
//! - [`chroot`]: anchored, sorted chroot filtering
//! - [`matrix`]: build matrix evaluation
//! - [`copr`]: Copr API client, collector and chroot cache
//! - [`tags`]: GitHub tag listing for the `get-tags` tool
//! - [`telemetry`]: tracing setup for the binaries

pub mod build_status;
pub mod chroot;
pub mod copr;
pub mod error;
pub mod matrix;
pub mod tags;
pub mod telemetry;

pub use build_status::{BuildKey, BuildState, BuildStateList, CoprBuildStatus};
pub use chroot::{filter_chroots, ChrootFilter, DEFAULT_CHROOT_PATTERN};
pub use copr::{
    get_all_build_states, project_exists, CoprApi, CoprClient, CoprConfig, CoprService,
};
pub use error::{CoprError, Result};
pub use matrix::{
    evaluate_matrix, evaluate_matrix_with, has_all_good_builds, DuplicatePolicy, MatrixVerdict,
};
pub use telemetry::init_tracing;

//! Copr integration
//!
//! - [`api`]: the `CoprApi` trait and the typed monitor schema
//! - [`http`]: `reqwest` implementation of `CoprApi`
//! - [`config`]: credentials from the environment or `~/.config/copr`
//! - [`collector`]: build state collection and project lookup
//! - [`cache`] / [`service`]: memoized chroot list owned by a client wrapper
//! - [`fakes`]: in-memory `CoprApi` for tests

pub mod api;
pub mod cache;
pub mod collector;
pub mod config;
pub mod fakes;
pub mod http;
pub mod service;

pub use api::{CoprApi, MonitorChroot, MonitorPackage, MonitorResponse, ProjectInfo};
pub use cache::ChrootCache;
pub use collector::{get_all_build_states, project_exists};
pub use config::{CoprConfig, DEFAULT_COPR_URL};
pub use http::CoprClient;
pub use service::CoprService;

//! In-memory Copr (testing only)
//!
//! [`MemoryCopr`] answers [`CoprApi`] calls from projects registered with
//! raw monitor JSON, so responses go through the same decoding as the
//! HTTP client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::api::{chroot_names_from_value, CoprApi, MonitorResponse, ProjectInfo};
use crate::error::CoprError;
use crate::Result;

/// In-memory Copr backed by `HashMap<(owner, project), monitor JSON>`.
#[derive(Debug, Default)]
pub struct MemoryCopr {
    projects: Mutex<HashMap<(String, String), Value>>,
    chroots: Mutex<Vec<String>>,
    next_error: Mutex<Option<CoprError>>,
    last_monitor_fields: Mutex<Vec<String>>,
    monitor_calls: AtomicUsize,
    chroot_list_calls: AtomicUsize,
}

impl MemoryCopr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project with the body its monitor endpoint returns.
    pub fn add_project(&self, ownername: &str, projectname: &str, monitor: Value) {
        self.projects
            .lock()
            .unwrap()
            .insert((ownername.to_string(), projectname.to_string()), monitor);
    }

    /// Set the chroots returned by `mock_chroot_list`.
    pub fn set_chroots<I, S>(&self, chroots: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.chroots.lock().unwrap() = chroots.into_iter().map(Into::into).collect();
    }

    /// Make the next call (of any kind) fail with `err`.
    pub fn fail_next(&self, err: CoprError) {
        *self.next_error.lock().unwrap() = Some(err);
    }

    pub fn monitor_calls(&self) -> usize {
        self.monitor_calls.load(Ordering::SeqCst)
    }

    pub fn chroot_list_calls(&self) -> usize {
        self.chroot_list_calls.load(Ordering::SeqCst)
    }

    pub fn last_monitor_fields(&self) -> Vec<String> {
        self.last_monitor_fields.lock().unwrap().clone()
    }

    fn take_error(&self) -> Result<()> {
        match self.next_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn project_body(&self, ownername: &str, projectname: &str) -> Result<Value> {
        self.projects
            .lock()
            .unwrap()
            .get(&(ownername.to_string(), projectname.to_string()))
            .cloned()
            .ok_or_else(|| {
                CoprError::NoResult(format!(
                    "Project {}/{} does not exist.",
                    ownername, projectname
                ))
            })
    }
}

#[async_trait]
impl CoprApi for MemoryCopr {
    async fn get_project(&self, ownername: &str, projectname: &str) -> Result<ProjectInfo> {
        self.take_error()?;
        self.project_body(ownername, projectname)?;
        Ok(ProjectInfo {
            id: 1,
            name: projectname.to_string(),
            ownername: ownername.to_string(),
            full_name: Some(format!("{}/{}", ownername, projectname)),
            description: None,
        })
    }

    async fn mock_chroot_list(&self) -> Result<Vec<String>> {
        self.chroot_list_calls.fetch_add(1, Ordering::SeqCst);
        self.take_error()?;
        let body: serde_json::Map<String, Value> = self
            .chroots
            .lock()
            .unwrap()
            .iter()
            .map(|name| (name.clone(), Value::String(String::new())))
            .collect();
        chroot_names_from_value(Value::Object(body))
    }

    async fn monitor(
        &self,
        ownername: &str,
        projectname: &str,
        additional_fields: &[&str],
    ) -> Result<MonitorResponse> {
        self.monitor_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_monitor_fields.lock().unwrap() =
            additional_fields.iter().map(|f| f.to_string()).collect();
        self.take_error()?;
        MonitorResponse::from_value(self.project_body(ownername, projectname)?)
    }
}

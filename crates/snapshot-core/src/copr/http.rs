//! HTTP implementation of [`CoprApi`] on top of `reqwest`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::api::{chroot_names_from_value, CoprApi, MonitorResponse, ProjectInfo};
use super::config::CoprConfig;
use crate::error::CoprError;
use crate::Result;

/// Copr API v3 client
pub struct CoprClient {
    config: CoprConfig,
    http_client: reqwest::Client,
}

impl CoprClient {
    /// Create a new Copr client
    pub fn new(config: CoprConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("snapshot-core/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(CoprClient {
            config,
            http_client,
        })
    }

    /// Create a client from the environment or `~/.config/copr`
    pub fn from_env() -> Result<Self> {
        Self::new(CoprConfig::load()?)
    }

    pub fn config(&self) -> &CoprConfig {
        &self.config
    }

    /// GET an `api_3` endpoint and decode the JSON body.
    ///
    /// 404 becomes [`CoprError::NoResult`], any other non-success status
    /// [`CoprError::Api`]. Copr puts the reason into an `"error"` field.
    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = self.config.api_url(endpoint);
        debug!(%url, ?query, "copr request");

        let mut request = self.http_client.get(&url).query(query);
        if let Some((login, token)) = self.config.credentials() {
            request = request.basic_auth(login, Some(token));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        let message = error_message(&body);
        if status == StatusCode::NOT_FOUND {
            Err(CoprError::NoResult(message))
        } else {
            Err(CoprError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Pull the `"error"` field out of a Copr error body, or fall back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl CoprApi for CoprClient {
    async fn get_project(&self, ownername: &str, projectname: &str) -> Result<ProjectInfo> {
        let body = self
            .get_json(
                "project",
                &[("ownername", ownername), ("projectname", projectname)],
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn mock_chroot_list(&self) -> Result<Vec<String>> {
        let body = self.get_json("mock-chroots/list", &[]).await?;
        chroot_names_from_value(body)
    }

    async fn monitor(
        &self,
        ownername: &str,
        projectname: &str,
        additional_fields: &[&str],
    ) -> Result<MonitorResponse> {
        let mut query = vec![("ownername", ownername), ("projectname", projectname)];
        query.extend(
            additional_fields
                .iter()
                .map(|field| ("additional_fields[]", *field)),
        );
        let body = self.get_json("monitor", &query).await?;
        MonitorResponse::from_value(body)
    }
}

//! Tag listing for a GitHub repository.
//!
//! Lists `date<sep>tag` rows for every tag whose commit was last modified in
//! or after a cutoff year. GitHub returns tags newest first, so listing stops
//! at the first tag older than the cutoff instead of walking the whole
//! history.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use reqwest::header::{ACCEPT, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Build data before this year is not worth listing.
pub const CUTOFF_YEAR: i32 = 2024;

/// Repository listed when none is given.
pub const DEFAULT_PROJECT: &str = "llvm/llvm-project";

pub const GITHUB_API_URL: &str = "https://api.github.com";

const PER_PAGE: u32 = 100;

/// Errors from the tag lister
#[derive(Error, Debug)]
pub enum TagError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),

    #[error("Invalid project {0:?}, expected <owner>/<repo>")]
    InvalidProject(String),
}

impl From<reqwest::Error> for TagError {
    fn from(err: reqwest::Error) -> Self {
        TagError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for TagError {
    fn from(err: serde_json::Error) -> Self {
        TagError::Decode(err.to_string())
    }
}

/// A tag as listed by `GET /repos/{owner}/{repo}/tags`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub commit: TagCommit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCommit {
    pub sha: String,
}

/// One output row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRow {
    pub date: DateTime<Utc>,
    pub tag: String,
}

impl TagRow {
    pub fn format(&self, sep: &str) -> String {
        format!("{}{}{}", self.date.format("%Y/%m/%d"), sep, self.tag)
    }
}

/// Where tags and commit timestamps come from.
#[async_trait]
pub trait TagSource: Send + Sync {
    /// One page of tags, newest first. Pages start at 1; an empty page means
    /// there are no more tags.
    async fn list_tags(&self, page: u32) -> Result<Vec<Tag>, TagError>;

    /// Last-modified timestamp of a commit.
    async fn commit_last_modified(&self, sha: &str) -> Result<DateTime<Utc>, TagError>;
}

/// Rows for every tag modified in or after `cutoff_year`.
pub async fn collect_tag_rows<S>(source: &S, cutoff_year: i32) -> Result<Vec<TagRow>, TagError>
where
    S: TagSource + ?Sized,
{
    let mut rows = Vec::new();
    let mut page = 1;
    loop {
        let tags = source.list_tags(page).await?;
        if tags.is_empty() {
            return Ok(rows);
        }
        for tag in tags {
            let date = source.commit_last_modified(&tag.commit.sha).await?;
            if date.year() < cutoff_year {
                debug!(tag = %tag.name, %date, "reached cutoff");
                return Ok(rows);
            }
            rows.push(TagRow {
                date,
                tag: tag.name,
            });
        }
        page += 1;
    }
}

pub fn header(sep: &str) -> String {
    format!("date{}tag", sep)
}

/// Output lines, optionally preceded by the header.
pub fn format_rows(rows: &[TagRow], sep: &str, show_header: bool) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    if show_header {
        lines.push(header(sep));
    }
    lines.extend(rows.iter().map(|row| row.format(sep)));
    lines
}

/// GitHub REST client for one repository
pub struct GitHubClient {
    http_client: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GitHubClient {
    /// `project` is `<owner>/<repo>`.
    pub fn new(project: &str, token: Option<String>) -> Result<Self, TagError> {
        let (owner, repo) = project
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
            .ok_or_else(|| TagError::InvalidProject(project.to_string()))?;

        // GitHub rejects requests without a User-Agent.
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("get-tags/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GitHubClient {
            http_client,
            api_url: GITHUB_API_URL.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Point the client at a different API root (GitHub Enterprise).
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn project(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, self.owner, self.repo, path
        )
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, TagError> {
        debug!(%url, "github request");
        let mut request = self
            .http_client
            .get(url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        Err(TagError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Timestamp from a `Last-Modified` header value.
fn parse_last_modified(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Committer date from a commit body, used when there is no `Last-Modified`.
fn committer_date(body: &Value) -> Option<DateTime<Utc>> {
    body.pointer("/commit/committer/date")
        .and_then(Value::as_str)
        .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
        .map(|date| date.with_timezone(&Utc))
}

#[async_trait]
impl TagSource for GitHubClient {
    async fn list_tags(&self, page: u32) -> Result<Vec<Tag>, TagError> {
        let response = self
            .get(
                &self.repo_url("tags"),
                &[
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn commit_last_modified(&self, sha: &str) -> Result<DateTime<Utc>, TagError> {
        let response = self
            .get(&self.repo_url(&format!("commits/{}", sha)), &[])
            .await?;

        let header_date = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_last_modified);
        if let Some(date) = header_date {
            return Ok(date);
        }

        let body: Value = serde_json::from_str(&response.text().await?)?;
        committer_date(&body)
            .ok_or_else(|| TagError::Decode(format!("commit {} has no usable date", sha)))
    }
}

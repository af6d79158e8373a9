//! Redmine REST client.
//!
//! Implements the storage core's [`IssueTracker`] port against the Redmine
//! JSON API. Used by the legacy importer to re-hydrate issue and project
//! mirrors from live data.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use worklog_storage::models::{RedMineIssue, RedMineProject};
use worklog_storage::tracker::IssueTracker;

/// Redmine marks a project as closed with status 5.
const PROJECT_STATUS_CLOSED: i64 = 5;

/// Blocking client for one Redmine instance.
pub struct RedmineClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct IssueEnvelope {
    issue: IssueBody,
}

#[derive(Debug, Deserialize)]
struct IssueBody {
    id: i64,
    subject: String,
    description: Option<String>,
    project: NamedRef,
    assigned_to: Option<NamedRef>,
    status: StatusRef,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct StatusRef {
    is_closed: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ProjectEnvelope {
    project: ProjectBody,
}

#[derive(Debug, Deserialize)]
struct ProjectBody {
    id: i64,
    name: String,
    description: Option<String>,
    status: Option<i64>,
}

impl RedmineClient {
    /// Create a client for the given Redmine base URL and API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}/{path}", self.base_url);
        log::debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .header("X-Redmine-API-Key", self.api_key.as_str())
            .send()
            .with_context(|| format!("request to {url} failed"))?;
        ensure_success(response, "Redmine")
    }
}

impl IssueTracker for RedmineClient {
    fn fetch_issue(&self, issue_id: i64) -> Result<RedMineIssue> {
        let body: IssueEnvelope = self
            .get(&format!("issues/{issue_id}.json"))?
            .json()
            .context("Failed to decode issue response")?;
        Ok(body.issue.into())
    }

    fn fetch_project(&self, project_id: i64) -> Result<RedMineProject> {
        let body: ProjectEnvelope = self
            .get(&format!("projects/{project_id}.json"))?
            .json()
            .context("Failed to decode project response")?;
        Ok(body.project.into())
    }
}

impl From<IssueBody> for RedMineIssue {
    fn from(body: IssueBody) -> Self {
        Self {
            id: body.id,
            project_id: body.project.id,
            subject: body.subject,
            assigned_to: body.assigned_to.map(|a| a.name).unwrap_or_default(),
            description: body.description.unwrap_or_default(),
            closed: body.status.is_closed.unwrap_or(false),
        }
    }
}

impl From<ProjectBody> for RedMineProject {
    fn from(body: ProjectBody) -> Self {
        Self {
            id: body.id,
            name: body.name,
            description: body.description.unwrap_or_default(),
            closed: body.status == Some(PROJECT_STATUS_CLOSED),
        }
    }
}

/// Ensure the response status is successful, returning an error with
/// details if not.
fn ensure_success(response: Response, api_name: &str) -> Result<Response> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().unwrap_or_default();
        anyhow::bail!("{api_name} API error ({status}): {error_text}");
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_response_maps_to_mirror() {
        let payload = r#"{
            "issue": {
                "id": 4711,
                "subject": "crash on save",
                "description": "reported by qa",
                "project": {"id": 300, "name": "platform"},
                "assigned_to": {"id": 12, "name": "li"},
                "status": {"id": 5, "name": "Closed", "is_closed": true}
            }
        }"#;
        let envelope: IssueEnvelope = serde_json::from_str(payload).unwrap();
        let issue = RedMineIssue::from(envelope.issue);
        assert_eq!(issue.id, 4711);
        assert_eq!(issue.project_id, 300);
        assert_eq!(issue.assigned_to, "li");
        assert!(issue.closed);
    }

    #[test]
    fn test_issue_response_tolerates_missing_optionals() {
        let payload = r#"{
            "issue": {
                "id": 1,
                "subject": "untriaged",
                "project": {"id": 2, "name": "inbox"},
                "status": {"id": 1, "name": "New"}
            }
        }"#;
        let envelope: IssueEnvelope = serde_json::from_str(payload).unwrap();
        let issue = RedMineIssue::from(envelope.issue);
        assert!(issue.assigned_to.is_empty());
        assert!(issue.description.is_empty());
        assert!(!issue.closed);
    }

    #[test]
    fn test_project_closed_flag_from_status() {
        let payload = r#"{
            "project": {
                "id": 300,
                "name": "platform",
                "description": "main platform",
                "status": 5
            }
        }"#;
        let envelope: ProjectEnvelope = serde_json::from_str(payload).unwrap();
        let project = RedMineProject::from(envelope.project);
        assert!(project.closed);
    }
}

//! Live adapter for the `TrackerGateway` port using the Jira Cloud REST API.

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::TrackerSettings;
use crate::correlate::{LinkRelation, RemoteLink, TrackerState, WorkLog};
use crate::issue::{IssueDraft, VersionDraft};
use crate::keys::{self, WorkItemId};
use crate::ports::git::GitHistory;
use crate::ports::tracker::{GatewayError, GatewayFuture, TrackerGateway};

/// Live gateway that talks to a Jira-compatible tracker over HTTP.
///
/// Commit history lookups go through the injected [`GitHistory`], so the
/// deployment path works even when the tracker itself is not configured.
pub struct JiraGateway {
    client: Client,
    settings: Option<TrackerSettings>,
    git: Box<dyn GitHistory>,
}

impl JiraGateway {
    /// Creates a gateway. With `settings` of `None` every tracker mutation
    /// fails with [`GatewayError::Unavailable`].
    #[must_use]
    pub fn new(settings: Option<TrackerSettings>, git: Box<dyn GitHistory>) -> Self {
        Self { client: Client::new(), settings, git }
    }

    fn settings(&self) -> Result<&TrackerSettings, GatewayError> {
        self.settings.as_ref().ok_or_else(|| {
            GatewayError::Unavailable(
                "set TRACKER_BASE_URL, TRACKER_EMAIL and TRACKER_API_TOKEN".to_owned(),
            )
        })
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<RequestBuilder, GatewayError> {
        let settings = self.settings()?;
        Ok(self
            .client
            .request(method, format!("{}{path}", settings.base_url))
            .basic_auth(&settings.email, Some(&settings.api_token))
            .header("Accept", "application/json"))
    }
}

/// Wraps plain text in a single-paragraph Atlassian document.
fn document(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": text }] }
        ]
    })
}

/// Tracker link type names for each relation.
const fn link_type_name(relation: LinkRelation) -> &'static str {
    match relation {
        LinkRelation::Blocks => "Blocks",
        LinkRelation::RelatesTo => "Relates",
        LinkRelation::Duplicates => "Duplicate",
        LinkRelation::DependsOn => "Depends",
    }
}

/// Body of a remote issue link.
fn remote_link_body(link: &RemoteLink) -> Value {
    json!({
        "relationship": link.relationship,
        "object": { "url": link.url, "title": link.title },
    })
}

/// Body of a version creation request in `project_key`.
fn version_body(draft: &VersionDraft, project_key: &str) -> Value {
    let mut body = json!({
        "name": draft.name,
        "project": project_key,
        "released": false,
    });
    if let Some(date) = draft.release_date {
        body["releaseDate"] = json!(date.format("%Y-%m-%d").to_string());
    }
    if let Some(description) = &draft.description {
        body["description"] = json!(description);
    }
    body
}

/// One entry of the transitions listing.
#[derive(Deserialize)]
struct Transition {
    id: String,
    name: String,
    to: TransitionTarget,
}

/// Status a transition leads to.
#[derive(Deserialize)]
struct TransitionTarget {
    name: String,
}

/// Response of the transitions listing.
#[derive(Deserialize)]
struct TransitionList {
    transitions: Vec<Transition>,
}

/// Request body for performing a transition.
#[derive(Serialize)]
struct TransitionRequest<'a> {
    transition: TransitionId<'a>,
}

/// Identifies the transition to perform.
#[derive(Serialize)]
struct TransitionId<'a> {
    id: &'a str,
}

/// Response of issue creation.
#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

/// Response of version creation.
#[derive(Deserialize)]
struct CreatedVersion {
    id: String,
}

/// Sends a request and fails on transport errors or non-success statuses.
async fn send(request: RequestBuilder) -> Result<Response, GatewayError> {
    let response =
        request.send().await.map_err(|e| GatewayError::Transport(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_else(|e| e.to_string());
    Err(GatewayError::Rejected { status: status.as_u16(), message })
}

impl TrackerGateway for JiraGateway {
    fn append_comment(&self, id: &WorkItemId, text: &str) -> GatewayFuture<'_, ()> {
        let path = format!("/rest/api/3/issue/{id}/comment");
        let body = json!({ "body": document(text) });

        Box::pin(async move {
            let request = self.request(reqwest::Method::POST, &path)?.json(&body);
            send(request).await?;
            Ok::<(), GatewayError>(())
        })
    }

    fn transition_status(&self, id: &WorkItemId, target: TrackerState) -> GatewayFuture<'_, ()> {
        let id = id.clone();
        let path = format!("/rest/api/3/issue/{id}/transitions");

        Box::pin(async move {
            let listing = send(self.request(reqwest::Method::GET, &path)?).await?;
            let available: TransitionList =
                listing.json().await.map_err(|e| GatewayError::Transport(e.to_string()))?;

            let wanted = target.tracker_name();
            let Some(transition) = available.transitions.iter().find(|t| {
                t.name.eq_ignore_ascii_case(wanted) || t.to.name.eq_ignore_ascii_case(wanted)
            }) else {
                return Err(GatewayError::InvalidTransition { id, target: wanted.to_owned() });
            };

            let body = TransitionRequest { transition: TransitionId { id: &transition.id } };
            send(self.request(reqwest::Method::POST, &path)?.json(&body)).await?;
            tracing::debug!(work_item = %id, transition = %transition.name, "transition applied");
            Ok::<(), GatewayError>(())
        })
    }

    fn link_issues(
        &self,
        from: &WorkItemId,
        to: &WorkItemId,
        relation: LinkRelation,
    ) -> GatewayFuture<'_, ()> {
        let body = json!({
            "type": { "name": link_type_name(relation) },
            "inwardIssue": { "key": from.as_str() },
            "outwardIssue": { "key": to.as_str() },
        });

        Box::pin(async move {
            send(self.request(reqwest::Method::POST, "/rest/api/3/issueLink")?.json(&body))
                .await?;
            Ok::<(), GatewayError>(())
        })
    }

    fn resolve_recent_commit_ids(
        &self,
        commit_hash: &str,
        lookback: usize,
    ) -> GatewayFuture<'_, Vec<WorkItemId>> {
        let commit_hash = commit_hash.to_owned();

        Box::pin(async move {
            let subjects = self
                .git
                .recent_subjects(&commit_hash, lookback)
                .map_err(|e| GatewayError::Unavailable(format!("cannot read git history: {e}")))?;
            Ok::<_, GatewayError>(keys::dedup_preserving_order(
                subjects.iter().flat_map(|s| keys::find_all(s)),
            ))
        })
    }

    fn create_issue(&self, draft: &IssueDraft) -> GatewayFuture<'_, WorkItemId> {
        let draft = draft.clone();

        Box::pin(async move {
            let project_key = self.settings()?.project_key.clone();
            let mut fields = json!({
                "project": { "key": project_key },
                "issuetype": { "name": draft.issue_type },
                "summary": draft.summary,
                "description": document(&draft.description),
                "labels": draft.labels,
            });
            if let Some(priority) = &draft.priority {
                fields["priority"] = json!({ "name": priority });
            }

            let response = send(
                self.request(reqwest::Method::POST, "/rest/api/3/issue")?
                    .json(&json!({ "fields": fields })),
            )
            .await?;
            let created: CreatedIssue =
                response.json().await.map_err(|e| GatewayError::Transport(e.to_string()))?;
            created.key.parse::<WorkItemId>().map_err(|e| {
                GatewayError::Transport(format!("tracker returned an unusable key: {e}"))
            })
        })
    }

    fn assign_issue(&self, id: &WorkItemId, account_id: &str) -> GatewayFuture<'_, ()> {
        let path = format!("/rest/api/3/issue/{id}/assignee");
        let body = json!({ "accountId": account_id });

        Box::pin(async move {
            send(self.request(reqwest::Method::PUT, &path)?.json(&body)).await?;
            Ok::<(), GatewayError>(())
        })
    }

    fn log_work(&self, id: &WorkItemId, entry: &WorkLog) -> GatewayFuture<'_, ()> {
        let path = format!("/rest/api/3/issue/{id}/worklog");
        let body = json!({ "timeSpent": entry.time_spent, "comment": document(&entry.comment) });

        Box::pin(async move {
            send(self.request(reqwest::Method::POST, &path)?.json(&body)).await?;
            Ok::<(), GatewayError>(())
        })
    }

    fn add_remote_link(&self, id: &WorkItemId, link: &RemoteLink) -> GatewayFuture<'_, ()> {
        let path = format!("/rest/api/3/issue/{id}/remotelink");
        let body = remote_link_body(link);

        Box::pin(async move {
            send(self.request(reqwest::Method::POST, &path)?.json(&body)).await?;
            Ok::<(), GatewayError>(())
        })
    }

    fn create_version(&self, draft: &VersionDraft) -> GatewayFuture<'_, String> {
        let draft = draft.clone();

        Box::pin(async move {
            let body = version_body(&draft, &self.settings()?.project_key);
            let response =
                send(self.request(reqwest::Method::POST, "/rest/api/3/version")?.json(&body))
                    .await?;
            let created: CreatedVersion =
                response.json().await.map_err(|e| GatewayError::Transport(e.to_string()))?;
            Ok::<_, GatewayError>(created.id)
        })
    }

    fn set_fix_version(&self, id: &WorkItemId, version: &str) -> GatewayFuture<'_, ()> {
        let path = format!("/rest/api/3/issue/{id}");
        let body = json!({ "fields": { "fixVersions": [{ "name": version }] } });

        Box::pin(async move {
            send(self.request(reqwest::Method::PUT, &path)?.json(&body)).await?;
            Ok::<(), GatewayError>(())
        })
    }
}

//! Tracker gateway port: the mutations the correlator's actions need.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::correlate::{LinkRelation, RemoteLink, TrackerState, WorkLog};
use crate::issue::{IssueDraft, VersionDraft};
use crate::keys::WorkItemId;

/// Boxed future type alias used by [`TrackerGateway`] to keep the trait dyn-compatible.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Why a single gateway call failed.
///
/// Every failure is scoped to the one call that produced it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway cannot act at all, e.g. it is not configured.
    #[error("tracker unavailable: {0}")]
    Unavailable(String),

    /// The tracker offers no transition into the requested status.
    #[error("no transition to '{target}' available for {id}")]
    InvalidTransition {
        /// The work item.
        id: WorkItemId,
        /// The requested status name.
        target: String,
    },

    /// The tracker answered with a non-success status.
    #[error("tracker rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or error text.
        message: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("tracker request failed: {0}")]
    Transport(String),

    /// A failure reproduced from a cassette.
    #[error("{0}")]
    Replayed(String),
}

/// Performs state mutations against the external issue tracker.
///
/// Each call is independent: the caller makes at most one call per planned
/// action and does not retry. Retry, backoff and timeout policy, if any,
/// belong to the implementation.
pub trait TrackerGateway: Send + Sync {
    /// Adds a comment to a work item.
    ///
    /// # Errors
    ///
    /// Returns an error if the comment cannot be added.
    fn append_comment(&self, id: &WorkItemId, text: &str) -> GatewayFuture<'_, ()>;

    /// Moves a work item to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidTransition`] when the tracker has no
    /// such transition, or another error if the request fails.
    fn transition_status(&self, id: &WorkItemId, target: TrackerState) -> GatewayFuture<'_, ()>;

    /// Links `from` to `to` with the given relation.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn link_issues(
        &self,
        from: &WorkItemId,
        to: &WorkItemId,
        relation: LinkRelation,
    ) -> GatewayFuture<'_, ()>;

    /// Resolves the work items referenced by the `lookback` most recent
    /// commits up to `commit_hash`, deduplicated, in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns an error if commit history cannot be read.
    fn resolve_recent_commit_ids(
        &self,
        commit_hash: &str,
        lookback: usize,
    ) -> GatewayFuture<'_, Vec<WorkItemId>>;

    /// Creates a new work item and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be created.
    fn create_issue(&self, draft: &IssueDraft) -> GatewayFuture<'_, WorkItemId>;

    /// Assigns a work item to the tracker account `account_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the assignee cannot be set.
    fn assign_issue(&self, id: &WorkItemId, account_id: &str) -> GatewayFuture<'_, ()>;

    /// Adds a time-tracking entry to a work item.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be added.
    fn log_work(&self, id: &WorkItemId, entry: &WorkLog) -> GatewayFuture<'_, ()>;

    /// Attaches a link to an external resource to a work item.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be added.
    fn add_remote_link(&self, id: &WorkItemId, link: &RemoteLink) -> GatewayFuture<'_, ()>;

    /// Creates an unreleased version in the tracker project and returns the
    /// id the tracker assigned to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be created.
    fn create_version(&self, draft: &VersionDraft) -> GatewayFuture<'_, String>;

    /// Sets the fix version of a work item to the version named `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the work item cannot be updated.
    fn set_fix_version(&self, id: &WorkItemId, version: &str) -> GatewayFuture<'_, ()>;
}

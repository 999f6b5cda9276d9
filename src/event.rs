//! Repository events: discrete occurrences in the source-control and CI
//! lifecycle that may reference work items.

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::issue::Severity;
use crate::keys::WorkItemId;
use crate::message::AgentMessage;

/// A single repository event, with the fields specific to its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepositoryEvent {
    /// A commit was pushed.
    CommitPushed(CommitPushed),
    /// A pull request was opened.
    PullRequestOpened(PullRequestOpened),
    /// A pull request was merged.
    PullRequestMerged(PullRequestMerged),
    /// A pull request review was submitted.
    PullRequestReviewed(PullRequestReviewed),
    /// A branch was created.
    BranchCreated(BranchCreated),
    /// A deployment finished.
    DeploymentCompleted(DeploymentCompleted),
    /// An agent picked up a work item.
    AgentTaskStarted(AgentTaskStarted),
    /// An agent finished a work item.
    AgentTaskCompleted(AgentTaskCompleted),
    /// A bug was filed as a new work item.
    BugFiled(BugFiled),
    /// A security vulnerability was filed as a new work item.
    VulnerabilityFiled(VulnerabilityFiled),
    /// A release version was created in the tracker.
    ReleaseCreated(ReleaseCreated),
    /// An agent sent a message to other agents.
    AgentMessageSent(AgentMessage),
}

impl RepositoryEvent {
    /// Returns a stable snake-case name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CommitPushed(_) => "commit_pushed",
            Self::PullRequestOpened(_) => "pull_request_opened",
            Self::PullRequestMerged(_) => "pull_request_merged",
            Self::PullRequestReviewed(_) => "pull_request_reviewed",
            Self::BranchCreated(_) => "branch_created",
            Self::DeploymentCompleted(_) => "deployment_completed",
            Self::AgentTaskStarted(_) => "agent_task_started",
            Self::AgentTaskCompleted(_) => "agent_task_completed",
            Self::BugFiled(_) => "bug_filed",
            Self::VulnerabilityFiled(_) => "vulnerability_filed",
            Self::ReleaseCreated(_) => "release_created",
            Self::AgentMessageSent(_) => "agent_message_sent",
        }
    }
}

/// Commit metadata from a post-commit hook or push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPushed {
    /// Full commit hash.
    pub hash: String,
    /// Full commit message.
    pub message: String,
    /// Commit author.
    pub author: String,
    /// Branch the commit landed on.
    pub branch: String,
}

/// A newly opened pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestOpened {
    /// Pull request number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Body text; may be empty.
    pub description: String,
    /// Web URL.
    pub url: String,
    /// Who opened it.
    pub author: String,
    /// Target branch.
    pub base_branch: String,
    /// Source branch.
    pub head_branch: String,
}

/// A merged pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestMerged {
    /// Pull request number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Web URL.
    pub url: String,
    /// Who merged it.
    pub merged_by: String,
    /// Branch it was merged into.
    pub base_branch: String,
}

/// Outcome of a submitted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ReviewVerdict {
    /// The reviewer approved, optionally with a comment.
    Approved {
        /// Optional review comment.
        comment: Option<String>,
    },
    /// The reviewer asked for changes and said why.
    ChangesRequested {
        /// Review comment.
        comment: String,
    },
}

/// A submitted pull request review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestReviewed {
    /// Pull request number.
    pub number: u64,
    /// Pull request title.
    pub title: String,
    /// Reviewer login.
    pub reviewer: String,
    /// Approval or change request.
    pub verdict: ReviewVerdict,
}

/// A newly created branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCreated {
    /// Branch name, e.g. `feature/PROJ-123-login`.
    pub branch: String,
    /// Who created it.
    pub author: String,
}

/// Deployment target environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DeployEnvironment {
    /// Development.
    Dev,
    /// Staging.
    Staging,
    /// Production.
    Production,
}

impl DeployEnvironment {
    /// Returns the lowercase environment name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for DeployEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished deployment.
///
/// `work_items` is not derived from the event itself: the caller resolves
/// it from recent commit history through the tracker gateway and injects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentCompleted {
    /// Target environment.
    pub environment: DeployEnvironment,
    /// Released version.
    pub version: String,
    /// Deployment URL, if any.
    pub url: Option<String>,
    /// Commit that was deployed.
    pub commit_hash: String,
    /// Who or what deployed it.
    pub deployed_by: Option<String>,
    /// When the deployment finished.
    pub deployed_at: DateTime<Utc>,
    /// Work items referenced by the deployed commit history.
    pub work_items: Vec<WorkItemId>,
}

/// An agent started work on a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTaskStarted {
    /// The agent role.
    pub agent: AgentKind,
    /// The work item.
    pub work_item: WorkItemId,
    /// When work started.
    pub started_at: DateTime<Utc>,
}

/// A produced artifact linked from a completion comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact type, e.g. `pr` or `design`.
    pub kind: String,
    /// Where to find it.
    pub url: String,
}

/// An agent finished work on a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTaskCompleted {
    /// The agent role.
    pub agent: AgentKind,
    /// The work item.
    pub work_item: WorkItemId,
    /// What was done.
    pub summary: String,
    /// Produced artifacts.
    pub artifacts: Vec<Artifact>,
    /// When work finished.
    pub completed_at: DateTime<Utc>,
}

/// A bug was created in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugFiled {
    /// Id the tracker assigned to the new bug.
    pub bug: WorkItemId,
    /// Work item the bug was found in.
    pub found_in: Option<WorkItemId>,
    /// Bug title.
    pub title: String,
    /// Bug severity.
    pub severity: Severity,
}

/// A vulnerability was created in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityFiled {
    /// Id the tracker assigned to the new issue.
    pub issue: WorkItemId,
    /// Vulnerability title.
    pub title: String,
    /// Vulnerability severity.
    pub severity: Severity,
    /// CVE identifier, if assigned.
    pub cve: Option<String>,
}

/// A release version exists and the work items it ships are known.
///
/// Like deployments, `work_items` is resolved from commit history by the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCreated {
    /// Version name.
    pub version: String,
    /// Work items shipped in this version.
    pub work_items: Vec<WorkItemId>,
}

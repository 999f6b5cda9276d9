//! Event correlation: turns a [`RepositoryEvent`] into the ordered tracker
//! updates it requires.
//!
//! The correlator is a pure function of its configuration and the event.
//! It performs no I/O, never fails, and never reads current tracker state;
//! transitions are requested unconditionally and the tracker is left to
//! reject or ignore invalid ones.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::event::{
    AgentTaskCompleted, AgentTaskStarted, BranchCreated, BugFiled, CommitPushed,
    DeployEnvironment, DeploymentCompleted, PullRequestMerged, PullRequestOpened,
    PullRequestReviewed, ReleaseCreated, RepositoryEvent, ReviewVerdict, VulnerabilityFiled,
};
use crate::keys::{self, WorkItemId};
use crate::message::AgentMessage;

/// Number of hash characters shown in comments.
const SHORT_HASH_LEN: usize = 7;

/// Time logged when an agent picks up a work item.
const START_WORKLOG_TIME: &str = "0h";

/// Relationship name of pull request remote links.
const PULL_REQUEST_RELATIONSHIP: &str = "Pull Request";

/// Status a work item can be moved into.
///
/// Lifecycle: `InProgress → CodeReview → Testing → Done`, with `Blocked`
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    /// Work has started.
    InProgress,
    /// Waiting on review.
    CodeReview,
    /// Merged to trunk, under test.
    Testing,
    /// Released.
    Done,
    /// Cannot proceed.
    Blocked,
}

impl TrackerState {
    /// Returns the status name as the tracker spells it.
    #[must_use]
    pub const fn tracker_name(self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::CodeReview => "Code Review",
            Self::Testing => "Testing",
            Self::Done => "Done",
            Self::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for TrackerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tracker_name())
    }
}

/// Relation between two linked work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRelation {
    /// The first item blocks the second.
    Blocks,
    /// The items are related.
    RelatesTo,
    /// The first item duplicates the second.
    Duplicates,
    /// The first item depends on the second.
    DependsOn,
}

impl LinkRelation {
    /// Returns the relation phrase, e.g. `relates to`.
    #[must_use]
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::RelatesTo => "relates to",
            Self::Duplicates => "duplicates",
            Self::DependsOn => "depends on",
        }
    }
}

impl fmt::Display for LinkRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

/// A time-tracking entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLog {
    /// Duration in tracker notation, e.g. `0h` or `1h 30m`.
    pub time_spent: String,
    /// Note attached to the entry.
    pub comment: String,
}

/// A link from a work item to an external resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLink {
    /// Target URL.
    pub url: String,
    /// Link text.
    pub title: String,
    /// How the resource relates, e.g. `Pull Request`.
    pub relationship: String,
}

/// A single required mutation against one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CorrelatedAction {
    /// Add a comment.
    AppendComment {
        /// Comment body.
        text: String,
    },
    /// Move the work item to a new status.
    TransitionStatus {
        /// Target status.
        target: TrackerState,
    },
    /// Link the work item to another one.
    LinkIssue {
        /// The other end of the link.
        other: WorkItemId,
        /// How the two relate.
        relation: LinkRelation,
    },
    /// Assign the work item to a tracker account.
    AssignTo {
        /// Tracker account id.
        account_id: String,
    },
    /// Add a time-tracking entry.
    LogWork(WorkLog),
    /// Attach a link to an external resource.
    AddRemoteLink(RemoteLink),
    /// Mark the work item as shipped in a release version.
    SetFixVersion {
        /// Version name.
        version: String,
    },
}

impl CorrelatedAction {
    /// Returns a short label for reports and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AppendComment { .. } => "comment",
            Self::TransitionStatus { .. } => "transition",
            Self::LinkIssue { .. } => "link",
            Self::AssignTo { .. } => "assign",
            Self::LogWork(_) => "worklog",
            Self::AddRemoteLink(_) => "remote_link",
            Self::SetFixVersion { .. } => "fix_version",
        }
    }
}

impl fmt::Display for CorrelatedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppendComment { text } => {
                let first_line = text.lines().next().unwrap_or_default();
                write!(f, "comment: {first_line}")
            }
            Self::TransitionStatus { target } => write!(f, "transition -> {target}"),
            Self::LinkIssue { other, relation } => write!(f, "link: {relation} {other}"),
            Self::AssignTo { account_id } => write!(f, "assign -> {account_id}"),
            Self::LogWork(entry) => write!(f, "worklog: {} ({})", entry.time_spent, entry.comment),
            Self::AddRemoteLink(link) => write!(f, "remote link: {} <{}>", link.title, link.url),
            Self::SetFixVersion { version } => write!(f, "fix version: {version}"),
        }
    }
}

/// An action bound to the work item it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    /// The targeted work item.
    pub work_item: WorkItemId,
    /// What to do to it.
    pub action: CorrelatedAction,
}

impl PlannedAction {
    fn comment(work_item: &WorkItemId, text: String) -> Self {
        Self { work_item: work_item.clone(), action: CorrelatedAction::AppendComment { text } }
    }

    fn transition(work_item: &WorkItemId, target: TrackerState) -> Self {
        Self {
            work_item: work_item.clone(),
            action: CorrelatedAction::TransitionStatus { target },
        }
    }

    fn new(work_item: &WorkItemId, action: CorrelatedAction) -> Self {
        Self { work_item: work_item.clone(), action }
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.work_item, self.action)
    }
}

/// Policy knobs for the correlator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatorConfig {
    /// Branches whose merges move work items to `Testing`.
    pub trunk_branches: Vec<String>,
    /// Web URL of the repository, used for commit links.
    pub repository_url: Option<String>,
    /// Tracker account each agent role is assigned through. Roles without
    /// an entry are never assigned.
    pub agent_accounts: BTreeMap<AgentKind, String>,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            trunk_branches: vec!["main".to_owned(), "master".to_owned()],
            repository_url: None,
            agent_accounts: BTreeMap::new(),
        }
    }
}

/// Maps repository events to planned tracker actions.
#[derive(Debug, Clone, Default)]
pub struct Correlator {
    config: CorrelatorConfig,
}

impl Correlator {
    /// Creates a correlator with the given policy.
    #[must_use]
    pub const fn new(config: CorrelatorConfig) -> Self {
        Self { config }
    }

    /// Returns true when `branch` is a designated trunk branch.
    #[must_use]
    pub fn is_trunk(&self, branch: &str) -> bool {
        self.config.trunk_branches.iter().any(|trunk| trunk == branch)
    }

    /// Produces the ordered actions an event requires.
    ///
    /// Actions for the same work item are emitted in the order they must be
    /// applied. An event that references no work item yields an empty list.
    #[must_use]
    pub fn correlate(&self, event: &RepositoryEvent) -> Vec<PlannedAction> {
        match event {
            RepositoryEvent::CommitPushed(commit) => self.commit_pushed(commit),
            RepositoryEvent::PullRequestOpened(pr) => Self::pull_request_opened(pr),
            RepositoryEvent::PullRequestMerged(pr) => self.pull_request_merged(pr),
            RepositoryEvent::PullRequestReviewed(review) => Self::pull_request_reviewed(review),
            RepositoryEvent::BranchCreated(branch) => Self::branch_created(branch),
            RepositoryEvent::DeploymentCompleted(deploy) => Self::deployment_completed(deploy),
            RepositoryEvent::AgentTaskStarted(task) => self.agent_task_started(task),
            RepositoryEvent::AgentTaskCompleted(task) => Self::agent_task_completed(task),
            RepositoryEvent::BugFiled(bug) => Self::bug_filed(bug),
            RepositoryEvent::VulnerabilityFiled(vuln) => Self::vulnerability_filed(vuln),
            RepositoryEvent::ReleaseCreated(release) => Self::release_created(release),
            RepositoryEvent::AgentMessageSent(message) => Self::agent_message_sent(message),
        }
    }

    fn commit_pushed(&self, commit: &CommitPushed) -> Vec<PlannedAction> {
        let short = short_hash(&commit.hash);
        let mut text = format!(
            "## New commit\n\n**Branch:** `{}`\n**Commit:** `{short}`\n**Author:** {}\n**Message:** {}",
            commit.branch, commit.author, commit.message
        );
        if let Some(repo) = &self.config.repository_url {
            let _ = write!(text, "\n\n[View commit]({}/commit/{})", repo.trim_end_matches('/'), commit.hash);
        }

        keys::find_all(&commit.message)
            .iter()
            .map(|id| PlannedAction::comment(id, text.clone()))
            .collect()
    }

    fn pull_request_opened(pr: &PullRequestOpened) -> Vec<PlannedAction> {
        let candidates =
            keys::find_first(&pr.title).into_iter().chain(keys::find_all(&pr.description));
        let text = format!(
            "Pull request opened.\n\n[PR #{}: {}]({})\n\nReady for code review.",
            pr.number, pr.title, pr.url
        );
        let link = RemoteLink {
            url: pr.url.clone(),
            title: format!("PR #{}: {}", pr.number, pr.title),
            relationship: PULL_REQUEST_RELATIONSHIP.to_owned(),
        };

        keys::dedup_preserving_order(candidates)
            .iter()
            .flat_map(|id| {
                [
                    PlannedAction::new(id, CorrelatedAction::AddRemoteLink(link.clone())),
                    PlannedAction::comment(id, text.clone()),
                    PlannedAction::transition(id, TrackerState::CodeReview),
                ]
            })
            .collect()
    }

    fn pull_request_merged(&self, pr: &PullRequestMerged) -> Vec<PlannedAction> {
        let Some(id) = keys::find_first(&pr.title) else {
            return Vec::new();
        };
        let text = format!(
            "Pull request merged into `{}` by {}.\n\n[PR #{}]({})\n\nReady for deployment.",
            pr.base_branch, pr.merged_by, pr.number, pr.url
        );

        let mut actions = vec![PlannedAction::comment(&id, text)];
        if self.is_trunk(&pr.base_branch) {
            actions.push(PlannedAction::transition(&id, TrackerState::Testing));
        }
        actions
    }

    fn pull_request_reviewed(review: &PullRequestReviewed) -> Vec<PlannedAction> {
        let Some(id) = keys::find_first(&review.title) else {
            return Vec::new();
        };
        let text = match &review.verdict {
            ReviewVerdict::Approved { comment } => {
                let mut text = format!(
                    "## PR approved\n\n**PR:** #{}\n**Reviewer:** {}",
                    review.number, review.reviewer
                );
                if let Some(comment) = comment {
                    let _ = write!(text, "\n**Comment:** {comment}");
                }
                text.push_str("\n\nCode review approved. Ready to merge.");
                text
            }
            ReviewVerdict::ChangesRequested { comment } => format!(
                "## PR changes requested\n\n**PR:** #{}\n**Reviewer:** {}\n**Comment:** {comment}\n\nPlease address the review feedback.",
                review.number, review.reviewer
            ),
        };
        vec![PlannedAction::comment(&id, text)]
    }

    fn branch_created(branch: &BranchCreated) -> Vec<PlannedAction> {
        let Some(id) = keys::find_from_branch_name(&branch.branch) else {
            return Vec::new();
        };
        let text = format!(
            "## Branch created\n\n**Branch:** `{}`\n**Created by:** {}\n\nDevelopment has started.",
            branch.branch, branch.author
        );
        vec![PlannedAction::comment(&id, text), PlannedAction::transition(&id, TrackerState::InProgress)]
    }

    fn deployment_completed(deploy: &DeploymentCompleted) -> Vec<PlannedAction> {
        let mut text = format!(
            "## Deployment completed\n\n**Environment:** {}\n**Version:** {}\n**Deployed at:** {}",
            deploy.environment,
            deploy.version,
            deploy.deployed_at.to_rfc3339()
        );
        if let Some(url) = &deploy.url {
            let _ = write!(text, "\n**URL:** {url}");
        }
        if let Some(who) = &deploy.deployed_by {
            let _ = write!(text, "\n**Deployed by:** {who}");
        }
        let release = deploy.environment == DeployEnvironment::Production;

        deploy
            .work_items
            .iter()
            .flat_map(|id| {
                let mut actions = vec![PlannedAction::comment(id, text.clone())];
                if release {
                    actions.push(PlannedAction::transition(id, TrackerState::Done));
                }
                actions
            })
            .collect()
    }

    fn agent_task_started(&self, task: &AgentTaskStarted) -> Vec<PlannedAction> {
        let text = format!(
            "## {}\n\n**Work started**\n\n**Started at:** {}\n**Status:** {}\n**Issue:** {}\n**Owner:** `{}`",
            task.agent.header(),
            task.started_at.to_rfc3339(),
            TrackerState::InProgress,
            task.work_item,
            task.agent.tracker_label()
        );
        let mut actions = vec![PlannedAction::transition(&task.work_item, TrackerState::InProgress)];
        if let Some(account_id) = self.config.agent_accounts.get(&task.agent) {
            actions.push(PlannedAction::new(
                &task.work_item,
                CorrelatedAction::AssignTo { account_id: account_id.clone() },
            ));
        }
        actions.push(PlannedAction::comment(&task.work_item, text));
        actions.push(PlannedAction::new(
            &task.work_item,
            CorrelatedAction::LogWork(WorkLog {
                time_spent: START_WORKLOG_TIME.to_owned(),
                comment: format!("{} Agent started work", task.agent.metadata().name),
            }),
        ));
        actions
    }

    fn agent_task_completed(task: &AgentTaskCompleted) -> Vec<PlannedAction> {
        let mut text = format!(
            "## {}\n\n**Work completed**\n\n**Completed at:** {}\n\n### Summary\n{}",
            task.agent.header(),
            task.completed_at.to_rfc3339(),
            task.summary
        );
        if !task.artifacts.is_empty() {
            text.push_str("\n\n### Artifacts\n");
            for artifact in &task.artifacts {
                let _ = writeln!(text, "- [{}]({})", artifact.kind, artifact.url);
            }
        }
        vec![
            PlannedAction::comment(&task.work_item, text),
            PlannedAction::transition(&task.work_item, TrackerState::Done),
        ]
    }

    fn bug_filed(bug: &BugFiled) -> Vec<PlannedAction> {
        let Some(origin) = &bug.found_in else {
            return Vec::new();
        };
        let text = format!(
            "## Bug filed\n\n**Bug:** {}\n**Severity:** {}\n**Title:** {}",
            bug.bug, bug.severity, bug.title
        );
        vec![
            PlannedAction {
                work_item: bug.bug.clone(),
                action: CorrelatedAction::LinkIssue {
                    other: origin.clone(),
                    relation: LinkRelation::RelatesTo,
                },
            },
            PlannedAction::comment(origin, text),
        ]
    }

    fn vulnerability_filed(vuln: &VulnerabilityFiled) -> Vec<PlannedAction> {
        if !vuln.severity.is_urgent() {
            return Vec::new();
        }
        let mut text = format!(
            "## ⚠️ Urgent: {} severity vulnerability\n\n**Title:** {}",
            vuln.severity, vuln.title
        );
        if let Some(cve) = &vuln.cve {
            let _ = write!(text, "\n**CVE:** {cve}");
        }
        text.push_str("\n\nImmediate action required.");
        vec![PlannedAction::comment(&vuln.issue, text)]
    }

    fn release_created(release: &ReleaseCreated) -> Vec<PlannedAction> {
        release
            .work_items
            .iter()
            .map(|id| {
                PlannedAction::new(
                    id,
                    CorrelatedAction::SetFixVersion { version: release.version.clone() },
                )
            })
            .collect()
    }

    fn agent_message_sent(message: &AgentMessage) -> Vec<PlannedAction> {
        let Some(id) = &message.work_item else {
            return Vec::new();
        };
        vec![PlannedAction::comment(id, message.log_entry())]
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}

//! Messages exchanged between agents, mirrored onto the work item they
//! concern as a communication log.

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::keys::WorkItemId;

/// What an agent message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// A task is handed to the recipient.
    TaskAssignment,
    /// Progress on a task.
    TaskStatus,
    /// A task was finished.
    TaskCompletion,
    /// A task cannot proceed.
    TaskBlocked,
    /// Asks the recipient for a review.
    ReviewRequest,
    /// A review was finished.
    ReviewCompleted,
    /// Findings from a review.
    ReviewFeedback,
    /// General information.
    Information,
    /// Something happened.
    Notification,
    /// Something needs attention now.
    Alert,
    /// Asks the recipient a question.
    Question,
    /// Asks the recipient to work together.
    CollaborationRequest,
    /// A resource the recipient waits on is ready.
    ResourceReady,
    /// A dependency changed.
    DependencyUpdate,
    /// Something failed.
    Error,
}

impl MessageType {
    /// Returns the snake-case name used in message logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskAssignment => "task_assignment",
            Self::TaskStatus => "task_status",
            Self::TaskCompletion => "task_completion",
            Self::TaskBlocked => "task_blocked",
            Self::ReviewRequest => "review_request",
            Self::ReviewCompleted => "review_completed",
            Self::ReviewFeedback => "review_feedback",
            Self::Information => "information",
            Self::Notification => "notification",
            Self::Alert => "alert",
            Self::Question => "question",
            Self::CollaborationRequest => "collaboration_request",
            Self::ResourceReady => "resource_ready",
            Self::DependencyUpdate => "dependency_update",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How quickly the recipient should act on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MessagePriority {
    /// Drop everything.
    Critical,
    /// Soon.
    High,
    /// Default.
    Medium,
    /// Whenever.
    Low,
}

impl fmt::Display for MessagePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}

/// One message from an agent to one or more others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Message id.
    pub id: String,
    /// When it was sent.
    pub sent_at: DateTime<Utc>,
    /// Sender.
    pub from: AgentKind,
    /// Recipients, at least one.
    pub to: Vec<AgentKind>,
    /// What it is about.
    pub message_type: MessageType,
    /// How urgent it is.
    pub priority: MessagePriority,
    /// Free-form JSON body.
    pub payload: serde_json::Value,
    /// Work item the conversation belongs to, if any.
    pub work_item: Option<WorkItemId>,
}

impl AgentMessage {
    /// Renders the communication-log comment posted on the work item.
    #[must_use]
    pub fn log_entry(&self) -> String {
        let recipients: Vec<&str> = self.to.iter().map(|agent| agent.as_str()).collect();
        let payload = serde_json::to_string_pretty(&self.payload)
            .unwrap_or_else(|_| self.payload.to_string());
        format!(
            "## 📨 Agent Communication\n\n**From:** {}\n**To:** {}\n**Type:** {}\n**Priority:** {}\n**Timestamp:** {}\n\n### Message\n{payload}\n\n---\n*Message ID: {}*",
            self.from,
            recipients.join(", "),
            self.message_type,
            self.priority,
            self.sent_at.to_rfc3339(),
            self.id
        )
    }
}

//! Automated agent roles whose task lifecycle is mirrored onto work items.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Agent roles known to the tracker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Project coordination.
    Coordinator,
    /// Frontend development.
    Frontend,
    /// Backend development.
    Backend,
    /// UI/UX design.
    Design,
    /// Quality assurance.
    Qa,
    /// Security analysis.
    Security,
    /// `DevOps` and infrastructure.
    Devops,
    /// Deployment.
    Deploy,
    /// Documentation.
    Documentation,
}

/// Display metadata for an agent role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentMetadata {
    /// Human-readable name.
    pub name: &'static str,
    /// Emoji used in comment headers.
    pub emoji: &'static str,
    /// Role description.
    pub role: &'static str,
}

impl AgentKind {
    /// Every agent role, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Coordinator,
        Self::Frontend,
        Self::Backend,
        Self::Design,
        Self::Qa,
        Self::Security,
        Self::Devops,
        Self::Deploy,
        Self::Documentation,
    ];

    /// Returns the lowercase role slug.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator",
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Design => "design",
            Self::Qa => "qa",
            Self::Security => "security",
            Self::Devops => "devops",
            Self::Deploy => "deploy",
            Self::Documentation => "documentation",
        }
    }

    /// Returns the display metadata for this role.
    #[must_use]
    pub const fn metadata(self) -> AgentMetadata {
        let (name, emoji, role) = match self {
            Self::Coordinator => ("Coordinator", "🎯", "Project Coordination"),
            Self::Frontend => ("Frontend", "🎨", "Frontend Development"),
            Self::Backend => ("Backend", "⚙️", "Backend Development"),
            Self::Design => ("Design", "🎭", "UI/UX Design"),
            Self::Qa => ("QA", "🔍", "Quality Assurance"),
            Self::Security => ("Security", "🔒", "Security Analysis"),
            Self::Devops => ("DevOps", "🚀", "DevOps & Infrastructure"),
            Self::Deploy => ("Deploy", "📦", "Deployment"),
            Self::Documentation => ("Documentation", "📚", "Documentation"),
        };
        AgentMetadata { name, emoji, role }
    }

    /// Returns the tracker label applied to work items owned by this role.
    #[must_use]
    pub fn tracker_label(self) -> String {
        format!("agent:{}", self.as_str())
    }

    /// Returns the comment header, e.g. `🎨 **Frontend Agent** (Frontend Development)`.
    #[must_use]
    pub fn header(self) -> String {
        let meta = self.metadata();
        format!("{} **{} Agent** ({})", meta.emoji, meta.name, meta.role)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn labels_follow_agent_prefix() {
        for agent in AgentKind::ALL {
            assert_eq!(agent.tracker_label(), format!("agent:{agent}"));
        }
    }

    #[test]
    fn emojis_and_labels_are_unique() {
        let emojis: HashSet<_> = AgentKind::ALL.iter().map(|a| a.metadata().emoji).collect();
        let labels: HashSet<_> = AgentKind::ALL.iter().map(|a| a.tracker_label()).collect();
        assert_eq!(emojis.len(), AgentKind::ALL.len());
        assert_eq!(labels.len(), AgentKind::ALL.len());
    }

    #[test]
    fn header_contains_name_and_role() {
        let header = AgentKind::Frontend.header();
        assert!(header.contains("🎨"));
        assert!(header.contains("Frontend Agent"));
        assert!(header.contains("Frontend Development"));
    }
}

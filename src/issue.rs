//! New-issue and release drafts, used when filing bugs and vulnerabilities
//! or cutting releases from the command line.

use std::fmt::{self, Write};

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::keys::WorkItemId;

/// Bug severity, mapped one-to-one onto tracker priority names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Needs immediate attention.
    Critical,
    /// Important.
    High,
    /// Default.
    Medium,
    /// Cosmetic or minor.
    Low,
}

impl Severity {
    /// Returns the tracker priority name.
    #[must_use]
    pub const fn priority_name(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Returns true for severities that warrant an urgent notice.
    #[must_use]
    pub const fn is_urgent(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.priority_name())
    }
}

/// Fields needed to create an issue in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    /// Issue type name, e.g. `Bug`.
    pub issue_type: String,
    /// One-line summary.
    pub summary: String,
    /// Plain-text description.
    pub description: String,
    /// Priority name, if any.
    pub priority: Option<String>,
    /// Labels to apply.
    pub labels: Vec<String>,
}

/// A bug found while working on (or testing) a work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugReport {
    /// One-line title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// How bad it is.
    pub severity: Severity,
    /// Work item the bug was found in, if known.
    pub found_in: Option<WorkItemId>,
    /// Where it was observed.
    pub environment: String,
    /// Reproduction steps, in order.
    pub steps_to_reproduce: Vec<String>,
    /// What should have happened.
    pub expected_result: String,
    /// What actually happened.
    pub actual_result: String,
}

impl BugReport {
    /// Builds the tracker draft: type `Bug`, labels `bug` and `auto-created`,
    /// and a sectioned description.
    #[must_use]
    pub fn to_draft(&self) -> IssueDraft {
        let mut description = format!("{}\n\n", self.description);
        let _ = write!(description, "## Environment\n{}\n\n", self.environment);
        description.push_str("## Steps to Reproduce\n");
        for (index, step) in self.steps_to_reproduce.iter().enumerate() {
            let _ = writeln!(description, "{}. {step}", index + 1);
        }
        let _ = write!(description, "\n## Expected Result\n{}\n\n", self.expected_result);
        let _ = write!(description, "## Actual Result\n{}\n", self.actual_result);

        IssueDraft {
            issue_type: "Bug".to_owned(),
            summary: self.title.clone(),
            description,
            priority: Some(self.severity.priority_name().to_owned()),
            labels: vec!["bug".to_owned(), "auto-created".to_owned()],
        }
    }
}

/// A security vulnerability to file as a tracker issue.
#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityReport {
    /// One-line title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// How bad it is; also the issue priority.
    pub severity: Severity,
    /// CVE identifier, if assigned.
    pub cve: Option<String>,
    /// CVSS base score, if scored.
    pub cvss: Option<f32>,
    /// Component the vulnerability lives in.
    pub affected_component: String,
    /// How to fix or mitigate it.
    pub remediation: String,
    /// Advisory and reference links.
    pub references: Vec<String>,
}

impl VulnerabilityReport {
    /// Builds the tracker draft: type `Vulnerability`, labels `security`,
    /// `vulnerability` and `auto-created`.
    #[must_use]
    pub fn to_draft(&self) -> IssueDraft {
        let mut description = format!("{}\n\n## Vulnerability Details\n", self.description);
        if let Some(cve) = &self.cve {
            let _ = writeln!(description, "**CVE:** {cve}");
        }
        if let Some(cvss) = self.cvss {
            let _ = writeln!(description, "**CVSS Score:** {cvss}");
        }
        let _ = write!(description, "**Affected Component:** {}\n\n", self.affected_component);
        let _ = write!(description, "## Remediation\n{}\n", self.remediation);
        if !self.references.is_empty() {
            description.push_str("\n## References\n");
            for reference in &self.references {
                let _ = writeln!(description, "- {reference}");
            }
        }

        IssueDraft {
            issue_type: "Vulnerability".to_owned(),
            summary: self.title.clone(),
            description,
            priority: Some(self.severity.priority_name().to_owned()),
            labels: vec![
                "security".to_owned(),
                "vulnerability".to_owned(),
                "auto-created".to_owned(),
            ],
        }
    }
}

/// Fields needed to create an unreleased version in the tracker project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDraft {
    /// Version name, e.g. `1.4.0`.
    pub name: String,
    /// Planned release date.
    pub release_date: Option<NaiveDate>,
    /// Release notes or summary.
    pub description: Option<String>,
}

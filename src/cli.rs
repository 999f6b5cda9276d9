//! CLI argument definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::agent::AgentKind;
use crate::event::{Artifact, DeployEnvironment};
use crate::issue::Severity;
use crate::keys::WorkItemId;
use crate::message::{MessagePriority, MessageType};

/// Top-level CLI parser for `tracklink`.
#[derive(Debug, Parser)]
#[command(
    name = "tracklink",
    version,
    about = "Mirror repository events onto issue tracker work items"
)]
pub struct Cli {
    /// Print the planned tracker actions without performing them.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// A commit was pushed.
    Commit(CommitArgs),
    /// A pull request was opened.
    PrOpened(PrOpenedArgs),
    /// A pull request was merged.
    PrMerged(PrMergedArgs),
    /// A pull request review was submitted.
    PrReviewed(PrReviewedArgs),
    /// A branch was created.
    BranchCreated(BranchCreatedArgs),
    /// A deployment finished.
    Deployment(DeploymentArgs),
    /// An agent started work on a work item.
    AgentStart(AgentStartArgs),
    /// An agent finished work on a work item.
    AgentComplete(AgentCompleteArgs),
    /// File a bug and link it to the work item it was found in.
    Bug(BugArgs),
    /// File a security vulnerability.
    Vulnerability(VulnerabilityArgs),
    /// Create a release version and tag the work items it ships.
    Release(ReleaseArgs),
    /// Log a message between agents on the work item it concerns.
    AgentMessage(AgentMessageArgs),
    /// Print the work item ids referenced in a piece of text.
    Extract {
        /// Text to scan.
        text: String,
    },
}

/// Arguments for `commit`.
#[derive(Debug, Args)]
pub struct CommitArgs {
    /// Full commit hash.
    #[arg(long)]
    pub hash: String,
    /// Full commit message.
    #[arg(long)]
    pub message: String,
    /// Commit author.
    #[arg(long)]
    pub author: String,
    /// Branch the commit landed on.
    #[arg(long)]
    pub branch: String,
}

/// Arguments for `pr-opened`.
#[derive(Debug, Args)]
pub struct PrOpenedArgs {
    /// Pull request number.
    #[arg(long)]
    pub number: u64,
    /// Pull request title.
    #[arg(long)]
    pub title: String,
    /// Pull request body.
    #[arg(long, default_value = "")]
    pub description: String,
    /// Pull request web URL.
    #[arg(long)]
    pub url: String,
    /// Who opened it.
    #[arg(long)]
    pub author: String,
    /// Target branch.
    #[arg(long)]
    pub base: String,
    /// Source branch.
    #[arg(long)]
    pub head: String,
}

/// Arguments for `pr-merged`.
#[derive(Debug, Args)]
pub struct PrMergedArgs {
    /// Pull request number.
    #[arg(long)]
    pub number: u64,
    /// Pull request title.
    #[arg(long)]
    pub title: String,
    /// Pull request web URL.
    #[arg(long)]
    pub url: String,
    /// Who merged it.
    #[arg(long)]
    pub merged_by: String,
    /// Branch it was merged into.
    #[arg(long)]
    pub base: String,
}

/// Review outcome as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewState {
    /// The reviewer approved.
    Approved,
    /// The reviewer asked for changes.
    #[value(alias = "changes_requested")]
    ChangesRequested,
}

/// Arguments for `pr-reviewed`.
#[derive(Debug, Args)]
pub struct PrReviewedArgs {
    /// Pull request number.
    #[arg(long)]
    pub number: u64,
    /// Pull request title.
    #[arg(long)]
    pub title: String,
    /// Reviewer login.
    #[arg(long)]
    pub reviewer: String,
    /// Review outcome.
    #[arg(long, value_enum)]
    pub state: ReviewState,
    /// Review comment; required when changes are requested.
    #[arg(
        long,
        required_if_eq_any([("state", "changes-requested"), ("state", "changes_requested")])
    )]
    pub comment: Option<String>,
}

/// Arguments for `branch-created`.
#[derive(Debug, Args)]
pub struct BranchCreatedArgs {
    /// Branch name.
    #[arg(long)]
    pub branch: String,
    /// Who created it.
    #[arg(long)]
    pub author: String,
}

/// Arguments for `deployment`.
#[derive(Debug, Args)]
pub struct DeploymentArgs {
    /// Target environment.
    #[arg(long, value_enum)]
    pub environment: DeployEnvironment,
    /// Released version.
    #[arg(long)]
    pub version: String,
    /// Commit that was deployed.
    #[arg(long)]
    pub commit_hash: String,
    /// Deployment URL.
    #[arg(long)]
    pub url: Option<String>,
    /// Who or what deployed it.
    #[arg(long)]
    pub deployed_by: Option<String>,
    /// Number of commits to scan for work items; overrides the configured value.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub lookback: Option<u64>,
}

/// Arguments for `agent-start`.
#[derive(Debug, Args)]
pub struct AgentStartArgs {
    /// Agent role.
    #[arg(long, value_enum)]
    pub agent: AgentKind,
    /// Work item the agent picked up.
    #[arg(long)]
    pub issue: WorkItemId,
}

/// Arguments for `agent-complete`.
#[derive(Debug, Args)]
pub struct AgentCompleteArgs {
    /// Agent role.
    #[arg(long, value_enum)]
    pub agent: AgentKind,
    /// Work item the agent finished.
    #[arg(long)]
    pub issue: WorkItemId,
    /// What was done.
    #[arg(long)]
    pub summary: String,
    /// Produced artifact as `type=url`; repeatable.
    #[arg(long = "artifact", value_parser = parse_artifact)]
    pub artifacts: Vec<Artifact>,
}

/// Arguments for `bug`.
#[derive(Debug, Args)]
pub struct BugArgs {
    /// One-line title.
    #[arg(long)]
    pub title: String,
    /// Free-form description.
    #[arg(long)]
    pub description: String,
    /// How bad it is.
    #[arg(long, value_enum)]
    pub severity: Severity,
    /// Work item the bug was found in.
    #[arg(long)]
    pub found_in: Option<WorkItemId>,
    /// Where it was observed.
    #[arg(long, default_value = "Not specified")]
    pub environment: String,
    /// Reproduction step; repeatable, in order.
    #[arg(long = "step")]
    pub steps: Vec<String>,
    /// What should have happened.
    #[arg(long, default_value = "Not specified")]
    pub expected: String,
    /// What actually happened.
    #[arg(long, default_value = "Not specified")]
    pub actual: String,
}

/// Arguments for `vulnerability`.
#[derive(Debug, Args)]
pub struct VulnerabilityArgs {
    /// One-line title.
    #[arg(long)]
    pub title: String,
    /// Free-form description.
    #[arg(long)]
    pub description: String,
    /// How bad it is; also the issue priority.
    #[arg(long, value_enum)]
    pub severity: Severity,
    /// CVE identifier.
    #[arg(long)]
    pub cve: Option<String>,
    /// CVSS base score, 0.0 to 10.0.
    #[arg(long, value_parser = parse_cvss)]
    pub cvss: Option<f32>,
    /// Component the vulnerability lives in.
    #[arg(long)]
    pub component: String,
    /// How to fix or mitigate it.
    #[arg(long)]
    pub remediation: String,
    /// Advisory or reference link; repeatable.
    #[arg(long = "reference")]
    pub references: Vec<String>,
}

/// Arguments for `release`.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Version name.
    #[arg(long)]
    pub version: String,
    /// Commit the release was cut from.
    #[arg(long)]
    pub commit_hash: String,
    /// Planned release date, `YYYY-MM-DD`.
    #[arg(long)]
    pub release_date: Option<chrono::NaiveDate>,
    /// Release notes.
    #[arg(long)]
    pub description: Option<String>,
    /// Number of commits to scan for work items; overrides the configured value.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub lookback: Option<u64>,
}

/// Arguments for `agent-message`.
#[derive(Debug, Args)]
pub struct AgentMessageArgs {
    /// Sending agent.
    #[arg(long, value_enum)]
    pub from: AgentKind,
    /// Receiving agent; repeatable.
    #[arg(long, value_enum, required = true)]
    pub to: Vec<AgentKind>,
    /// Message type.
    #[arg(long = "type", value_enum)]
    pub message_type: MessageType,
    /// Message priority.
    #[arg(long, value_enum, default_value = "medium")]
    pub priority: MessagePriority,
    /// Message body as JSON.
    #[arg(long, value_parser = parse_payload)]
    pub payload: serde_json::Value,
    /// Work item the message concerns; without it nothing is logged.
    #[arg(long)]
    pub issue: Option<WorkItemId>,
    /// Message id; generated when omitted.
    #[arg(long)]
    pub id: Option<String>,
}

fn parse_cvss(raw: &str) -> Result<f32, String> {
    match raw.parse::<f32>() {
        Ok(score) if (0.0..=10.0).contains(&score) => Ok(score),
        _ => Err(format!("expected a score between 0.0 and 10.0, got '{raw}'")),
    }
}

fn parse_payload(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("payload is not valid JSON: {e}"))
}

fn parse_artifact(raw: &str) -> Result<Artifact, String> {
    match raw.split_once('=') {
        Some((kind, url)) if !kind.trim().is_empty() && !url.trim().is_empty() => {
            Ok(Artifact { kind: kind.trim().to_owned(), url: url.trim().to_owned() })
        }
        _ => Err(format!("expected type=url, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commit_with_global_dry_run_after_subcommand() {
        let cli = Cli::parse_from([
            "tracklink",
            "commit",
            "--hash",
            "abc1234def",
            "--message",
            "PROJ-1 fix",
            "--author",
            "dev",
            "--branch",
            "main",
            "--dry-run",
        ]);
        assert!(cli.dry_run);
        let Command::Commit(args) = cli.command else { panic!("expected commit") };
        assert_eq!(args.message, "PROJ-1 fix");
    }

    #[test]
    fn changes_requested_requires_comment() {
        let base = [
            "tracklink",
            "pr-reviewed",
            "--number",
            "7",
            "--title",
            "PROJ-1 x",
            "--reviewer",
            "r",
            "--state",
            "changes-requested",
        ];
        assert!(Cli::try_parse_from(base).is_err());

        let with_comment = base.iter().copied().chain(["--comment", "rename it"]);
        let cli = Cli::try_parse_from(with_comment).unwrap();
        let Command::PrReviewed(args) = cli.command else { panic!("expected pr-reviewed") };
        assert_eq!(args.state, ReviewState::ChangesRequested);
        assert_eq!(args.comment.as_deref(), Some("rename it"));
    }

    #[test]
    fn changes_requested_accepts_snake_case_spelling() {
        let base = [
            "tracklink",
            "pr-reviewed",
            "--number",
            "7",
            "--title",
            "PROJ-1 x",
            "--reviewer",
            "r",
            "--state",
            "changes_requested",
        ];
        assert!(Cli::try_parse_from(base).is_err());

        let cli = Cli::try_parse_from(base.iter().copied().chain(["--comment", "split it"])).unwrap();
        let Command::PrReviewed(args) = cli.command else { panic!("expected pr-reviewed") };
        assert_eq!(args.state, ReviewState::ChangesRequested);
    }

    #[test]
    fn parses_vulnerability_with_references() {
        let cli = Cli::try_parse_from([
            "tracklink",
            "vulnerability",
            "--title",
            "XSS in profile",
            "--description",
            "Unescaped bio",
            "--severity",
            "high",
            "--cvss",
            "7.5",
            "--component",
            "web",
            "--remediation",
            "Escape output",
            "--reference",
            "https://a",
            "--reference",
            "https://b",
        ])
        .unwrap();
        let Command::Vulnerability(args) = cli.command else { panic!("expected vulnerability") };
        assert_eq!(args.severity, Severity::High);
        assert_eq!(args.cvss.map(|score| score.to_string()).as_deref(), Some("7.5"));
        assert!(args.cve.is_none());
        assert_eq!(args.references, vec!["https://a", "https://b"]);
    }

    #[test]
    fn cvss_outside_range_is_rejected() {
        assert!(parse_cvss("10.1").is_err());
        assert!(parse_cvss("-1").is_err());
        assert!(parse_cvss("high").is_err());
        assert!(parse_cvss("0").is_ok());
        assert!(parse_cvss("10").is_ok());
    }

    #[test]
    fn parses_release_date() {
        let cli = Cli::try_parse_from([
            "tracklink",
            "release",
            "--version",
            "1.4.0",
            "--commit-hash",
            "abc",
            "--release-date",
            "2025-03-01",
        ])
        .unwrap();
        let Command::Release(args) = cli.command else { panic!("expected release") };
        assert_eq!(args.release_date, chrono::NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(args.lookback.is_none());
    }

    #[test]
    fn agent_message_needs_a_recipient_and_json_payload() {
        let base = ["tracklink", "agent-message", "--from", "qa", "--type", "task-blocked"];
        let with = |extra: &[&'static str]| {
            Cli::try_parse_from(base.iter().copied().chain(extra.iter().copied()))
        };

        assert!(with(&["--payload", "{}"]).is_err());
        assert!(with(&["--to", "backend", "--payload", "not json"]).is_err());

        let cli = with(&["--to", "backend", "--to", "devops", "--payload", r#"{"why":"ci"}"#])
            .unwrap();
        let Command::AgentMessage(args) = cli.command else { panic!("expected agent-message") };
        assert_eq!(args.to, vec![AgentKind::Backend, AgentKind::Devops]);
        assert_eq!(args.message_type, MessageType::TaskBlocked);
        assert_eq!(args.priority, MessagePriority::Medium);
        assert_eq!(args.payload["why"], "ci");
        assert!(args.issue.is_none());
    }

    #[test]
    fn agent_complete_collects_artifacts() {
        let cli = Cli::parse_from([
            "tracklink",
            "agent-complete",
            "--agent",
            "frontend",
            "--issue",
            "PROJ-9",
            "--summary",
            "done",
            "--artifact",
            "pr=https://example.com/pr/1",
            "--artifact",
            "design=https://example.com/d",
        ]);
        let Command::AgentComplete(args) = cli.command else { panic!("expected agent-complete") };
        assert_eq!(args.agent, AgentKind::Frontend);
        assert_eq!(args.issue.as_str(), "PROJ-9");
        assert_eq!(args.artifacts.len(), 2);
        assert_eq!(args.artifacts[1].kind, "design");
    }

    #[test]
    fn issue_arguments_must_be_exact_ids() {
        let result = Cli::try_parse_from([
            "tracklink",
            "agent-start",
            "--agent",
            "qa",
            "--issue",
            "see PROJ-9",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_artifact_is_rejected() {
        assert!(parse_artifact("no-separator").is_err());
        assert!(parse_artifact("=https://x").is_err());
        assert_eq!(
            parse_artifact("pr = https://x").unwrap(),
            Artifact { kind: "pr".into(), url: "https://x".into() }
        );
    }

    #[test]
    fn deployment_lookback_must_be_positive() {
        let args = [
            "tracklink",
            "deployment",
            "--environment",
            "production",
            "--version",
            "1.2.0",
            "--commit-hash",
            "abc",
            "--lookback",
            "0",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn parses_extract() {
        let cli = Cli::parse_from(["tracklink", "extract", "PROJ-1 and PROJ-2"]);
        assert!(matches!(cli.command, Command::Extract { .. }));
    }
}

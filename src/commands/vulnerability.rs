//! `tracklink vulnerability` command.

use crate::cli::VulnerabilityArgs;
use crate::context::ServiceContext;
use crate::correlate::Correlator;
use crate::event::{RepositoryEvent, VulnerabilityFiled};
use crate::issue::VulnerabilityReport;

/// Build the vulnerability report described by the arguments.
#[must_use]
pub fn report(args: &VulnerabilityArgs) -> VulnerabilityReport {
    VulnerabilityReport {
        title: args.title.clone(),
        description: args.description.clone(),
        severity: args.severity,
        cve: args.cve.clone(),
        cvss: args.cvss,
        affected_component: args.component.clone(),
        remediation: args.remediation.clone(),
        references: args.references.clone(),
    }
}

/// Create the vulnerability in the tracker, then post an urgent notice on
/// it when the severity calls for one.
///
/// # Errors
///
/// Returns an error string if the issue cannot be created or the notice
/// cannot be posted.
pub async fn run(
    ctx: &ServiceContext,
    correlator: &Correlator,
    args: &VulnerabilityArgs,
    dry_run: bool,
) -> Result<(), String> {
    let report = report(args);
    let draft = report.to_draft();

    if dry_run {
        println!(
            "Dry run: would create {} issue: {} (priority {})",
            draft.issue_type, draft.summary, report.severity
        );
        if report.severity.is_urgent() {
            println!("  then post an urgent notice on it");
        }
        return Ok(());
    }

    let issue = ctx
        .tracker
        .create_issue(&draft)
        .await
        .map_err(|e| format!("Failed to create vulnerability: {e}"))?;
    tracing::warn!(issue = %issue, severity = %report.severity, "vulnerability filed");
    println!("Created {issue}");

    if !report.severity.is_urgent() {
        return Ok(());
    }

    let event = RepositoryEvent::VulnerabilityFiled(VulnerabilityFiled {
        issue,
        title: report.title,
        severity: report.severity,
        cve: report.cve,
    });
    super::correlate_and_dispatch(ctx, correlator, &event, false).await
}

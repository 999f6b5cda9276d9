//! `tracklink bug` command.

use crate::cli::BugArgs;
use crate::context::ServiceContext;
use crate::correlate::Correlator;
use crate::event::{BugFiled, RepositoryEvent};
use crate::issue::BugReport;

/// Build the bug report described by the arguments.
#[must_use]
pub fn report(args: &BugArgs) -> BugReport {
    BugReport {
        title: args.title.clone(),
        description: args.description.clone(),
        severity: args.severity,
        found_in: args.found_in.clone(),
        environment: args.environment.clone(),
        steps_to_reproduce: args.steps.clone(),
        expected_result: args.expected.clone(),
        actual_result: args.actual.clone(),
    }
}

/// Create the bug in the tracker, then link it to the work item it was
/// found in and leave a notice there.
///
/// # Errors
///
/// Returns an error string if the issue cannot be created or a follow-up
/// action fails.
pub async fn run(
    ctx: &ServiceContext,
    correlator: &Correlator,
    args: &BugArgs,
    dry_run: bool,
) -> Result<(), String> {
    let report = report(args);
    let draft = report.to_draft();

    if dry_run {
        println!("Dry run: would create {} issue: {}", draft.issue_type, draft.summary);
        if let Some(origin) = &report.found_in {
            println!("  then link it to {origin} and comment there");
        }
        return Ok(());
    }

    let bug = ctx
        .tracker
        .create_issue(&draft)
        .await
        .map_err(|e| format!("Failed to create bug: {e}"))?;
    tracing::info!(bug = %bug, severity = %report.severity, "bug created");
    println!("Created {bug}");

    if report.found_in.is_none() {
        return Ok(());
    }

    let event = RepositoryEvent::BugFiled(BugFiled {
        bug,
        found_in: report.found_in,
        title: report.title,
        severity: report.severity,
    });
    super::correlate_and_dispatch(ctx, correlator, &event, false).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;

    #[test]
    fn report_carries_every_argument() {
        let args = BugArgs {
            title: "Login fails".into(),
            description: "500 on submit".into(),
            severity: Severity::High,
            found_in: Some("PROJ-7".parse().unwrap()),
            environment: "staging".into(),
            steps: vec!["open /login".into(), "submit".into()],
            expected: "signed in".into(),
            actual: "error page".into(),
        };
        let report = report(&args);
        assert_eq!(report.steps_to_reproduce.len(), 2);
        assert_eq!(report.found_in.as_ref().unwrap().as_str(), "PROJ-7");

        let draft = report.to_draft();
        assert_eq!(draft.issue_type, "Bug");
        assert!(draft.description.contains("1. open /login"));
    }
}

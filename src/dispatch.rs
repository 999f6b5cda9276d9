//! Executes planned actions against the tracker gateway.
//!
//! Actions run one at a time in the order the correlator emitted them. A failed
//! action is recorded and logged; the remaining actions still run.

use std::fmt;

use crate::correlate::{CorrelatedAction, PlannedAction};
use crate::ports::tracker::{GatewayError, TrackerGateway};

/// Result of executing one planned action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// The action that was attempted.
    pub action: PlannedAction,
    /// What the gateway answered.
    pub result: Result<(), GatewayError>,
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(()) => write!(f, "ok      {}", self.action),
            Err(e) => write!(f, "FAILED  {}: {e}", self.action),
        }
    }
}

/// Per-action outcomes of one dispatch, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// One entry per attempted action.
    pub outcomes: Vec<ActionOutcome>,
}

impl DispatchReport {
    /// Number of actions that succeeded.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of actions that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when every action succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        write!(
            f,
            "{} action(s): {} succeeded, {} failed",
            self.outcomes.len(),
            self.succeeded(),
            self.failed()
        )
    }
}

/// Runs each action through `gateway`, continuing past failures.
pub async fn dispatch(gateway: &dyn TrackerGateway, actions: Vec<PlannedAction>) -> DispatchReport {
    let mut report = DispatchReport::default();

    for action in actions {
        let id = &action.work_item;
        let result = match &action.action {
            CorrelatedAction::AppendComment { text } => gateway.append_comment(id, text).await,
            CorrelatedAction::TransitionStatus { target } => {
                gateway.transition_status(id, *target).await
            }
            CorrelatedAction::LinkIssue { other, relation } => {
                gateway.link_issues(id, other, *relation).await
            }
            CorrelatedAction::AssignTo { account_id } => gateway.assign_issue(id, account_id).await,
            CorrelatedAction::LogWork(entry) => gateway.log_work(id, entry).await,
            CorrelatedAction::AddRemoteLink(link) => gateway.add_remote_link(id, link).await,
            CorrelatedAction::SetFixVersion { version } => {
                gateway.set_fix_version(id, version).await
            }
        };

        match &result {
            Ok(()) => {
                tracing::info!(work_item = %id, action = action.action.label(), "action applied");
            }
            Err(e) => {
                tracing::warn!(
                    work_item = %id,
                    action = action.action.label(),
                    error = %e,
                    "action failed"
                );
            }
        }
        report.outcomes.push(ActionOutcome { action, result });
    }

    report
}

//! Command dispatch and handlers.

pub mod bug;
pub mod events;
pub mod extract;
pub mod release;
pub mod vulnerability;

use std::env;
use std::path::PathBuf;

use tracing::Instrument;
use uuid::Uuid;

use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::correlate::Correlator;
use crate::dispatch::dispatch as dispatch_actions;
use crate::event::RepositoryEvent;

/// Records tracker and clock interactions into one cassette per run under
/// this directory.
pub const RECORD_ENV: &str = "TRACKLINK_RECORD";

/// Serves tracker and clock interactions from this cassette file.
pub const REPLAY_ENV: &str = "TRACKLINK_REPLAY";

/// Dispatch a parsed command to its handler.
///
/// `extract` runs without configuration. Every other command loads `.env`
/// and the process configuration, then runs inside a `run` span carrying a
/// fresh run id. When `TRACKLINK_REPLAY` is set the ports are served from
/// that cassette; otherwise, when `TRACKLINK_RECORD` is set, all port
/// interactions are recorded to `<run_id>.cassette.yaml` in that directory,
/// a file `TRACKLINK_REPLAY` accepts as is.
///
/// # Errors
///
/// Returns an error string if configuration is invalid, the selected
/// command fails, or any tracker action failed.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    if let Command::Extract { text } = &cli.command {
        extract::run(text);
        return Ok(());
    }

    let _ = dotenvy::dotenv();
    let config = Config::from_env().map_err(|e| e.to_string())?;

    let run_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("run", run_id = %run_id);
    let _entered = span.enter();

    let (ctx, session) = select_context(&config, &run_id)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    let result = runtime.block_on(dispatch_with_context(cli, &config, &ctx));

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

fn select_context(
    config: &Config,
    run_id: &str,
) -> Result<(ServiceContext, Option<RecordingSession>), String> {
    if let Ok(path) = env::var(REPLAY_ENV) {
        tracing::debug!(cassette = %path, "replaying port interactions");
        return Ok((ServiceContext::replaying(&PathBuf::from(path))?, None));
    }
    if let Ok(dir) = env::var(RECORD_ENV) {
        let (ctx, session) = ServiceContext::recording(config, &PathBuf::from(dir), run_id)?;
        return Ok((ctx, Some(session)));
    }
    Ok((ServiceContext::live(config), None))
}

/// Dispatch a command with the given service context.
async fn dispatch_with_context(
    cli: &Cli,
    config: &Config,
    ctx: &ServiceContext,
) -> Result<(), String> {
    let correlator = Correlator::new(config.correlator_config());
    let event = match &cli.command {
        Command::Extract { text } => {
            extract::run(text);
            return Ok(());
        }
        Command::Bug(args) => return bug::run(ctx, &correlator, args, cli.dry_run).await,
        Command::Vulnerability(args) => {
            return vulnerability::run(ctx, &correlator, args, cli.dry_run).await;
        }
        Command::Release(args) => {
            return release::run(ctx, config, &correlator, args, cli.dry_run).await;
        }
        Command::Commit(args) => events::commit(args),
        Command::PrOpened(args) => events::pr_opened(args),
        Command::PrMerged(args) => events::pr_merged(args),
        Command::PrReviewed(args) => events::pr_reviewed(args)?,
        Command::BranchCreated(args) => events::branch_created(args),
        Command::Deployment(args) => events::deployment(ctx, config, args).await?,
        Command::AgentStart(args) => events::agent_start(ctx, args),
        Command::AgentComplete(args) => events::agent_complete(ctx, args),
        Command::AgentMessage(args) => events::agent_message(ctx, args),
    };
    correlate_and_dispatch(ctx, &correlator, &event, cli.dry_run).await
}

/// Correlate one event and apply (or, on a dry run, print) its actions.
///
/// # Errors
///
/// Returns an error string if at least one action failed. Every action is
/// attempted before the error is returned.
pub(crate) async fn correlate_and_dispatch(
    ctx: &ServiceContext,
    correlator: &Correlator,
    event: &RepositoryEvent,
    dry_run: bool,
) -> Result<(), String> {
    let span = tracing::info_span!("event", kind = event.kind());
    async move {
        let actions = correlator.correlate(event);
        tracing::debug!(count = actions.len(), "actions planned");

        if actions.is_empty() {
            println!("No work items referenced; nothing to do.");
            return Ok(());
        }

        if dry_run {
            println!("Dry run: would perform:");
            for action in &actions {
                println!("  {action}");
            }
            return Ok(());
        }

        let report = dispatch_actions(ctx.tracker.as_ref(), actions).await;
        println!("{report}");
        if report.is_success() {
            Ok(())
        } else {
            Err(format!(
                "{} of {} tracker action(s) failed",
                report.failed(),
                report.outcomes.len()
            ))
        }
    }
    .instrument(span)
    .await
}

/// Finish a recording session and print the cassette path.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let cassette = session.finish()?;
    eprintln!("Recording saved to: {}", cassette.display());
    Ok(())
}

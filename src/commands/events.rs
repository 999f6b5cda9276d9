//! Builds repository events from command-line arguments.
//!
//! Timestamps come from the context clock and deployment work items from
//! the context tracker, so recorded runs replay identically.

use uuid::Uuid;

use crate::cli::{
    AgentCompleteArgs, AgentMessageArgs, AgentStartArgs, BranchCreatedArgs, CommitArgs,
    DeploymentArgs, PrMergedArgs, PrOpenedArgs, PrReviewedArgs, ReviewState,
};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::event::{
    AgentTaskCompleted, AgentTaskStarted, BranchCreated, CommitPushed, DeploymentCompleted,
    PullRequestMerged, PullRequestOpened, PullRequestReviewed, RepositoryEvent, ReviewVerdict,
};
use crate::keys::WorkItemId;
use crate::message::AgentMessage;

/// `tracklink commit`.
#[must_use]
pub fn commit(args: &CommitArgs) -> RepositoryEvent {
    RepositoryEvent::CommitPushed(CommitPushed {
        hash: args.hash.clone(),
        message: args.message.clone(),
        author: args.author.clone(),
        branch: args.branch.clone(),
    })
}

/// `tracklink pr-opened`.
#[must_use]
pub fn pr_opened(args: &PrOpenedArgs) -> RepositoryEvent {
    RepositoryEvent::PullRequestOpened(PullRequestOpened {
        number: args.number,
        title: args.title.clone(),
        description: args.description.clone(),
        url: args.url.clone(),
        author: args.author.clone(),
        base_branch: args.base.clone(),
        head_branch: args.head.clone(),
    })
}

/// `tracklink pr-merged`.
#[must_use]
pub fn pr_merged(args: &PrMergedArgs) -> RepositoryEvent {
    RepositoryEvent::PullRequestMerged(PullRequestMerged {
        number: args.number,
        title: args.title.clone(),
        url: args.url.clone(),
        merged_by: args.merged_by.clone(),
        base_branch: args.base.clone(),
    })
}

/// `tracklink pr-reviewed`.
///
/// # Errors
///
/// Returns an error string if changes were requested without a comment.
pub fn pr_reviewed(args: &PrReviewedArgs) -> Result<RepositoryEvent, String> {
    let verdict = match args.state {
        ReviewState::Approved => ReviewVerdict::Approved { comment: args.comment.clone() },
        ReviewState::ChangesRequested => ReviewVerdict::ChangesRequested {
            comment: args
                .comment
                .clone()
                .ok_or("--comment is required when changes are requested")?,
        },
    };
    Ok(RepositoryEvent::PullRequestReviewed(PullRequestReviewed {
        number: args.number,
        title: args.title.clone(),
        reviewer: args.reviewer.clone(),
        verdict,
    }))
}

/// `tracklink branch-created`.
#[must_use]
pub fn branch_created(args: &BranchCreatedArgs) -> RepositoryEvent {
    RepositoryEvent::BranchCreated(BranchCreated {
        branch: args.branch.clone(),
        author: args.author.clone(),
    })
}

/// Resolves the work items referenced by the history ending at
/// `commit_hash`. `lookback` overrides the configured depth.
///
/// # Errors
///
/// Returns an error string if the commit history cannot be resolved.
pub(crate) async fn resolve_work_items(
    ctx: &ServiceContext,
    config: &Config,
    commit_hash: &str,
    lookback: Option<u64>,
) -> Result<Vec<WorkItemId>, String> {
    let lookback =
        lookback.and_then(|n| usize::try_from(n).ok()).unwrap_or(config.deploy_lookback);
    let work_items = ctx
        .tracker
        .resolve_recent_commit_ids(commit_hash, lookback)
        .await
        .map_err(|e| format!("Failed to resolve work items for {commit_hash}: {e}"))?;
    tracing::info!(
        commit = %commit_hash,
        lookback,
        work_items = work_items.len(),
        "resolved work items from history"
    );
    Ok(work_items)
}

/// `tracklink deployment`.
///
/// Resolves the work items of the deployed commit history before the event
/// is built. The lookup is read-only and runs on dry runs too.
///
/// # Errors
///
/// Returns an error string if the commit history cannot be resolved.
pub async fn deployment(
    ctx: &ServiceContext,
    config: &Config,
    args: &DeploymentArgs,
) -> Result<RepositoryEvent, String> {
    let work_items = resolve_work_items(ctx, config, &args.commit_hash, args.lookback).await?;

    Ok(RepositoryEvent::DeploymentCompleted(DeploymentCompleted {
        environment: args.environment,
        version: args.version.clone(),
        url: args.url.clone(),
        commit_hash: args.commit_hash.clone(),
        deployed_by: args.deployed_by.clone(),
        deployed_at: ctx.clock.now(),
        work_items,
    }))
}

/// `tracklink agent-start`.
#[must_use]
pub fn agent_start(ctx: &ServiceContext, args: &AgentStartArgs) -> RepositoryEvent {
    RepositoryEvent::AgentTaskStarted(AgentTaskStarted {
        agent: args.agent,
        work_item: args.issue.clone(),
        started_at: ctx.clock.now(),
    })
}

/// `tracklink agent-complete`.
#[must_use]
pub fn agent_complete(ctx: &ServiceContext, args: &AgentCompleteArgs) -> RepositoryEvent {
    RepositoryEvent::AgentTaskCompleted(AgentTaskCompleted {
        agent: args.agent,
        work_item: args.issue.clone(),
        summary: args.summary.clone(),
        artifacts: args.artifacts.clone(),
        completed_at: ctx.clock.now(),
    })
}

/// `tracklink agent-message`.
///
/// A message without `--id` gets a fresh uuid.
#[must_use]
pub fn agent_message(ctx: &ServiceContext, args: &AgentMessageArgs) -> RepositoryEvent {
    RepositoryEvent::AgentMessageSent(AgentMessage {
        id: args.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
        sent_at: ctx.clock.now(),
        from: args.from,
        to: args.to.clone(),
        message_type: args.message_type,
        priority: args.priority,
        payload: args.payload.clone(),
        work_item: args.issue.clone(),
    })
}

//! Recording adapter for the `TrackerGateway` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::correlate::{LinkRelation, RemoteLink, TrackerState, WorkLog};
use crate::issue::{IssueDraft, VersionDraft};
use crate::keys::WorkItemId;
use crate::ports::tracker::{GatewayFuture, TrackerGateway};

/// Records tracker interactions while delegating to an inner gateway.
pub struct RecordingTrackerGateway {
    inner: Box<dyn TrackerGateway>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingTrackerGateway {
    /// Creates a new recording gateway wrapping the given implementation.
    #[must_use]
    pub fn new(inner: Box<dyn TrackerGateway>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct CommentInput {
    id: WorkItemId,
    text: String,
}

#[derive(Serialize)]
struct TransitionInput {
    id: WorkItemId,
    target: TrackerState,
}

#[derive(Serialize)]
struct LinkInput {
    from: WorkItemId,
    to: WorkItemId,
    relation: LinkRelation,
}

#[derive(Serialize)]
struct ResolveInput {
    commit_hash: String,
    lookback: usize,
}

#[derive(Serialize)]
struct AssignInput {
    id: WorkItemId,
    account_id: String,
}

#[derive(Serialize)]
struct WorkLogInput {
    id: WorkItemId,
    entry: WorkLog,
}

#[derive(Serialize)]
struct RemoteLinkInput {
    id: WorkItemId,
    link: RemoteLink,
}

#[derive(Serialize)]
struct FixVersionInput {
    id: WorkItemId,
    version: String,
}

impl TrackerGateway for RecordingTrackerGateway {
    fn append_comment(&self, id: &WorkItemId, text: &str) -> GatewayFuture<'_, ()> {
        let input = CommentInput { id: id.clone(), text: text.to_owned() };

        Box::pin(async move {
            let result = self.inner.append_comment(&input.id, &input.text).await;
            record_result(&self.recorder, "tracker", "append_comment", &input, &result);
            result
        })
    }

    fn transition_status(&self, id: &WorkItemId, target: TrackerState) -> GatewayFuture<'_, ()> {
        let input = TransitionInput { id: id.clone(), target };

        Box::pin(async move {
            let result = self.inner.transition_status(&input.id, input.target).await;
            record_result(&self.recorder, "tracker", "transition_status", &input, &result);
            result
        })
    }

    fn link_issues(
        &self,
        from: &WorkItemId,
        to: &WorkItemId,
        relation: LinkRelation,
    ) -> GatewayFuture<'_, ()> {
        let input = LinkInput { from: from.clone(), to: to.clone(), relation };

        Box::pin(async move {
            let result = self.inner.link_issues(&input.from, &input.to, input.relation).await;
            record_result(&self.recorder, "tracker", "link_issues", &input, &result);
            result
        })
    }

    fn resolve_recent_commit_ids(
        &self,
        commit_hash: &str,
        lookback: usize,
    ) -> GatewayFuture<'_, Vec<WorkItemId>> {
        let input = ResolveInput { commit_hash: commit_hash.to_owned(), lookback };

        Box::pin(async move {
            let result =
                self.inner.resolve_recent_commit_ids(&input.commit_hash, input.lookback).await;
            record_result(&self.recorder, "tracker", "resolve_recent_commit_ids", &input, &result);
            result
        })
    }

    fn create_issue(&self, draft: &IssueDraft) -> GatewayFuture<'_, WorkItemId> {
        let draft = draft.clone();

        Box::pin(async move {
            let result = self.inner.create_issue(&draft).await;
            record_result(&self.recorder, "tracker", "create_issue", &draft, &result);
            result
        })
    }

    fn assign_issue(&self, id: &WorkItemId, account_id: &str) -> GatewayFuture<'_, ()> {
        let input = AssignInput { id: id.clone(), account_id: account_id.to_owned() };

        Box::pin(async move {
            let result = self.inner.assign_issue(&input.id, &input.account_id).await;
            record_result(&self.recorder, "tracker", "assign_issue", &input, &result);
            result
        })
    }

    fn log_work(&self, id: &WorkItemId, entry: &WorkLog) -> GatewayFuture<'_, ()> {
        let input = WorkLogInput { id: id.clone(), entry: entry.clone() };

        Box::pin(async move {
            let result = self.inner.log_work(&input.id, &input.entry).await;
            record_result(&self.recorder, "tracker", "log_work", &input, &result);
            result
        })
    }

    fn add_remote_link(&self, id: &WorkItemId, link: &RemoteLink) -> GatewayFuture<'_, ()> {
        let input = RemoteLinkInput { id: id.clone(), link: link.clone() };

        Box::pin(async move {
            let result = self.inner.add_remote_link(&input.id, &input.link).await;
            record_result(&self.recorder, "tracker", "add_remote_link", &input, &result);
            result
        })
    }

    fn create_version(&self, draft: &VersionDraft) -> GatewayFuture<'_, String> {
        let draft = draft.clone();

        Box::pin(async move {
            let result = self.inner.create_version(&draft).await;
            record_result(&self.recorder, "tracker", "create_version", &draft, &result);
            result
        })
    }

    fn set_fix_version(&self, id: &WorkItemId, version: &str) -> GatewayFuture<'_, ()> {
        let input = FixVersionInput { id: id.clone(), version: version.to_owned() };

        Box::pin(async move {
            let result = self.inner.set_fix_version(&input.id, &input.version).await;
            record_result(&self.recorder, "tracker", "set_fix_version", &input, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::{JiraGateway, LiveGitHistory};

    #[tokio::test]
    async fn records_failed_comment_interaction() {
        let dir = std::env::temp_dir().join("tracklink_rec_tracker_test");
        std::fs::create_dir_all(&dir).unwrap();
        let cassette_path = dir.join("tracker.cassette.yaml");

        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&cassette_path, "test", "abc")));

        {
            // Unconfigured, so the call fails, but it is still recorded.
            let inner = JiraGateway::new(None, Box::new(LiveGitHistory));
            let gateway = RecordingTrackerGateway::new(Box::new(inner), Arc::clone(&recorder));
            let id: WorkItemId = "PROJ-1".parse().unwrap();
            assert!(gateway.append_comment(&id, "Deployed").await.is_err());
        }

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        recorder.finish().unwrap();

        let content = std::fs::read_to_string(&cassette_path).unwrap();
        assert!(content.contains("append_comment"));
        assert!(content.contains("PROJ-1"));
        assert!(content.contains("Err"));
        assert!(content.contains("tracker unavailable"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

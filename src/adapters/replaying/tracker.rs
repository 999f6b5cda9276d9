//! Replaying adapter for the `TrackerGateway` port.

use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;

use super::replay_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::correlate::{LinkRelation, RemoteLink, TrackerState, WorkLog};
use crate::issue::{IssueDraft, VersionDraft};
use crate::keys::WorkItemId;
use crate::ports::tracker::{GatewayError, GatewayFuture, TrackerGateway};

/// Serves tracker results from a cassette instead of the network.
///
/// Recorded failures come back as [`GatewayError::Replayed`]. A call with
/// no matching recording fails the same way rather than panicking, so a
/// diverging replay still produces a dispatch report.
pub struct ReplayingTrackerGateway {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingTrackerGateway {
    /// Creates a new replaying gateway from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn next<T: DeserializeOwned>(&self, method: &str) -> Result<T, GatewayError> {
        let mut replayer = self.replayer.lock().unwrap_or_else(PoisonError::into_inner);
        let interaction = replayer
            .next_interaction("tracker", method)
            .map_err(|e| GatewayError::Replayed(e.to_string()))?;
        replay_result::<T>(&interaction.output, method)
            .map_err(GatewayError::Replayed)?
            .map_err(GatewayError::Replayed)
    }
}

impl TrackerGateway for ReplayingTrackerGateway {
    fn append_comment(&self, _id: &WorkItemId, _text: &str) -> GatewayFuture<'_, ()> {
        let result = self.next("append_comment");
        Box::pin(async move { result })
    }

    fn transition_status(&self, _id: &WorkItemId, _target: TrackerState) -> GatewayFuture<'_, ()> {
        let result = self.next("transition_status");
        Box::pin(async move { result })
    }

    fn link_issues(
        &self,
        _from: &WorkItemId,
        _to: &WorkItemId,
        _relation: LinkRelation,
    ) -> GatewayFuture<'_, ()> {
        let result = self.next("link_issues");
        Box::pin(async move { result })
    }

    fn resolve_recent_commit_ids(
        &self,
        _commit_hash: &str,
        _lookback: usize,
    ) -> GatewayFuture<'_, Vec<WorkItemId>> {
        let result = self.next("resolve_recent_commit_ids");
        Box::pin(async move { result })
    }

    fn create_issue(&self, _draft: &IssueDraft) -> GatewayFuture<'_, WorkItemId> {
        let result = self.next("create_issue");
        Box::pin(async move { result })
    }

    fn assign_issue(&self, _id: &WorkItemId, _account_id: &str) -> GatewayFuture<'_, ()> {
        let result = self.next("assign_issue");
        Box::pin(async move { result })
    }

    fn log_work(&self, _id: &WorkItemId, _entry: &WorkLog) -> GatewayFuture<'_, ()> {
        let result = self.next("log_work");
        Box::pin(async move { result })
    }

    fn add_remote_link(&self, _id: &WorkItemId, _link: &RemoteLink) -> GatewayFuture<'_, ()> {
        let result = self.next("add_remote_link");
        Box::pin(async move { result })
    }

    fn create_version(&self, _draft: &VersionDraft) -> GatewayFuture<'_, String> {
        let result = self.next("create_version");
        Box::pin(async move { result })
    }

    fn set_fix_version(&self, _id: &WorkItemId, _version: &str) -> GatewayFuture<'_, ()> {
        let result = self.next("set_fix_version");
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::{json, Value};

    fn tracker_call(seq: u64, method: &str, output: Value) -> Interaction {
        Interaction {
            seq,
            port: "tracker".into(),
            method: method.into(),
            input: json!({}),
            output,
        }
    }

    fn make_gateway(interactions: Vec<Interaction>) -> ReplayingTrackerGateway {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            run_id: "abc".into(),
            interactions,
        };
        ReplayingTrackerGateway::new(CassetteReplayer::new(&cassette))
    }

    fn id(value: &str) -> WorkItemId {
        value.parse().unwrap()
    }

    #[tokio::test]
    async fn replays_success_and_recorded_failure() {
        let gateway = make_gateway(vec![
            tracker_call(0, "append_comment", json!({"Ok": null})),
            tracker_call(1, "append_comment", json!({"Err": "tracker rejected request (404)"})),
        ]);

        gateway.append_comment(&id("PROJ-1"), "one").await.unwrap();
        let err = gateway.append_comment(&id("PROJ-2"), "two").await.unwrap_err();
        assert_eq!(err, GatewayError::Replayed("tracker rejected request (404)".into()));
    }

    #[tokio::test]
    async fn replays_resolved_ids_and_created_issue() {
        let gateway = make_gateway(vec![
            tracker_call(0, "resolve_recent_commit_ids", json!({"Ok": ["PROJ-3", "PROJ-1"]})),
            tracker_call(1, "create_issue", json!({"Ok": "PROJ-42"})),
        ]);

        let ids = gateway.resolve_recent_commit_ids("abc", 10).await.unwrap();
        assert_eq!(ids, vec![id("PROJ-3"), id("PROJ-1")]);

        let draft = IssueDraft {
            issue_type: "Bug".into(),
            summary: "s".into(),
            description: "d".into(),
            priority: None,
            labels: vec![],
        };
        assert_eq!(gateway.create_issue(&draft).await.unwrap(), id("PROJ-42"));
    }

    #[tokio::test]
    async fn replays_created_version_then_fix_versions() {
        let gateway = make_gateway(vec![
            tracker_call(0, "create_version", json!({"Ok": "10021"})),
            tracker_call(1, "set_fix_version", json!({"Ok": null})),
            tracker_call(2, "set_fix_version", json!({"Err": "tracker rejected request (400)"})),
        ]);

        let draft = VersionDraft { name: "1.4.0".into(), release_date: None, description: None };
        assert_eq!(gateway.create_version(&draft).await.unwrap(), "10021");
        gateway.set_fix_version(&id("PROJ-1"), "1.4.0").await.unwrap();
        assert!(gateway.set_fix_version(&id("PROJ-2"), "1.4.0").await.is_err());
    }

    #[tokio::test]
    async fn unrecorded_call_fails_without_panicking() {
        let gateway = make_gateway(vec![]);
        let err = gateway
            .transition_status(&id("PROJ-1"), TrackerState::Done)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("tracker::transition_status"));
    }
}

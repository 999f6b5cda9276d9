//! `tracklink release` command.

use crate::cli::ReleaseArgs;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::correlate::Correlator;
use crate::event::{ReleaseCreated, RepositoryEvent};
use crate::issue::VersionDraft;

/// Create the version, then set it as the fix version of every work item
/// referenced by the release history.
///
/// The history lookup runs on dry runs too; version creation does not.
///
/// # Errors
///
/// Returns an error string if the version cannot be created, the history
/// cannot be resolved, or a fix version cannot be set.
pub async fn run(
    ctx: &ServiceContext,
    config: &Config,
    correlator: &Correlator,
    args: &ReleaseArgs,
    dry_run: bool,
) -> Result<(), String> {
    let draft = VersionDraft {
        name: args.version.clone(),
        release_date: args.release_date,
        description: args.description.clone(),
    };

    if dry_run {
        println!("Dry run: would create version {}", draft.name);
    } else {
        let version_id = ctx
            .tracker
            .create_version(&draft)
            .await
            .map_err(|e| format!("Failed to create version {}: {e}", draft.name))?;
        tracing::info!(version = %draft.name, version_id = %version_id, "version created");
        println!("Created version {} ({version_id})", draft.name);
    }

    let work_items =
        super::events::resolve_work_items(ctx, config, &args.commit_hash, args.lookback).await?;
    let event =
        RepositoryEvent::ReleaseCreated(ReleaseCreated { version: draft.name, work_items });
    super::correlate_and_dispatch(ctx, correlator, &event, dry_run).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use serde_json::json;

    fn args() -> ReleaseArgs {
        ReleaseArgs {
            version: "2.1.0".into(),
            commit_hash: "abc".into(),
            release_date: None,
            description: None,
            lookback: Some(3),
        }
    }

    fn replaying(name: &str, interactions: &[(&str, serde_json::Value)]) -> ServiceContext {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("run.cassette.yaml");
        let cassette = Cassette {
            name: name.into(),
            recorded_at: chrono::Utc::now(),
            run_id: "run".into(),
            interactions: interactions
                .iter()
                .zip(0..)
                .map(|((method, output), seq)| Interaction {
                    seq,
                    port: "tracker".into(),
                    method: (*method).into(),
                    input: json!({}),
                    output: output.clone(),
                })
                .collect(),
        };
        std::fs::write(&path, serde_yaml::to_string(&cassette).unwrap()).unwrap();
        ServiceContext::replaying(&path).unwrap()
    }

    #[tokio::test]
    async fn release_tags_every_resolved_item() {
        let ctx = replaying(
            "tracklink_release_test",
            &[
                ("create_version", json!({"Ok": "10042"})),
                ("resolve_recent_commit_ids", json!({"Ok": ["PROJ-4", "PROJ-6"]})),
                ("set_fix_version", json!({"Ok": null})),
                ("set_fix_version", json!({"Ok": null})),
            ],
        );

        run(&ctx, &Config::default(), &Correlator::default(), &args(), false).await.unwrap();

        let _ = std::fs::remove_dir_all(std::env::temp_dir().join("tracklink_release_test"));
    }

    #[tokio::test]
    async fn failed_fix_version_fails_the_release() {
        let ctx = replaying(
            "tracklink_release_partial_test",
            &[
                ("create_version", json!({"Ok": "10043"})),
                ("resolve_recent_commit_ids", json!({"Ok": ["PROJ-4", "PROJ-6"]})),
                ("set_fix_version", json!({"Err": "tracker rejected request (404)"})),
                ("set_fix_version", json!({"Ok": null})),
            ],
        );

        let err = run(&ctx, &Config::default(), &Correlator::default(), &args(), false)
            .await
            .unwrap_err();
        assert_eq!(err, "1 of 2 tracker action(s) failed");

        let _ =
            std::fs::remove_dir_all(std::env::temp_dir().join("tracklink_release_partial_test"));
    }

    #[tokio::test]
    async fn dry_run_skips_version_creation() {
        // Only the history lookup is recorded; creating a version would fail.
        let ctx = replaying(
            "tracklink_release_dry_test",
            &[("resolve_recent_commit_ids", json!({"Ok": ["PROJ-4"]}))],
        );

        run(&ctx, &Config::default(), &Correlator::default(), &args(), true).await.unwrap();

        let _ = std::fs::remove_dir_all(std::env::temp_dir().join("tracklink_release_dry_test"));
    }
}

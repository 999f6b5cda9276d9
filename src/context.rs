//! Service context bundling the port trait objects a run needs.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::live::{JiraGateway, LiveClock, LiveGitHistory};
use crate::adapters::recording::{RecordingClock, RecordingTrackerGateway};
use crate::adapters::replaying::{ReplayingClock, ReplayingTrackerGateway};
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::Config;
use crate::ports::clock::Clock;
use crate::ports::tracker::TrackerGateway;

/// Bundles the port trait objects into a single context.
///
/// Constructors wire up different adapter implementations (live,
/// recording, replaying); command handlers only see the traits.
pub struct ServiceContext {
    /// Clock for obtaining the current time.
    pub clock: Box<dyn Clock>,
    /// Gateway for tracker mutations and commit history lookups.
    pub tracker: Box<dyn TrackerGateway>,
}

impl ServiceContext {
    /// Creates a live context talking to the configured tracker.
    ///
    /// An unconfigured tracker still yields a context; its mutations fail
    /// per call.
    #[must_use]
    pub fn live(config: &Config) -> Self {
        Self {
            clock: Box::new(LiveClock),
            tracker: Box::new(JiraGateway::new(config.tracker.clone(), Box::new(LiveGitHistory))),
        }
    }

    /// Creates a live context whose tracker and clock interactions are
    /// recorded into the single cassette `<dir>/<run_id>.cassette.yaml`.
    ///
    /// The returned session must be finished after the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette directory cannot be created.
    pub fn recording(
        config: &Config,
        dir: &Path,
        run_id: &str,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::at(dir, run_id)?;
        let live = Self::live(config);
        let ctx = Self {
            clock: Box::new(RecordingClock::new(live.clock, Arc::clone(&session.recorder))),
            tracker: Box::new(RecordingTrackerGateway::new(
                live.tracker,
                Arc::clone(&session.recorder),
            )),
        };
        Ok((ctx, session))
    }

    /// Creates a replaying context from one cassette file.
    ///
    /// Each port gets its own replayer from the same cassette so that
    /// per-port cursors are independent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = CassetteReplayer::load(path).map_err(|e| e.to_string())?;
        Ok(Self {
            clock: Box::new(ReplayingClock::new(CassetteReplayer::new(&cassette))),
            tracker: Box::new(ReplayingTrackerGateway::new(CassetteReplayer::new(&cassette))),
        })
    }
}

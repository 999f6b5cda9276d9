//! Clock port for timestamps in tracker comments.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// Deployment and agent comments carry a timestamp; a replayed clock keeps
/// those comments byte-for-byte reproducible.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the correlation core and an
//! external system (issue tracker, git history, time). Implementations
//! live in `src/adapters/`.

pub mod clock;
pub mod git;
pub mod tracker;

pub use clock::Clock;
pub use git::GitHistory;
pub use tracker::{GatewayError, GatewayFuture, TrackerGateway};

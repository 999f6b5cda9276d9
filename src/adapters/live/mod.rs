//! Live adapters for real external interactions.

pub mod clock;
pub mod git;
pub mod tracker;

pub use clock::LiveClock;
pub use git::LiveGitHistory;
pub use tracker::JiraGateway;

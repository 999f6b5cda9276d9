//! Cassette format for recording and replaying tracker interactions.

pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;

//! Replaying adapters that serve recorded interactions.

pub mod clock;
pub mod tracker;

pub use clock::ReplayingClock;
pub use tracker::ReplayingTrackerGateway;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a recorded `Result` written with the Ok/Err JSON convention.
///
/// Mirror of `recording::record_result`. The outer `Err` means the cassette
/// entry itself is unusable; the inner `Err` carries a recorded failure.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: &Value,
    context: &str,
) -> Result<Result<T, String>, String> {
    if let Some(ok) = output.get("Ok") {
        return serde_json::from_value(ok.clone())
            .map(Ok)
            .map_err(|e| format!("{context}: failed to deserialize recorded value: {e}"));
    }
    if let Some(err) = output.get("Err") {
        let message = err.as_str().map_or_else(|| err.to_string(), str::to_owned);
        return Ok(Err(message));
    }
    Err(format!("{context}: recorded output is neither Ok nor Err: {output}"))
}

//! Replays recorded interactions from a cassette.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use super::format::{Cassette, Interaction};

/// Why a cassette could not be loaded or served.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The cassette file could not be read.
    #[error("failed to read cassette file {path}: {source}")]
    Read {
        /// Cassette path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The cassette file is not valid cassette YAML.
    #[error("failed to parse cassette file {path}: {source}")]
    Parse {
        /// Cassette path.
        path: String,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// No recorded interaction remains for the requested call.
    #[error("cassette exhausted for {port}::{method}: {detail}")]
    Exhausted {
        /// Port name.
        port: String,
        /// Method name.
        method: String,
        /// What was left in the cassette.
        detail: String,
    },
}

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Replays interactions from a loaded cassette, serving them sequentially
/// per port/method pair.
pub struct CassetteReplayer {
    queues: HashMap<PortMethodKey, Vec<Interaction>>,
    cursors: HashMap<PortMethodKey, usize>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push(interaction.clone());
        }
        let cursors = queues.keys().map(|k| (k.clone(), 0)).collect();
        Self { queues, cursors }
    }

    /// Load a cassette from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Cassette, ReplayError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ReplayError::Read { path: path.display().to_string(), source })?;
        serde_yaml::from_str(&content)
            .map_err(|source| ReplayError::Parse { path: path.display().to_string(), source })
    }

    /// Return the next interaction for the given port and method.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Exhausted`] if the cassette has no (more)
    /// interactions for the given port/method combination.
    pub fn next_interaction(
        &mut self,
        port: &str,
        method: &str,
    ) -> Result<&Interaction, ReplayError> {
        let key = PortMethodKey { port: port.to_owned(), method: method.to_owned() };
        let exhausted = |detail: String| ReplayError::Exhausted {
            port: port.to_owned(),
            method: method.to_owned(),
            detail,
        };

        let Some(queue) = self.queues.get(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            available.sort();
            return Err(exhausted(format!(
                "nothing recorded; available: [{}]",
                available.join(", ")
            )));
        };

        let cursor = self.cursors.entry(key).or_insert(0);
        let Some(interaction) = queue.get(*cursor) else {
            return Err(exhausted(format!(
                "all {} interactions consumed, last was seq={}",
                queue.len(),
                queue.last().map_or(0, |i| i.seq)
            )));
        };
        *cursor += 1;
        Ok(interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: port.into(), method: method.into(), input: json!({}), output }
    }

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            run_id: "abc".into(),
            interactions,
        }
    }

    #[test]
    fn serves_each_port_method_in_order() {
        let cassette = make_cassette(vec![
            interaction(0, "tracker", "append_comment", json!({"Ok": null})),
            interaction(1, "clock", "now", json!("2024-06-15T10:30:00Z")),
            interaction(2, "tracker", "append_comment", json!({"Err": "boom"})),
        ]);

        let mut replayer = CassetteReplayer::new(&cassette);

        let first = replayer.next_interaction("tracker", "append_comment").unwrap();
        assert_eq!(first.seq, 0);

        let clock = replayer.next_interaction("clock", "now").unwrap();
        assert_eq!(clock.output, json!("2024-06-15T10:30:00Z"));

        let second = replayer.next_interaction("tracker", "append_comment").unwrap();
        assert_eq!(second.output, json!({"Err": "boom"}));
    }

    #[test]
    fn exhausted_queue_is_an_error() {
        let cassette = make_cassette(vec![interaction(0, "clock", "now", json!(""))]);
        let mut replayer = CassetteReplayer::new(&cassette);
        replayer.next_interaction("clock", "now").unwrap();

        let err = replayer.next_interaction("clock", "now").unwrap_err();
        assert!(err.to_string().contains("all 1 interactions consumed"));
    }

    #[test]
    fn unknown_method_lists_what_is_available() {
        let cassette = make_cassette(vec![interaction(0, "clock", "now", json!(""))]);
        let mut replayer = CassetteReplayer::new(&cassette);

        let err = replayer.next_interaction("tracker", "link_issues").unwrap_err();
        assert!(matches!(err, ReplayError::Exhausted { .. }));
        assert!(err.to_string().contains("clock::now"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CassetteReplayer::load(Path::new("/nonexistent/x.cassette.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/x.cassette.yaml"));
    }
}

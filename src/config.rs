//! Process configuration.
//!
//! Loaded once at startup (after `.env` is applied) and passed explicitly to
//! the correlator and the live gateway. Nothing reads the environment after
//! this point.

use std::collections::BTreeMap;
use std::env;

use thiserror::Error;

use crate::agent::AgentKind;
use crate::correlate::CorrelatorConfig;

/// Default number of commits scanned for work items on deployment.
pub const DEFAULT_DEPLOY_LOOKBACK: usize = 10;

/// Project key used when none is configured.
pub const DEFAULT_PROJECT_KEY: &str = "PROJ";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Connection settings for the live tracker.
#[derive(Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Base URL, e.g. `https://yoursite.atlassian.net`, without trailing slash.
    pub base_url: String,
    /// Project new issues are created in.
    pub project_key: String,
    /// Account email used for basic auth.
    pub email: String,
    /// API token used for basic auth.
    pub api_token: String,
}

impl std::fmt::Debug for TrackerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerSettings")
            .field("base_url", &self.base_url)
            .field("project_key", &self.project_key)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Immutable configuration for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Live tracker settings; `None` when the tracker is not configured.
    pub tracker: Option<TrackerSettings>,
    /// Repository web URL for commit links.
    pub repository_url: Option<String>,
    /// Branches whose merges move work items to testing.
    pub trunk_branches: Vec<String>,
    /// Commits scanned for work items on deployment.
    pub deploy_lookback: usize,
    /// Tracker account id per agent role, from `TRACKER_<ROLE>_ACCOUNT_ID`.
    pub agent_accounts: BTreeMap<AgentKind, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker: None,
            repository_url: None,
            trunk_branches: CorrelatorConfig::default().trunk_branches,
            deploy_lookback: DEFAULT_DEPLOY_LOOKBACK,
            agent_accounts: BTreeMap::new(),
        }
    }
}

/// Name of the variable holding the tracker account id of `agent`.
#[must_use]
pub fn agent_account_var(agent: AgentKind) -> String {
    format!("TRACKER_{}_ACCOUNT_ID", agent.as_str().to_ascii_uppercase())
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset.
    ///
    /// The tracker is considered configured only when `TRACKER_BASE_URL`,
    /// `TRACKER_EMAIL` and `TRACKER_API_TOKEN` are all present.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
        };

        let tracker = match (get("TRACKER_BASE_URL"), get("TRACKER_EMAIL"), get("TRACKER_API_TOKEN"))
        {
            (Some(base_url), Some(email), Some(api_token)) => Some(TrackerSettings {
                base_url: base_url.trim_end_matches('/').to_owned(),
                project_key: get("TRACKER_PROJECT_KEY")
                    .unwrap_or_else(|| DEFAULT_PROJECT_KEY.to_owned()),
                email,
                api_token,
            }),
            _ => None,
        };

        let trunk_branches = match get("TRACKLINK_TRUNK_BRANCHES") {
            Some(raw) => {
                let branches: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .map(str::to_owned)
                    .collect();
                if branches.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        name: "TRACKLINK_TRUNK_BRANCHES",
                        value: raw,
                        reason: "expected a comma-separated list of branch names",
                    });
                }
                branches
            }
            None => CorrelatorConfig::default().trunk_branches,
        };

        let deploy_lookback = match get("TRACKLINK_DEPLOY_LOOKBACK") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "TRACKLINK_DEPLOY_LOOKBACK",
                        value: raw,
                        reason: "expected a positive integer",
                    })
                }
            },
            None => DEFAULT_DEPLOY_LOOKBACK,
        };

        let agent_accounts = AgentKind::ALL
            .into_iter()
            .filter_map(|agent| get(&agent_account_var(agent)).map(|account| (agent, account)))
            .collect();

        Ok(Self {
            tracker,
            repository_url: get("TRACKLINK_REPO_URL"),
            trunk_branches,
            deploy_lookback,
            agent_accounts,
        })
    }

    /// Returns the correlator policy derived from this configuration.
    #[must_use]
    pub fn correlator_config(&self) -> CorrelatorConfig {
        CorrelatorConfig {
            trunk_branches: self.trunk_branches.clone(),
            repository_url: self.repository_url.clone(),
            agent_accounts: self.agent_accounts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.trunk_branches, vec!["main", "master"]);
        assert_eq!(config.deploy_lookback, 10);
        assert!(config.tracker.is_none());
    }

    #[test]
    fn tracker_requires_url_and_credentials() {
        let partial = Config::from_lookup(lookup(&[
            ("TRACKER_BASE_URL", "https://site.atlassian.net"),
            ("TRACKER_EMAIL", "bot@example.com"),
        ]))
        .unwrap();
        assert!(partial.tracker.is_none());

        let full = Config::from_lookup(lookup(&[
            ("TRACKER_BASE_URL", "https://site.atlassian.net/"),
            ("TRACKER_EMAIL", "bot@example.com"),
            ("TRACKER_API_TOKEN", "secret"),
            ("TRACKER_PROJECT_KEY", "WEAT"),
        ]))
        .unwrap();
        let tracker = full.tracker.unwrap();
        assert_eq!(tracker.base_url, "https://site.atlassian.net");
        assert_eq!(tracker.project_key, "WEAT");
        assert!(!format!("{tracker:?}").contains("secret"));
    }

    #[test]
    fn trunk_branches_override() {
        let config =
            Config::from_lookup(lookup(&[("TRACKLINK_TRUNK_BRANCHES", "trunk, release ,")]))
                .unwrap();
        assert_eq!(config.trunk_branches, vec!["trunk", "release"]);
        assert_eq!(config.correlator_config().trunk_branches, vec!["trunk", "release"]);
    }

    #[test]
    fn invalid_lookback_is_rejected() {
        for raw in ["0", "-3", "ten"] {
            let err = Config::from_lookup(lookup(&[("TRACKLINK_DEPLOY_LOOKBACK", raw)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { name: "TRACKLINK_DEPLOY_LOOKBACK", .. }));
        }
    }

    #[test]
    fn separator_only_trunk_list_is_rejected() {
        let err = Config::from_lookup(lookup(&[("TRACKLINK_TRUNK_BRANCHES", ",,")])).unwrap_err();
        assert!(err.to_string().contains("TRACKLINK_TRUNK_BRANCHES"));
    }

    #[test]
    fn agent_accounts_are_read_per_role() {
        let config = Config::from_lookup(lookup(&[
            ("TRACKER_BACKEND_ACCOUNT_ID", "5b10ac8d82e05b22cc7d4ef5"),
            ("TRACKER_QA_ACCOUNT_ID", "  "),
        ]))
        .unwrap();
        assert_eq!(
            config.agent_accounts,
            BTreeMap::from([(AgentKind::Backend, "5b10ac8d82e05b22cc7d4ef5".to_owned())])
        );
        assert_eq!(config.correlator_config().agent_accounts, config.agent_accounts);
        assert_eq!(agent_account_var(AgentKind::Devops), "TRACKER_DEVOPS_ACCOUNT_ID");
    }
}

//! Work item identifier extraction.
//!
//! A work item id is an uppercase project key, a hyphen, and a run of
//! digits (`PROJ-123`). The same substring pattern is used for commit
//! messages, pull request titles and descriptions, and branch names; only
//! the cardinality of the result differs between call sites.
//!
//! Extraction never fails. Text without an id yields an empty list or
//! `None`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unanchored pattern used for searching free text.
static WORK_ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Z]+-[0-9]+").expect("Invalid regex pattern for work item ids")
});

/// Anchored pattern used when a whole string must be exactly one id.
static EXACT_WORK_ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]+-[0-9]+$").expect("Invalid regex pattern for exact work item ids")
});

/// Canonical identifier of a tracked unit of work, e.g. `PROJ-123`.
///
/// Case-sensitive; lowercase project keys never match.
///
/// # Examples
///
/// ```
/// use tracklink::keys::WorkItemId;
///
/// let id: WorkItemId = "PROJ-123".parse().unwrap();
/// assert_eq!(id.project_key(), "PROJ");
/// assert_eq!(id.number(), "123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkItemId(String);

/// Returned when a string is not exactly one work item id.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid work item id '{0}', expected KEY-123")]
pub struct WorkItemIdError(pub String);

impl WorkItemId {
    /// Wraps a substring already known to match the pattern.
    fn from_match(text: &str) -> Self {
        Self(text.to_owned())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the uppercase project key (the part before the hyphen).
    #[must_use]
    pub fn project_key(&self) -> &str {
        self.0.split_once('-').map_or(self.0.as_str(), |(key, _)| key)
    }

    /// Returns the digit run after the hyphen.
    ///
    /// Kept as text: the number has no upper bound beyond what the tracker
    /// accepts, and leading zeros are significant.
    #[must_use]
    pub fn number(&self) -> &str {
        self.0.split_once('-').map_or("", |(_, number)| number)
    }
}

impl FromStr for WorkItemId {
    type Err = WorkItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if EXACT_WORK_ITEM_PATTERN.is_match(s) {
            Ok(Self::from_match(s))
        } else {
            Err(WorkItemIdError(s.to_owned()))
        }
    }
}

impl TryFrom<String> for WorkItemId {
    type Error = WorkItemIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if EXACT_WORK_ITEM_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(WorkItemIdError(value))
        }
    }
}

impl From<WorkItemId> for String {
    fn from(id: WorkItemId) -> Self {
        id.0
    }
}

impl AsRef<str> for WorkItemId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns every non-overlapping id in `text`, left to right.
///
/// Duplicates are kept. A trailing hyphen-digit group is not re-matched:
/// `PROJ-123-456` yields only `PROJ-123`.
#[must_use]
pub fn find_all(text: &str) -> Vec<WorkItemId> {
    WORK_ITEM_PATTERN
        .find_iter(text)
        .map(|m| WorkItemId::from_match(m.as_str()))
        .collect()
}

/// Returns the leftmost id in `text`, if any.
#[must_use]
pub fn find_first(text: &str) -> Option<WorkItemId> {
    WORK_ITEM_PATTERN.find(text).map(|m| WorkItemId::from_match(m.as_str()))
}

/// Returns the id embedded in a branch name such as `feature/PROJ-123-login`.
///
/// The search is unanchored, so conventional prefixes (`feature/`,
/// `bugfix/`) need no special handling. `main` or `feature/add-x` yield
/// `None`.
#[must_use]
pub fn find_from_branch_name(branch_name: &str) -> Option<WorkItemId> {
    find_first(branch_name)
}

/// Drops repeated ids, keeping the first occurrence of each.
#[must_use]
pub fn dedup_preserving_order<I>(ids: I) -> Vec<WorkItemId>
where
    I: IntoIterator<Item = WorkItemId>,
{
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

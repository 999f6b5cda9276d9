//! Git history port used to find work items in recently deployed commits.

/// Provides read access to commit history.
pub trait GitHistory: Send + Sync {
    /// Returns the subject lines of the `count` most recent commits reachable
    /// from `commit`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit is unknown or history cannot be read.
    fn recent_subjects(
        &self,
        commit: &str,
        count: usize,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;
}

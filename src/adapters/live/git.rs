//! Live git adapter using `git` CLI commands.

use std::process::Command;

use crate::ports::git::GitHistory;

/// Live git adapter that shells out to the `git` CLI.
pub struct LiveGitHistory;

/// Builds the `git log` arguments listing `count` subjects up to `commit`.
///
/// `--end-of-options` keeps git from reading the revision as a flag.
fn log_args(commit: &str, count: usize) -> Vec<String> {
    vec![
        "log".to_owned(),
        format!("-{count}"),
        "--format=%s".to_owned(),
        "--end-of-options".to_owned(),
        commit.to_owned(),
    ]
}

impl GitHistory for LiveGitHistory {
    fn recent_subjects(
        &self,
        commit: &str,
        count: usize,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        if commit.is_empty() || commit.starts_with('-') {
            return Err(format!("invalid commit revision '{commit}'").into());
        }
        let output = Command::new("git").args(log_args(commit, count)).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("git log {commit} failed: {stderr}").into());
        }
        let subjects = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect();
        Ok(subjects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_args_limit_and_format() {
        assert_eq!(
            log_args("abc123", 10),
            vec!["log", "-10", "--format=%s", "--end-of-options", "abc123"]
        );
    }

    #[test]
    fn option_shaped_revision_is_rejected_without_running_git() {
        let dir = std::env::temp_dir().join("tracklink_git_option_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("written-by-git.txt");

        let git = LiveGitHistory;
        let err = git.recent_subjects(&format!("--output={}", target.display()), 1).unwrap_err();
        assert!(err.to_string().contains("invalid commit revision"));
        assert!(!target.exists());
        assert!(git.recent_subjects("", 1).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_revision_is_an_error() {
        let git = LiveGitHistory;
        let result = git.recent_subjects("definitely-not-a-revision-0000", 1);
        assert!(result.is_err());
    }
}

use std::process::Command;

use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::{Octocrab, models::RepositoryId};
use tracing::{debug, info};

use crate::types::{Forge, PullRequestTarget};

/// First candidate that holds a non-blank token, trimmed.
///
/// An Actions secret that was never set expands to an empty variable, which
/// must not shadow the remaining sources.
fn first_usable_token<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

/// Resolves a GitHub token, preferring an explicitly configured one.
pub fn get_github_token(configured: Option<&str>) -> Result<String> {
    // Prefer environment variables over gh CLI to avoid subprocess overhead.
    if let Some(token) = first_usable_token([
        configured.map(str::to_string),
        std::env::var("GITHUB_TOKEN").ok(),
        std::env::var("GH_TOKEN").ok(),
    ]) {
        return Ok(token);
    }

    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .context("No GitHub token configured and the gh CLI is not available")?;

    if !output.status.success() {
        anyhow::bail!("Failed to get GitHub token from gh CLI. Please run 'gh auth login' first");
    }

    let token = String::from_utf8(output.stdout)?.trim().to_string();

    if token.is_empty() {
        anyhow::bail!("Empty token returned from gh CLI");
    }

    Ok(token)
}

/// Creates an authenticated GitHub client.
pub fn setup_github_client(configured_token: Option<&str>) -> Result<Octocrab> {
    let token =
        get_github_token(configured_token).context("Failed to obtain GitHub authentication token")?;
    Octocrab::builder()
        .personal_token(token)
        .build()
        .context("Failed to create GitHub client")
}

/// GitHub-backed [`Forge`].
///
/// The client is only built when a comment is delivered, so runs that never
/// post do not need a credential.
#[derive(Debug, Clone, Default)]
pub struct GitHub {
    token: Option<String>,
}

impl GitHub {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl Forge for GitHub {
    async fn create_issue_comment(&self, target: &PullRequestTarget, body: &str) -> Result<()> {
        let octocrab = setup_github_client(self.token.as_deref())?;

        debug!(
            repository_id = target.repository_id,
            pr_number = target.number,
            "Creating issue comment"
        );

        // Addressing the repository by id avoids fetching its metadata.
        let comment = octocrab
            .issues_by_id(RepositoryId(target.repository_id))
            .create_comment(target.number, body)
            .await
            .with_context(|| {
                format!(
                    "GitHub rejected comment on pull request #{} of repository {}",
                    target.number, target.repository_id
                )
            })?;

        info!(url = %comment.html_url, "Posted score comment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_token_wins() {
        let token = get_github_token(Some("  ghp_configured  ")).unwrap();
        assert_eq!(token, "ghp_configured");
    }

    #[test]
    fn test_blank_tokens_fall_through() {
        let token = first_usable_token([
            Some(String::new()),
            Some("   ".to_string()),
            None,
            Some("ghp_fallback\n".to_string()),
        ]);
        assert_eq!(token.as_deref(), Some("ghp_fallback"));
    }

    #[test]
    fn test_no_usable_token() {
        assert_eq!(first_usable_token([Some(String::new()), None]), None);
    }
}

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::PanaError;

/// A score value exactly as pana reported it.
///
/// Integral scores render without a fractional part (`80`) while float
/// scores keep theirs (`80.0`), matching the report text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Score(serde_json::Number);

impl Score {
    pub fn value(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }
}

impl From<u64> for Score {
    fn from(value: u64) -> Self {
        Score(value.into())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One pana suggestion for improving the package score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub score: Score,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeInfo {
    pana_version: String,
}

#[derive(Debug, Deserialize)]
struct Scores {
    health: Score,
    maintenance: Score,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    runtime_info: RuntimeInfo,
    scores: Scores,
    #[serde(default)]
    suggestions: Option<Vec<Suggestion>>,
}

/// Parsed pana score report.
///
/// `suggestions` is `None` only when the report has no `suggestions` key;
/// an explicitly empty list stays `Some(vec![])`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawReport")]
pub struct AnalysisReport {
    pub tool_version: String,
    pub health: Score,
    pub maintenance: Score,
    pub suggestions: Option<Vec<Suggestion>>,
}

impl From<RawReport> for AnalysisReport {
    fn from(raw: RawReport) -> Self {
        AnalysisReport {
            tool_version: raw.runtime_info.pana_version,
            health: raw.scores.health,
            maintenance: raw.scores.maintenance,
            suggestions: raw.suggestions,
        }
    }
}

impl AnalysisReport {
    pub fn from_json(json: &str) -> Result<Self, PanaError> {
        serde_json::from_str(json).map_err(PanaError::MalformedReport)
    }

    pub fn total_score(&self) -> f64 {
        self.health.value() + self.maintenance.value()
    }

    pub fn has_suggestions(&self) -> bool {
        self.suggestions.is_some()
    }
}

/// Captured result of one analysis tool run.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    /// Converts a finished run into a report.
    ///
    /// A non-zero exit code fails before stdout is looked at.
    pub fn into_report(self) -> Result<AnalysisReport, PanaError> {
        if self.exit_code != 0 {
            return Err(PanaError::ToolExecutionFailed {
                code: self.exit_code,
            });
        }
        AnalysisReport::from_json(&self.stdout)
    }
}

/// Whether a comment should be posted, and what it says.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentDecision {
    pub should_post: bool,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventHead {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventPullRequest {
    pub number: u64,
    pub head: EventHead,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRepository {
    pub id: u64,
}

/// The parts of a GitHub Actions event payload this tool reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub pull_request: Option<EventPullRequest>,
    #[serde(default)]
    pub repository: Option<EventRepository>,
}

impl EventPayload {
    pub fn from_json(json: &str) -> Result<Self, PanaError> {
        serde_json::from_str(json).map_err(PanaError::EventPayloadMalformed)
    }

    /// Returns the pull request to comment on, or `None` when the event did
    /// not come from a pull request.
    pub fn pull_request_target(&self) -> Result<Option<PullRequestTarget>, PanaError> {
        let Some(pr) = &self.pull_request else {
            return Ok(None);
        };
        let repository = self
            .repository
            .as_ref()
            .ok_or(PanaError::MissingRepository)?;

        Ok(Some(PullRequestTarget {
            repository_id: repository.id,
            number: pr.number,
            head_sha: pr.head.sha.clone(),
        }))
    }
}

/// Pull request that receives the score comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestTarget {
    pub repository_id: u64,
    pub number: u64,
    pub head_sha: String,
}

/// Terminal state of a single run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The triggering event was not a pull request.
    NotPullRequest,
    /// Scores are perfect and there are no suggestions.
    NothingToReport,
    /// A comment was warranted but only printed.
    DryRun { body: String },
    Posted,
}

/// Source-hosting service that pull request comments are delivered to.
#[async_trait]
pub trait Forge {
    async fn create_issue_comment(&self, target: &PullRequestTarget, body: &str) -> Result<()>;
}

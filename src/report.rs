use crate::types::{AnalysisReport, CommentDecision, Suggestion};

/// Combined health and maintenance score of a package with no problems.
pub const PERFECT_TOTAL: f64 = 200.0;

const SUGGESTIONS_HEADING: &str = "## Suggestions to improve the score:";

/// Decides whether `report` deserves a pull request comment and renders it.
///
/// A comment is warranted when either score is below 100 or the report
/// carries a `suggestions` key. Key presence is what counts, so an empty
/// suggestion list still triggers a comment.
pub fn decide(report: &AnalysisReport, commit_sha: &str) -> CommentDecision {
    let should_post = report.total_score() < PERFECT_TOTAL || report.has_suggestions();

    CommentDecision {
        should_post,
        body: format_comment(report, commit_sha),
    }
}

/// Renders the markdown comment body for `report` at `commit_sha`.
pub fn format_comment(report: &AnalysisReport, commit_sha: &str) -> String {
    let mut body = format!(
        "Package analysis results for commit {commit_sha}:\n\
         (version of pana package: {version})\n\
         \n\
         Health score is {health} / 100.0\n\
         Maintenance score is {maintenance} / 100.0",
        version = report.tool_version,
        health = report.health,
        maintenance = report.maintenance,
    );

    if let Some(suggestions) = &report.suggestions {
        body.push_str("\n\n");
        body.push_str(&format_suggestions(suggestions));
    }

    body.push('\n');
    body
}

fn format_suggestions(suggestions: &[Suggestion]) -> String {
    std::iter::once(SUGGESTIONS_HEADING.to_string())
        .chain(suggestions.iter().map(|suggestion| {
            format!(
                "- **{} ({} points): **{}",
                suggestion.title, suggestion.score, suggestion.description
            )
        }))
        .collect::<Vec<_>>()
        .join("\n\n")
}

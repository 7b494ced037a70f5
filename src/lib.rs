//! pana-scores: package score reporting for pull requests.
//!
//! Runs the pana analysis tool against a Dart package, decides from its
//! health and maintenance scores whether the package needs attention, and
//! comments the results on the pull request that triggered the CI run.

pub mod analyzer;
pub mod cli;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod report;
pub mod types;

pub use analyzer::Analyzer;
pub use cli::{Config, EventSource, parse_args};
pub use error::PanaError;
pub use github::GitHub;
pub use pipeline::run;
pub use report::{decide, format_comment};
pub use types::{
    AnalysisReport, CommentDecision, EventPayload, Forge, InvocationResult, Outcome,
    PullRequestTarget, Score, Suggestion,
};

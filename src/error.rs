use std::{io, path::PathBuf};

use thiserror::Error;

/// Fatal conditions raised while producing and delivering a score report.
///
/// None of these are retried; each one ends the run.
#[derive(Debug, Error)]
pub enum PanaError {
    #[error("failed to launch analysis tool '{program}'")]
    ToolSpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read analysis tool output")]
    ToolOutput(#[source] io::Error),

    #[error("Process completed with exit code {code}")]
    ToolExecutionFailed { code: i32 },

    #[error("analysis tool produced a malformed report")]
    MalformedReport(#[source] serde_json::Error),

    #[error("no event payload provided (set EVENT_PAYLOAD or GITHUB_EVENT_PATH)")]
    EventPayloadMissing,

    #[error("failed to read event payload from '{}'", .path.display())]
    EventPayloadUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("event payload is malformed")]
    EventPayloadMalformed(#[source] serde_json::Error),

    #[error("pull request event has no repository id")]
    MissingRepository,

    #[error("failed to post comment on pull request #{number}: {cause:#}")]
    DeliveryFailed { number: u64, cause: anyhow::Error },
}

impl PanaError {
    /// Process exit code to use when this error ends the run.
    ///
    /// A failing tool hands its own exit status through; everything else
    /// exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            PanaError::ToolExecutionFailed { code } if (1..=255).contains(code) => *code,
            _ => 1,
        }
    }
}

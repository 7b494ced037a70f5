use std::io::Write;

use tracing::{debug, info};

use crate::{
    cli::{Config, EventSource},
    error::PanaError,
    report::decide,
    types::{EventPayload, Forge, Outcome},
};

/// Reads the triggering event from wherever the configuration points.
pub async fn load_event(source: &EventSource) -> Result<EventPayload, PanaError> {
    match source {
        EventSource::Inline(json) => EventPayload::from_json(json),
        EventSource::File(path) => {
            let json = tokio::fs::read_to_string(path).await.map_err(|source| {
                PanaError::EventPayloadUnreadable {
                    path: path.clone(),
                    source,
                }
            })?;
            EventPayload::from_json(&json)
        }
        EventSource::Missing => Err(PanaError::EventPayloadMissing),
    }
}

/// Analyses the configured package and, when the scores warrant it,
/// comments on the pull request that triggered the run.
///
/// The event payload is checked before the tool starts, so a missing or
/// malformed payload fails without waiting for the analysis. The tool still
/// runs for events that are not pull requests. Tool output is echoed to
/// `echo` while the tool runs. Every failure is returned as-is; nothing is
/// retried.
pub async fn run<F, W>(config: &Config, forge: &F, echo: &mut W) -> Result<Outcome, PanaError>
where
    F: Forge + Sync,
    W: Write,
{
    let target = load_event(&config.event).await?.pull_request_target()?;

    let report = config
        .analyzer
        .invoke(&config.package, echo)
        .await?
        .into_report()?;
    debug!(
        tool_version = %report.tool_version,
        health = %report.health,
        maintenance = %report.maintenance,
        has_suggestions = report.has_suggestions(),
        "Parsed analysis report"
    );

    let Some(target) = target else {
        info!("Event is not a pull request; not commenting");
        return Ok(Outcome::NotPullRequest);
    };

    let decision = decide(&report, &target.head_sha);
    if !decision.should_post {
        info!(pr_number = target.number, "Scores are perfect; not commenting");
        return Ok(Outcome::NothingToReport);
    }

    if config.dry_run {
        info!(pr_number = target.number, "Dry run; comment not posted");
        return Ok(Outcome::DryRun {
            body: decision.body,
        });
    }

    forge
        .create_issue_comment(&target, &decision.body)
        .await
        .map_err(|cause| PanaError::DeliveryFailed {
            number: target.number,
            cause,
        })?;

    Ok(Outcome::Posted)
}

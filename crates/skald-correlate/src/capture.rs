use serde::Deserialize;
use skald_core::ids::new_event_id;
use skald_core::redact::redact_event;
use skald_core::{CommitInfo, EventSource, PipelineError, RawEvent, SCHEMA_VERSION};
use time::OffsetDateTime;

/// The input event contract from watchers, one JSON object per capture.
#[derive(Debug, Deserialize)]
struct InputEvent {
    tool: String,
    timestamp: String,
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    files: Option<Vec<String>>,
    #[serde(default)]
    commit: Option<InputCommit>,
}

#[derive(Debug, Deserialize)]
struct InputCommit {
    sha: String,
    message: String,
    #[serde(default)]
    files: Vec<String>,
}

/// Parse one watcher JSON payload into a redacted `RawEvent`.
///
/// This is the capture boundary: redaction runs here, unconditionally, on
/// every code path, before the event can be buffered or persisted. A
/// malformed payload is a `CaptureError` — the caller skips it and the
/// watcher keeps running.
pub fn parse_input_event(json: &str) -> Result<RawEvent, PipelineError> {
    let input: InputEvent =
        serde_json::from_str(json).map_err(|e| PipelineError::Capture(e.to_string()))?;

    let ts = OffsetDateTime::parse(
        &input.timestamp,
        &time::format_description::well_known::Rfc3339,
    )
    .map_err(|e| PipelineError::Capture(format!("bad timestamp {:?}: {e}", input.timestamp)))?;

    let source = if input.commit.is_some() {
        EventSource::Vcs
    } else if input.prompt.is_some() {
        EventSource::Tool
    } else if input.files.as_ref().is_some_and(|f| !f.is_empty()) {
        EventSource::File
    } else {
        return Err(PipelineError::Capture(
            "event carries no prompt, files, or commit".into(),
        ));
    };

    let mut event = RawEvent {
        event_id: new_event_id(),
        ts,
        source,
        tool: input.tool,
        session: input.session,
        author: input.author,
        prompt: input.prompt,
        files: input.files.unwrap_or_default(),
        commit: input.commit.map(|c| CommitInfo {
            sha: c.sha,
            message: c.message,
            files: c.files,
            ts,
        }),
        schema_version: SCHEMA_VERSION,
    };
    redact_event(&mut event);
    Ok(event)
}

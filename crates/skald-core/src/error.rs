use std::path::PathBuf;

/// Pipeline error taxonomy. Capture and inference failures are recoverable
/// by design; write conflicts and checksum mismatches carry enough context
/// for the caller to decide between retry, rebuild, and surfacing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A malformed raw event or log line. The offending line is skipped and
    /// processing continues.
    #[error("malformed capture record: {0}")]
    Capture(String),

    /// The pluggable inference backend timed out or failed. Callers fall
    /// back to the rule-based classification with a confidence discount.
    #[error("inference backend failed: {0}")]
    Inference(String),

    /// A concurrent writer held the store lock past the retry budget.
    /// Fatal for this single write only; prior state is intact.
    #[error("write conflict on {path} after {attempts} attempts")]
    WriteConflict { path: PathBuf, attempts: u32 },

    /// A persisted snapshot failed checksum verification. The file is
    /// discarded and rebuilt from the append-only sources.
    #[error("snapshot checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = PipelineError::WriteConflict {
            path: PathBuf::from("/tmp/context.lock"),
            attempts: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("context.lock"));
        assert!(msg.contains("5"));

        let err = PipelineError::ChecksumMismatch {
            stored: "aaa".into(),
            computed: "bbb".into(),
        };
        assert!(err.to_string().contains("aaa"));
    }
}

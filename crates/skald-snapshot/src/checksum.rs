use skald_core::config::PipelineConfig;
use skald_core::hash::canonical_sha256;
use skald_core::{PipelineError, Snapshot};
use skald_store::{locked_write_atomic, SkaldPaths};

/// Checksum over the canonical serialization of every content section.
/// The checksum field itself and `generated_at` are excluded, so the value
/// changes iff the content changes.
pub fn compute_checksum(snapshot: &Snapshot) -> String {
    let mut value = match serde_json::to_value(snapshot) {
        Ok(v) => v,
        Err(_) => return String::new(),
    };
    if let Some(obj) = value.as_object_mut() {
        obj.remove("checksum");
        obj.remove("generated_at");
    }
    canonical_sha256(&value)
}

/// Stamp the snapshot with its content checksum.
pub fn finalize(snapshot: &mut Snapshot) {
    snapshot.checksum = compute_checksum(snapshot);
}

/// Verify a parsed snapshot against its stored checksum.
pub fn verify(snapshot: &Snapshot) -> Result<(), PipelineError> {
    let computed = compute_checksum(snapshot);
    if computed != snapshot.checksum {
        return Err(PipelineError::ChecksumMismatch {
            stored: snapshot.checksum.clone(),
            computed,
        });
    }
    Ok(())
}

/// Persist `context.lock` under the scoped lock with an atomic rename.
pub fn save_snapshot(
    paths: &SkaldPaths,
    snapshot: &Snapshot,
    config: &PipelineConfig,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    locked_write_atomic(
        &paths.lock_file,
        &paths.snapshot_file,
        json.as_bytes(),
        config.write_retries,
        config.backoff_base_ms,
    )
}

/// Load and verify `context.lock`. A missing file returns `Ok(None)`; a
/// corrupt or tampered file is discarded — the caller rebuilds from the
/// append-only sources and never serves the bad copy.
pub fn load_snapshot(paths: &SkaldPaths) -> anyhow::Result<Option<Snapshot>> {
    let content = match std::fs::read_to_string(&paths.snapshot_file) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let snapshot: Snapshot = match serde_json::from_str(&content) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "snapshot unparseable, discarding");
            let _ = std::fs::remove_file(&paths.snapshot_file);
            return Ok(None);
        }
    };
    match verify(&snapshot) {
        Ok(()) => Ok(Some(snapshot)),
        Err(e) => {
            tracing::warn!(error = %e, "snapshot checksum mismatch, discarding");
            let _ = std::fs::remove_file(&paths.snapshot_file);
            Ok(None)
        }
    }
}

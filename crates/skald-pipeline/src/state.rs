use serde::{Deserialize, Serialize};
use skald_store::SkaldPaths;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Per-log-file read offsets for batch processing. Everything else the
/// pipeline needs (the ADR counter, the orphan set, recent concepts) is
/// reconstructed from the append-only logs; the cursors only remember how
/// far batches have read, and losing them costs a re-read, not data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub offsets: BTreeMap<String, u64>,
}

fn cursor_path(paths: &SkaldPaths) -> PathBuf {
    paths.skald_dir.join("state").join("cursors.json")
}

impl Cursors {
    pub fn load(paths: &SkaldPaths) -> Self {
        let path = cursor_path(paths);
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, paths: &SkaldPaths) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        skald_store::write_atomic(&cursor_path(paths), json.as_bytes())
    }

    /// Offset for a log file, guarding against truncation: if the file
    /// shrank below the stored offset, restart from zero.
    pub fn offset_for(&self, file_name: &str, file_len: u64) -> u64 {
        let stored = self.offsets.get(file_name).copied().unwrap_or(0);
        if stored > file_len {
            tracing::warn!(file = file_name, stored, file_len, "log shrank, re-reading from start");
            0
        } else {
            stored
        }
    }

    pub fn advance(&mut self, file_name: &str, offset: u64) {
        self.offsets.insert(file_name.to_string(), offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SkaldPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();

        let mut cursors = Cursors::default();
        cursors.advance("2026-03-01.ada.s1.jsonl", 512);
        cursors.save(&paths).unwrap();

        let loaded = Cursors::load(&paths);
        assert_eq!(loaded.offset_for("2026-03-01.ada.s1.jsonl", 1024), 512);
    }

    #[test]
    fn missing_file_means_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SkaldPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        let cursors = Cursors::load(&paths);
        assert_eq!(cursors.offset_for("anything.jsonl", 100), 0);
    }

    #[test]
    fn truncation_resets_offset() {
        let mut cursors = Cursors::default();
        cursors.advance("f.jsonl", 900);
        assert_eq!(cursors.offset_for("f.jsonl", 300), 0);
        assert_eq!(cursors.offset_for("f.jsonl", 900), 900);
    }
}

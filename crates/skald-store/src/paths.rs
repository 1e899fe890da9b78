use std::path::{Path, PathBuf};

/// All well-known paths under `.skald/`.
#[derive(Debug, Clone)]
pub struct SkaldPaths {
    pub root: PathBuf,
    pub skald_dir: PathBuf,
    pub config_json: PathBuf,
    pub project_json: PathBuf,
    pub paused_file: PathBuf,
    pub lock_file: PathBuf,
    pub events_dir: PathBuf,
    pub intents_dir: PathBuf,
    pub decisions_dir: PathBuf,
    pub links_jsonl: PathBuf,
    pub snapshot_file: PathBuf,
    pub archive_dir: PathBuf,
    pub archive_warm_dir: PathBuf,
    pub archive_cold_dir: PathBuf,
    pub archive_manifest: PathBuf,
}

impl SkaldPaths {
    /// Derive all paths from a repo root. Pure computation, no I/O.
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let skald_dir = root.join(".skald");
        let archive_dir = skald_dir.join("archive");
        Self {
            config_json: skald_dir.join("config.json"),
            project_json: skald_dir.join("project.json"),
            paused_file: skald_dir.join("PAUSED"),
            lock_file: skald_dir.join("LOCK"),
            events_dir: skald_dir.join("events"),
            intents_dir: skald_dir.join("intents"),
            decisions_dir: skald_dir.join("decisions"),
            links_jsonl: skald_dir.join("links").join("links.jsonl"),
            snapshot_file: skald_dir.join("context.lock"),
            archive_warm_dir: archive_dir.join("warm"),
            archive_cold_dir: archive_dir.join("cold"),
            archive_manifest: archive_dir.join("manifest.jsonl"),
            archive_dir,
            skald_dir,
            root,
        }
    }

    /// Create all required directories. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        for dir in [
            &self.events_dir,
            &self.intents_dir,
            &self.decisions_dir,
            &self.archive_warm_dir,
            &self.archive_cold_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(links_dir) = self.links_jsonl.parent() {
            std::fs::create_dir_all(links_dir)?;
        }
        Ok(())
    }

    /// Check whether `.skald/` exists.
    pub fn is_initialized(&self) -> bool {
        self.skald_dir.is_dir()
    }

    /// Capture pause flag: present means new events are refused.
    pub fn is_paused(&self) -> bool {
        self.paused_file.exists()
    }

    /// Walk up from `start` looking for a directory containing `.skald/`.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(".skald").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_builds_expected_paths() {
        let p = SkaldPaths::discover("/tmp/repo");
        assert_eq!(p.skald_dir, PathBuf::from("/tmp/repo/.skald"));
        assert_eq!(p.events_dir, PathBuf::from("/tmp/repo/.skald/events"));
        assert_eq!(p.intents_dir, PathBuf::from("/tmp/repo/.skald/intents"));
        assert_eq!(
            p.snapshot_file,
            PathBuf::from("/tmp/repo/.skald/context.lock")
        );
        assert_eq!(
            p.links_jsonl,
            PathBuf::from("/tmp/repo/.skald/links/links.jsonl")
        );
        assert_eq!(
            p.archive_warm_dir,
            PathBuf::from("/tmp/repo/.skald/archive/warm")
        );
        assert_eq!(p.lock_file, PathBuf::from("/tmp/repo/.skald/LOCK"));
    }

    #[test]
    fn ensure_layout_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let p = SkaldPaths::discover(tmp.path());
        p.ensure_layout().unwrap();
        p.ensure_layout().unwrap();
        assert!(p.events_dir.is_dir());
        assert!(p.intents_dir.is_dir());
        assert!(p.decisions_dir.is_dir());
        assert!(p.archive_warm_dir.is_dir());
        assert!(p.archive_cold_dir.is_dir());
        assert!(p.links_jsonl.parent().unwrap().is_dir());
        assert!(p.is_initialized());
    }

    #[test]
    fn find_root_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        let p = SkaldPaths::discover(tmp.path());
        p.ensure_layout().unwrap();
        let nested = tmp.path().join("src").join("auth");
        std::fs::create_dir_all(&nested).unwrap();
        let found = SkaldPaths::find_root(&nested).unwrap();
        assert_eq!(found, tmp.path());
    }

    #[test]
    fn paused_flag_reflects_file_presence() {
        let tmp = tempfile::tempdir().unwrap();
        let p = SkaldPaths::discover(tmp.path());
        p.ensure_layout().unwrap();
        assert!(!p.is_paused());
        std::fs::write(&p.paused_file, b"").unwrap();
        assert!(p.is_paused());
    }
}

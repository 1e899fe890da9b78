pub mod log;
pub mod paths;

pub use paths::SkaldPaths;

use fs2::FileExt;
use rand::Rng;
use skald_core::PipelineError;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Deterministic project id from the repo root path: blake3 of the
/// normalized path, first 32 hex chars.
pub fn project_id(repo_root: &Path) -> String {
    let normalized = normalize_path(repo_root);
    let hash = blake3::hash(normalized.as_bytes());
    hash.to_hex()[..32].to_string()
}

fn normalize_path(p: &Path) -> String {
    let abs = p
        .canonicalize()
        .unwrap_or_else(|_| p.to_path_buf())
        .to_string_lossy()
        .to_string();
    #[cfg(windows)]
    let abs = abs.to_lowercase();
    abs.replace('\\', "/")
}

/// Per-user fallback root for machine-wide state: `~/.skald/`.
pub fn user_store_root() -> std::path::PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("skald")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".skald")
    } else {
        std::path::PathBuf::from(".skald-store")
    }
}

/// Atomic write: temp file in the same directory, flush, then rename.
/// Readers never observe a partially written file.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// File-based exclusive lock guard, released on drop.
pub struct LockGuard {
    _file: fs::File,
}

/// Acquire an exclusive file lock, blocking. Creates the lock file if needed.
pub fn lock_file(path: &Path) -> anyhow::Result<LockGuard> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.lock_exclusive()?;
    Ok(LockGuard { _file: file })
}

/// Try to acquire the lock without blocking.
pub fn try_lock_file(path: &Path) -> anyhow::Result<Option<LockGuard>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(LockGuard { _file: file })),
        Err(_) => Ok(None),
    }
}

/// Write `data` to `target` under the exclusive scoped lock, with bounded
/// exponential backoff against concurrent writers. Exhausting the retry
/// budget surfaces a `WriteConflict` fatal to this single write only;
/// nothing already persisted is touched.
pub fn locked_write_atomic(
    lock_path: &Path,
    target: &Path,
    data: &[u8],
    retries: u32,
    backoff_base_ms: u64,
) -> anyhow::Result<()> {
    for attempt in 0..=retries {
        match try_lock_file(lock_path)? {
            Some(guard) => {
                write_atomic(target, data)?;
                drop(guard);
                return Ok(());
            }
            None => {
                if attempt == retries {
                    break;
                }
                let backoff = backoff_base_ms.saturating_mul(1 << attempt.min(10));
                let jitter = rand::thread_rng().gen_range(0..=backoff_base_ms);
                tracing::debug!(
                    target = %target.display(),
                    attempt,
                    backoff_ms = backoff + jitter,
                    "store locked, backing off"
                );
                std::thread::sleep(Duration::from_millis(backoff + jitter));
            }
        }
    }
    Err(PipelineError::WriteConflict {
        path: target.to_path_buf(),
        attempts: retries + 1,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_is_deterministic_hex() {
        let a = project_id(Path::new("/tmp/some-repo"));
        let b = project_id(Path::new("/tmp/some-repo"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, project_id(Path::new("/tmp/other-repo")));
    }

    #[test]
    fn write_atomic_replaces_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn lock_acquire_and_release() {
        let tmp = tempfile::tempdir().unwrap();
        let lock_path = tmp.path().join("LOCK");
        let guard = lock_file(&lock_path).unwrap();
        assert!(try_lock_file(&lock_path).unwrap().is_none());
        drop(guard);
        assert!(try_lock_file(&lock_path).unwrap().is_some());
    }

    #[test]
    fn locked_write_succeeds_when_uncontended() {
        let tmp = tempfile::tempdir().unwrap();
        let lock_path = tmp.path().join("LOCK");
        let target = tmp.path().join("context.lock");
        locked_write_atomic(&lock_path, &target, b"{}", 3, 1).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
    }

    #[test]
    fn locked_write_conflict_after_retry_budget() {
        let tmp = tempfile::tempdir().unwrap();
        let lock_path = tmp.path().join("LOCK");
        let target = tmp.path().join("context.lock");
        // Hold the lock so every attempt fails.
        let _guard = lock_file(&lock_path).unwrap();
        let err = locked_write_atomic(&lock_path, &target, b"{}", 2, 1).unwrap_err();
        let conflict = err.downcast_ref::<PipelineError>().unwrap();
        assert!(matches!(
            conflict,
            PipelineError::WriteConflict { attempts: 3, .. }
        ));
        // Prior state intact: target never appeared.
        assert!(!target.exists());
    }
}

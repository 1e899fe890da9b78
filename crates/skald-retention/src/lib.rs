use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use skald_core::config::PipelineConfig;
use skald_core::ids::format_rfc3339;
use skald_core::Interaction;
use skald_store::log::{event_log_files, intent_log_files, log_file_date, resolve_latest};
use skald_store::SkaldPaths;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use time::{Date, Duration, OffsetDateTime};

/// What one archival pass moved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ArchiveStats {
    pub moved_count: u64,
    pub bytes_reclaimed: u64,
}

/// Which tier a record moved between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierMove {
    HotToWarm,
    WarmToCold,
}

/// Append-only audit record of an archival move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub moved_at: String,
    pub tier: TierMove,
    pub source: String,
    pub target: String,
    pub records: u64,
    pub bytes: u64,
}

/// Pointer left behind when a warm batch goes cold. The batch content
/// itself lives outside the store; rebuilds treat it as unavailable and
/// excluded, not as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColdRef {
    pub batch: String,
    pub bytes: u64,
    pub moved_at: String,
    pub location: String,
}

/// Tier records older than the configured horizons. Per-session hot files
/// past the hot horizon merge into monthly gzip batches; warm batches past
/// the warm horizon are replaced by a reference pointer. Never touches
/// DecisionRecords or the snapshot, and never deletes history outright.
pub fn archive(
    paths: &SkaldPaths,
    now: OffsetDateTime,
    config: &PipelineConfig,
) -> anyhow::Result<ArchiveStats> {
    let mut stats = ArchiveStats::default();
    let hot_cutoff = (now - Duration::days(config.hot_days)).date();
    let warm_cutoff = (now - Duration::days(config.warm_days)).date();

    for (prefix, files) in [
        ("intents", intent_log_files(paths)),
        ("events", event_log_files(paths)),
    ] {
        for file in files {
            let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(date) = log_file_date(name) else {
                tracing::warn!(file = %file.display(), "log file without parseable date, leaving in place");
                continue;
            };
            if date >= hot_cutoff {
                continue;
            }
            stats_add(&mut stats, warm_batch(paths, &file, prefix, date, now)?);
        }
    }

    stats_add(&mut stats, freeze_old_batches(paths, warm_cutoff, now)?);
    Ok(stats)
}

fn stats_add(total: &mut ArchiveStats, part: ArchiveStats) {
    total.moved_count += part.moved_count;
    total.bytes_reclaimed += part.bytes_reclaimed;
}

fn warm_batch_path(paths: &SkaldPaths, prefix: &str, date: Date) -> PathBuf {
    paths
        .archive_warm_dir
        .join(format!("{prefix}-{:04}-{:02}.jsonl.gz", date.year(), date.month() as u8))
}

/// Merge one hot file into its monthly warm batch. Each pass appends a new
/// gzip member, which `MultiGzDecoder` reads back as one stream.
fn warm_batch(
    paths: &SkaldPaths,
    file: &Path,
    prefix: &str,
    date: Date,
    now: OffsetDateTime,
) -> anyhow::Result<ArchiveStats> {
    let content = std::fs::read(file)?;
    let bytes = content.len() as u64;
    let records = content.iter().filter(|&&b| b == b'\n').count() as u64;

    let batch = warm_batch_path(paths, prefix, date);
    if let Some(parent) = batch.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let out = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&batch)?;
    let mut encoder = GzEncoder::new(out, Compression::default());
    encoder.write_all(&content)?;
    encoder.finish()?;

    std::fs::remove_file(file)?;

    append_manifest(
        paths,
        &ArchiveEntry {
            moved_at: format_rfc3339(now),
            tier: TierMove::HotToWarm,
            source: file.display().to_string(),
            target: batch.display().to_string(),
            records,
            bytes,
        },
    )?;

    Ok(ArchiveStats {
        moved_count: records,
        bytes_reclaimed: bytes,
    })
}

/// Replace warm batches older than the warm horizon with cold reference
/// pointers.
fn freeze_old_batches(
    paths: &SkaldPaths,
    warm_cutoff: Date,
    now: OffsetDateTime,
) -> anyhow::Result<ArchiveStats> {
    let mut stats = ArchiveStats::default();
    let entries = match std::fs::read_dir(&paths.archive_warm_dir) {
        Ok(e) => e,
        Err(_) => return Ok(stats),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(month) = batch_month(name) else {
            continue;
        };
        // A batch goes cold once its whole month is past the horizon.
        if month_end(month) >= warm_cutoff {
            continue;
        }

        let bytes = std::fs::metadata(&path)?.len();
        let cold_ref = ColdRef {
            batch: name.to_string(),
            bytes,
            moved_at: format_rfc3339(now),
            location: "external".to_string(),
        };
        let ref_path = paths
            .archive_cold_dir
            .join(format!("{}.ref", name.trim_end_matches(".jsonl.gz")));
        skald_store::write_atomic(&ref_path, serde_json::to_string_pretty(&cold_ref)?.as_bytes())?;
        std::fs::remove_file(&path)?;

        append_manifest(
            paths,
            &ArchiveEntry {
                moved_at: format_rfc3339(now),
                tier: TierMove::WarmToCold,
                source: path.display().to_string(),
                target: ref_path.display().to_string(),
                records: 0,
                bytes,
            },
        )?;
        stats.moved_count += 1;
        stats.bytes_reclaimed += bytes;
    }
    Ok(stats)
}

/// Parse `intents-2026-03.jsonl.gz` → first day of that month.
fn batch_month(name: &str) -> Option<Date> {
    let stem = name.strip_suffix(".jsonl.gz")?;
    let mut parts = stem.rsplitn(3, '-');
    let month: u8 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    Date::from_calendar_date(year, time::Month::try_from(month).ok()?, 1).ok()
}

fn month_end(first_day: Date) -> Date {
    let month = first_day.month();
    let year = first_day.year();
    let last = time::util::days_in_year_month(year, month);
    Date::from_calendar_date(year, month, last).unwrap_or(first_day)
}

fn append_manifest(paths: &SkaldPaths, entry: &ArchiveEntry) -> anyhow::Result<()> {
    if let Some(parent) = paths.archive_manifest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.archive_manifest)?;
    writeln!(file, "{}", serde_json::to_string(entry)?)?;
    Ok(())
}

/// Read the archive manifest, oldest first.
pub fn read_manifest(paths: &SkaldPaths) -> Vec<ArchiveEntry> {
    let content = match std::fs::read_to_string(&paths.archive_manifest) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect()
}

/// Interactions from the warm tier, for full rebuilds. Cold batches are
/// skipped — unavailable, not an error.
pub fn load_warm_interactions(paths: &SkaldPaths) -> Vec<Interaction> {
    let entries = match std::fs::read_dir(&paths.archive_warm_dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };
    let mut records = Vec::new();
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("intents-") && n.ends_with(".jsonl.gz"))
        })
        .collect();
    files.sort();

    for file in files {
        let Ok(raw) = std::fs::File::open(&file) else {
            continue;
        };
        let mut decoder = MultiGzDecoder::new(raw);
        let mut content = String::new();
        if decoder.read_to_string(&mut content).is_err() {
            tracing::warn!(file = %file.display(), "unreadable warm batch, skipping");
            continue;
        }
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Interaction>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "skipping malformed warm line");
                }
            }
        }
    }
    resolve_latest(records)
}

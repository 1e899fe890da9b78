use crate::paths::SkaldPaths;
use skald_core::{Interaction, RawEvent};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::{Date, OffsetDateTime};

/// One log file per (date, author, session): concurrent writers never share
/// a file, so appends need no cross-session lock.
pub fn log_file_name(ts: OffsetDateTime, author: Option<&str>, session: Option<&str>) -> String {
    let date = ts.date();
    format!(
        "{:04}-{:02}-{:02}.{}.{}.jsonl",
        date.year(),
        date.month() as u8,
        date.day(),
        sanitize(author.unwrap_or("anon")),
        sanitize(session.unwrap_or("solo")),
    )
}

fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    if cleaned.is_empty() {
        "anon".to_string()
    } else {
        cleaned
    }
}

/// Parse the date component back out of a log file name.
pub fn log_file_date(file_name: &str) -> Option<Date> {
    let date_part = file_name.split('.').next()?;
    let mut it = date_part.splitn(3, '-');
    let year: i32 = it.next()?.parse().ok()?;
    let month: u8 = it.next()?.parse().ok()?;
    let day: u8 = it.next()?.parse().ok()?;
    Date::from_calendar_date(year, time::Month::try_from(month).ok()?, day).ok()
}

fn append_jsonl(path: &Path, json: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{json}")?;
    Ok(())
}

/// Append a raw event to its (date, author, session) log. Append-only.
pub fn append_raw_event(paths: &SkaldPaths, event: &RawEvent) -> anyhow::Result<()> {
    let name = log_file_name(event.ts, event.author.as_deref(), event.session.as_deref());
    append_jsonl(&paths.events_dir.join(name), &serde_json::to_string(event)?)
}

/// Append an interaction to its (date, author, session) log.
///
/// The log is append-only; attaching an intent or commit later re-appends
/// the record under the same id, and readers resolve to the last version.
pub fn append_interaction(paths: &SkaldPaths, interaction: &Interaction) -> anyhow::Result<()> {
    let name = log_file_name(
        interaction.ts,
        interaction.author.as_deref(),
        interaction.session.as_deref(),
    );
    append_jsonl(
        &paths.intents_dir.join(name),
        &serde_json::to_string(interaction)?,
    )
}

fn jsonl_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("jsonl"))
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// List hot-tier intent log files, oldest first.
pub fn intent_log_files(paths: &SkaldPaths) -> Vec<PathBuf> {
    jsonl_files(&paths.intents_dir)
}

/// List hot-tier event log files, oldest first.
pub fn event_log_files(paths: &SkaldPaths) -> Vec<PathBuf> {
    jsonl_files(&paths.events_dir)
}

fn parse_lines<T: serde::de::DeserializeOwned>(path: &Path, out: &mut Vec<T>) {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "unreadable log file, skipping");
            return;
        }
    };
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => out.push(record),
            Err(e) => {
                // Malformed line: skip it, keep the rest of the file.
                tracing::warn!(file = %path.display(), error = %e, "skipping malformed log line");
            }
        }
    }
}

/// Read every raw event in the hot tier, in file order.
pub fn load_raw_events(paths: &SkaldPaths) -> Vec<RawEvent> {
    let mut events = Vec::new();
    for file in event_log_files(paths) {
        parse_lines(&file, &mut events);
    }
    events
}

/// Read every interaction in the hot tier, resolving re-appended versions
/// to the latest line per id, ordered by timestamp.
pub fn load_interactions(paths: &SkaldPaths) -> Vec<Interaction> {
    let mut raw = Vec::new();
    for file in intent_log_files(paths) {
        parse_lines::<Interaction>(&file, &mut raw);
    }
    resolve_latest(raw)
}

/// Same resolution over an arbitrary record stream (used for warm-tier
/// batches during rebuilds).
pub fn resolve_latest(records: Vec<Interaction>) -> Vec<Interaction> {
    let mut by_id: BTreeMap<String, Interaction> = BTreeMap::new();
    for record in records {
        by_id.insert(record.id.clone(), record);
    }
    let mut out: Vec<Interaction> = by_id.into_values().collect();
    out.sort_by_key(|i| i.ts);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_core::ids::{new_interaction_id, now_utc};
    use std::collections::BTreeSet;
    use time::macros::datetime;

    fn interaction(prompt: &str) -> Interaction {
        Interaction {
            id: new_interaction_id(),
            ts: now_utc(),
            tool: "claude-code".into(),
            session: Some("s1".into()),
            author: Some("ada".into()),
            prompt: prompt.into(),
            files: BTreeSet::new(),
            diff_hash: None,
            intent: None,
            commit: None,
            commit_msg: None,
            adr_generated: false,
            schema_version: skald_core::SCHEMA_VERSION,
        }
    }

    #[test]
    fn file_name_encodes_date_author_session() {
        let name = log_file_name(
            datetime!(2026-03-05 10:00:00 UTC),
            Some("ada"),
            Some("sess/01"),
        );
        assert_eq!(name, "2026-03-05.ada.sess-01.jsonl");
        assert_eq!(
            log_file_date(&name).unwrap(),
            datetime!(2026-03-05 10:00:00 UTC).date()
        );
    }

    #[test]
    fn file_name_defaults_for_missing_parts() {
        let name = log_file_name(datetime!(2026-03-05 10:00:00 UTC), None, None);
        assert_eq!(name, "2026-03-05.anon.solo.jsonl");
    }

    #[test]
    fn append_and_load_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SkaldPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();

        let a = interaction("first");
        let b = interaction("second");
        append_interaction(&paths, &a).unwrap();
        append_interaction(&paths, &b).unwrap();

        let loaded = load_interactions(&paths);
        assert_eq!(loaded.len(), 2);
        let prompts: Vec<&str> = loaded.iter().map(|i| i.prompt.as_str()).collect();
        assert!(prompts.contains(&"first"));
        assert!(prompts.contains(&"second"));
    }

    #[test]
    fn reappended_record_resolves_to_latest() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SkaldPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();

        let mut it = interaction("add caching");
        append_interaction(&paths, &it).unwrap();
        it.commit = Some("abc123".into());
        append_interaction(&paths, &it).unwrap();

        let loaded = load_interactions(&paths);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].commit.as_deref(), Some("abc123"));
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SkaldPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();

        let it = interaction("good record");
        append_interaction(&paths, &it).unwrap();

        // Corrupt the file with a bad line between good ones.
        let file = intent_log_files(&paths).pop().unwrap();
        let mut content = std::fs::read_to_string(&file).unwrap();
        content.push_str("{not json}\n");
        std::fs::write(&file, content).unwrap();
        append_interaction(&paths, &interaction("after corruption")).unwrap();

        let loaded = load_interactions(&paths);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn interactions_sorted_by_timestamp() {
        let mut older = interaction("older");
        older.ts = datetime!(2026-01-01 00:00:00 UTC);
        let mut newer = interaction("newer");
        newer.ts = datetime!(2026-02-01 00:00:00 UTC);

        let resolved = resolve_latest(vec![newer.clone(), older.clone()]);
        assert_eq!(resolved[0].prompt, "older");
        assert_eq!(resolved[1].prompt, "newer");
    }
}

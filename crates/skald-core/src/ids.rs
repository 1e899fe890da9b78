use time::OffsetDateTime;

/// New raw event id: `evt_<ulid>`.
pub fn new_event_id() -> String {
    format!("evt_{}", ulid::Ulid::new().to_string().to_lowercase())
}

/// New interaction id: `int_<ulid>`.
pub fn new_interaction_id() -> String {
    format!("int_{}", ulid::Ulid::new().to_string().to_lowercase())
}

/// Current UTC time.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Format a timestamp as RFC-3339.
pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&time::format_description::well_known::Rfc3339)
        .expect("RFC3339 formatting should not fail")
}

use skald_core::tokens::{estimate_tokens, token_set};
use skald_core::{DecisionRecord, Interaction, Snapshot};

/// Render a snapshot as markdown for a downstream agent, truncated to
/// `max_tokens`. Sections appear in fixed priority order; whole entries are
/// dropped from the tail when the budget runs out.
pub fn render_context(snapshot: &Snapshot, max_tokens: usize) -> String {
    let mut out = String::new();
    let fits = |out: &str, section: &str, max: usize| {
        estimate_tokens(out) + estimate_tokens(section) <= max
    };

    out.push_str(&format!(
        "# {} — semantic snapshot\n\ngenerated: {}\nchecksum: {}\n\n",
        snapshot.project.name,
        snapshot
            .generated_at
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        &snapshot.checksum[..snapshot.checksum.len().min(12)],
    ));

    if !snapshot.stack.is_empty() {
        out.push_str(&format!("stack: {}\n\n", snapshot.stack.join(", ")));
    }

    if !snapshot.constraints.is_empty() {
        out.push_str("## Constraints\n\n");
        for c in &snapshot.constraints {
            let line = format!("- {c}\n");
            if !fits(&out, &line, max_tokens) {
                break;
            }
            out.push_str(&line);
        }
        out.push('\n');
    }

    if !snapshot.decisions_index.is_empty() {
        out.push_str("## Decisions\n\n");
        for d in &snapshot.decisions_index {
            let line = format!(
                "- {} {} — {} [{}]\n",
                d.id,
                d.title,
                d.summary,
                d.triggers.join(", ")
            );
            if !fits(&out, &line, max_tokens) {
                break;
            }
            out.push_str(&line);
        }
        out.push('\n');
    }

    if !snapshot.semantic_index.is_empty() {
        out.push_str("## Concepts\n\n");
        for c in &snapshot.semantic_index {
            let line = format!(
                "- {} ({:.2}): {} → {}\n",
                c.name,
                c.confidence,
                c.summary,
                c.decision_ids.join(", ")
            );
            if !fits(&out, &line, max_tokens) {
                break;
            }
            out.push_str(&line);
        }
        out.push('\n');
    }

    if !snapshot.recent_window.is_empty() {
        out.push_str("## Recent\n\n");
        for r in &snapshot.recent_window {
            let cat = r
                .category
                .map(|c| format!("[{c}] "))
                .unwrap_or_default();
            let line = format!("- {cat}{}\n", r.summary);
            if !fits(&out, &line, max_tokens) {
                break;
            }
            out.push_str(&line);
        }
    }

    out
}

/// Decision records whose triggers or title match a keyword.
pub fn search_decisions<'a>(
    decisions: &'a [DecisionRecord],
    keyword: &str,
) -> Vec<&'a DecisionRecord> {
    let needle = keyword.to_lowercase();
    decisions
        .iter()
        .filter(|d| {
            d.triggers.iter().any(|t| t.to_lowercase() == needle)
                || token_set(&d.title).contains(&needle)
        })
        .collect()
}

/// The "why" history of one file: interactions that touched it, newest
/// first.
pub fn intent_for_file<'a>(interactions: &'a [Interaction], path: &str) -> Vec<&'a Interaction> {
    let normalized = path.replace('\\', "/");
    let mut hits: Vec<&Interaction> = interactions
        .iter()
        .filter(|i| i.files.iter().any(|f| f.replace('\\', "/") == normalized))
        .collect();
    hits.sort_by(|a, b| b.ts.cmp(&a.ts));
    hits
}

use serde::{Deserialize, Serialize};
use skald_core::{DecisionRecord, DecisionStatus};
use std::collections::BTreeSet;
use time::OffsetDateTime;

/// YAML front matter of an ADR file. The body carries the prose sections.
#[derive(Debug, Serialize, Deserialize)]
struct FrontMatter {
    id: String,
    title: String,
    #[serde(with = "time::serde::rfc3339")]
    date: OffsetDateTime,
    status: DecisionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    superseded_by: Option<String>,
    triggers: Vec<String>,
    source_interaction: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    commits: Vec<String>,
}

/// Render a decision record as markdown with YAML front matter.
pub fn render_decision(record: &DecisionRecord) -> anyhow::Result<String> {
    let front = FrontMatter {
        id: record.id.clone(),
        title: record.title.clone(),
        date: record.date,
        status: record.status,
        superseded_by: record.superseded_by.clone(),
        triggers: record.triggers.iter().cloned().collect(),
        source_interaction: record.source_interaction.clone(),
        files: record.files.clone(),
        commits: record.commits.clone(),
    };

    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&serde_yaml::to_string(&front)?);
    out.push_str("---\n\n");
    out.push_str(&format!("# {}: {}\n\n", record.id, record.title));
    out.push_str("## Context\n\n");
    out.push_str(record.context.trim());
    out.push_str("\n\n## Decision\n\n");
    out.push_str(record.decision.trim());
    out.push_str("\n\n## Alternatives\n\n");
    if record.alternatives.is_empty() {
        out.push_str("- none considered\n");
    } else {
        for alt in &record.alternatives {
            out.push_str(&format!("- {alt}\n"));
        }
    }
    out.push_str("\n## Consequences\n\n");
    if record.consequences.is_empty() {
        out.push_str("- none recorded\n");
    } else {
        for c in &record.consequences {
            out.push_str(&format!("- {c}\n"));
        }
    }
    Ok(out)
}

/// Parse an ADR file back into a record.
pub fn parse_decision(content: &str) -> anyhow::Result<DecisionRecord> {
    let rest = content
        .strip_prefix("---\n")
        .ok_or_else(|| anyhow::anyhow!("missing front matter"))?;
    let (front_str, body) = rest
        .split_once("\n---\n")
        .ok_or_else(|| anyhow::anyhow!("unterminated front matter"))?;
    let front: FrontMatter = serde_yaml::from_str(front_str)?;

    let context = section(body, "Context");
    let decision = section(body, "Decision");
    let alternatives = bullets(&section(body, "Alternatives"), "none considered");
    let consequences = bullets(&section(body, "Consequences"), "none recorded");

    Ok(DecisionRecord {
        id: front.id,
        title: front.title,
        date: front.date,
        status: front.status,
        superseded_by: front.superseded_by,
        context,
        decision,
        alternatives,
        consequences,
        triggers: front.triggers.into_iter().collect::<BTreeSet<_>>(),
        source_interaction: front.source_interaction,
        files: front.files,
        commits: front.commits,
    })
}

fn section(body: &str, heading: &str) -> String {
    let marker = format!("## {heading}");
    let Some(start) = body.find(&marker) else {
        return String::new();
    };
    let after = &body[start + marker.len()..];
    let end = after.find("\n## ").unwrap_or(after.len());
    after[..end].trim().to_string()
}

fn bullets(text: &str, placeholder: &str) -> Vec<String> {
    text.lines()
        .filter_map(|l| l.strip_prefix("- "))
        .map(|l| l.trim().to_string())
        .filter(|l| l != placeholder)
        .collect()
}

use skald_core::ids::format_rfc3339;
use skald_pipeline::Pipeline;
use skald_snapshot::intent_for_file;
use skald_store::log::load_interactions;
use std::path::Path;

pub fn execute(root: &Path, path: &str, limit: usize) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;
    let interactions = load_interactions(&pipeline.paths);
    let hits = intent_for_file(&interactions, path);

    if hits.is_empty() {
        println!("no recorded intent for {path}");
        return Ok(());
    }
    for interaction in hits.iter().take(limit) {
        let category = interaction
            .intent
            .as_ref()
            .map(|i| format!("[{}] ", i.category))
            .unwrap_or_default();
        let commit = interaction
            .commit
            .as_deref()
            .map(|sha| format!(" ({sha})"))
            .unwrap_or_default();
        println!(
            "{}  {category}{}{commit}",
            format_rfc3339(interaction.ts),
            interaction.prompt
        );
    }
    Ok(())
}

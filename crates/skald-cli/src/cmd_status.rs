use skald_adr::list_decisions;
use skald_core::DecisionStatus;
use skald_pipeline::Pipeline;
use skald_store::log::{event_log_files, load_interactions};
use std::path::Path;

pub fn execute(root: &Path) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;
    let paths = &pipeline.paths;

    let interactions = load_interactions(paths);
    let orphans = interactions.iter().filter(|i| i.commit.is_none()).count();
    let decisions = list_decisions(paths);
    let active = decisions
        .iter()
        .filter(|d| d.status != DecisionStatus::Superseded)
        .count();

    println!("workspace:     {}", paths.skald_dir.display());
    println!("capture:       {}", if paths.is_paused() { "paused" } else { "active" });
    println!("event logs:    {}", event_log_files(paths).len());
    println!("interactions:  {} ({} orphaned)", interactions.len(), orphans);
    println!("decisions:     {} ({} active)", decisions.len(), active);

    match skald_snapshot::load_snapshot(paths)? {
        Some(snapshot) => println!(
            "snapshot:      ok ({} decisions, {} concepts, checksum {})",
            snapshot.decisions_index.len(),
            snapshot.semantic_index.len(),
            &snapshot.checksum[..12]
        ),
        None => println!("snapshot:      missing (run `skald process`)"),
    }
    Ok(())
}

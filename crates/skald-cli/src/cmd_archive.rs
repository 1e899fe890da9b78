use skald_core::ids::now_utc;
use skald_pipeline::Pipeline;
use std::path::Path;

pub fn execute(root: &Path) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;
    let stats = skald_retention::archive(&pipeline.paths, now_utc(), &pipeline.config)?;
    println!(
        "archived {} record(s), reclaimed {} byte(s)",
        stats.moved_count, stats.bytes_reclaimed
    );
    Ok(())
}

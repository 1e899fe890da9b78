use skald_core::ids::now_utc;
use skald_pipeline::Pipeline;
use skald_snapshot::render_context;
use std::path::Path;

pub fn execute(root: &Path, max_tokens: usize) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;
    // A discarded (missing/corrupt) snapshot is rebuilt from the
    // append-only sources rather than served stale.
    let snapshot = match skald_snapshot::load_snapshot(&pipeline.paths)? {
        Some(s) => s,
        None => pipeline.rebuild(now_utc())?,
    };
    print!("{}", render_context(&snapshot, max_tokens));
    Ok(())
}

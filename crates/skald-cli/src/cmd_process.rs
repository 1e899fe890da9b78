use skald_core::ids::now_utc;
use skald_pipeline::Pipeline;
use std::path::Path;

pub fn execute(root: &Path) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;
    let outcome = pipeline.process(now_utc())?;
    println!("events read:       {}", outcome.events_read);
    println!("interactions:      {}", outcome.sealed);
    println!("commits linked:    {}", outcome.linked);
    println!("orphans pending:   {}", outcome.orphans);
    println!("decisions created: {}", outcome.decisions_created);
    println!("decisions merged:  {}", outcome.decisions_merged);
    println!("snapshot checksum: {}", &outcome.snapshot_checksum[..12.min(outcome.snapshot_checksum.len())]);
    Ok(())
}

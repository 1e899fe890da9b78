use skald_pipeline::Pipeline;
use std::path::Path;

pub fn execute(root: &Path, pause: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;
    if pause {
        pipeline.pause()?;
        println!("capture paused (persisted records are untouched)");
    } else {
        pipeline.resume()?;
        println!("capture resumed");
    }
    Ok(())
}

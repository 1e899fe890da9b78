use skald_pipeline::Pipeline;
use std::path::Path;

pub fn execute(root: &Path) -> anyhow::Result<()> {
    let paths = Pipeline::init(root)?;
    println!("initialized skald workspace at {}", paths.skald_dir.display());
    println!("  config:    {}", paths.config_json.display());
    println!("  events:    {}", paths.events_dir.display());
    println!("  decisions: {}", paths.decisions_dir.display());
    Ok(())
}

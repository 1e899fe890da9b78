use skald_core::ids::now_utc;
use skald_pipeline::Pipeline;
use std::path::Path;

pub fn execute(root: &Path, verify: bool, rebuild: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;

    if verify {
        return match skald_snapshot::load_snapshot(&pipeline.paths)? {
            Some(snapshot) => {
                println!("snapshot ok (checksum {})", &snapshot.checksum[..12]);
                Ok(())
            }
            None => anyhow::bail!("snapshot missing or corrupt; run `skald snapshot --rebuild`"),
        };
    }

    if rebuild {
        let snapshot = pipeline.rebuild(now_utc())?;
        println!(
            "rebuilt snapshot: {} decisions, {} concepts, {} recent (checksum {})",
            snapshot.decisions_index.len(),
            snapshot.semantic_index.len(),
            snapshot.recent_window.len(),
            &snapshot.checksum[..12]
        );
        return Ok(());
    }

    // Default: print the stored snapshot, rebuilding if it was discarded.
    let snapshot = match skald_snapshot::load_snapshot(&pipeline.paths)? {
        Some(s) => s,
        None => pipeline.rebuild(now_utc())?,
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

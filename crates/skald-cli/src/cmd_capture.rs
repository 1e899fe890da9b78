use skald_pipeline::Pipeline;
use std::io::Read;
use std::path::Path;

pub fn execute(root: &Path, inline: Option<&str>) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;

    let payload = match inline {
        Some(json) => json.to_string(),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    // Watchers may batch several payloads, one per line.
    let mut accepted = 0;
    let mut skipped = 0;
    for line in payload.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match pipeline.capture(line) {
            Ok(Some(_)) => accepted += 1,
            Ok(None) => {
                println!("capture is paused, event refused");
                return Ok(());
            }
            Err(e) => {
                // One bad line never aborts the watcher.
                tracing::warn!(error = %e, "skipping malformed capture payload");
                skipped += 1;
            }
        }
    }
    println!("captured {accepted} event(s), skipped {skipped}");
    Ok(())
}

use skald_adr::list_decisions;
use skald_pipeline::Pipeline;
use skald_snapshot::search_decisions;
use std::path::Path;

pub fn execute(root: &Path, keyword: &str, json: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;
    let decisions = list_decisions(&pipeline.paths);
    let hits = search_decisions(&decisions, keyword);

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("no decisions match {keyword:?}");
        return Ok(());
    }
    for record in hits {
        println!(
            "{}  {} [{}]",
            record.id,
            record.title,
            record.triggers.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    Ok(())
}

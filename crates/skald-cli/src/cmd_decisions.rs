use skald_adr::{list_decisions, load_decision, render_decision};
use skald_core::DecisionStatus;
use skald_pipeline::Pipeline;
use std::path::Path;

pub fn execute(root: &Path, show: Option<&str>, all: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;

    if let Some(id) = show {
        let record = load_decision(&pipeline.paths, id)?;
        print!("{}", render_decision(&record)?);
        return Ok(());
    }

    let decisions = list_decisions(&pipeline.paths);
    if decisions.is_empty() {
        println!("no decision records yet");
        return Ok(());
    }
    for record in decisions {
        if !all && record.status == DecisionStatus::Superseded {
            continue;
        }
        let marker = match record.status {
            DecisionStatus::Superseded => " (superseded)",
            DecisionStatus::Draft => " (draft)",
            DecisionStatus::Accepted => "",
        };
        println!("{}  {}{}", record.id, record.title, marker);
    }
    Ok(())
}

pub fn supersede(root: &Path, id: &str, by: &str) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(root)?;
    let record = skald_adr::supersede(&pipeline.paths, id, by, &pipeline.config)?;
    println!("{} is now superseded by {by}", record.id);
    Ok(())
}

use anyhow::{Context, Result};
use stabsim_core::EngineOutcome;
use stabsim_sim::OutputClassifier;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

pub fn handle(log: &Path) -> Result<()> {
    let text = fs::read_to_string(log)
        .with_context(|| format!("reading engine log '{}'", log.display()))?;
    let outcome = OutputClassifier::default().classify(&text);
    if outcome.is_failure() {
        error!(log = %log.display(), %outcome, "Engine log reports a failed run");
    } else if outcome == EngineOutcome::Unclassified {
        warn!(log = %log.display(), "No recognised marker in engine log");
    } else {
        info!(log = %log.display(), %outcome, "Engine log classified");
    }
    println!("{outcome}");
    Ok(())
}

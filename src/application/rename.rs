//! # Rename
//!
//! Asks the rename persona for better file names and turns its answer into a
//! plan. Names stay in each file's own directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::application::parsing::parse_action;
use crate::application::plan::is_plain_name;
use crate::application::vision;
use crate::domain::error::{AlfredError, Result};
use crate::domain::paths::display_name;
use crate::domain::traits::LlmProvider;
use crate::domain::types::{ActionPlan, AgentInstruction, Persona, PlanKind, RenameAction};
use crate::strings::prompts;

const MAX_NAMES: usize = 30;
const MAX_IMAGES: usize = 5;

/// The given paths that are existing regular files, in order.
pub fn existing_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().filter(|p| p.is_file()).cloned().collect()
}

pub async fn derive_plan(files: &[PathBuf], llm: &dyn LlmProvider) -> Result<ActionPlan> {
    if files.is_empty() {
        return Err(AlfredError::InvalidInput("No valid files.".to_string()));
    }

    let names: Vec<String> = files.iter().take(MAX_NAMES).map(|f| display_name(f)).collect();
    let images = vision::load_images(files.iter().map(PathBuf::as_path), MAX_IMAGES);
    let prompt = prompts::rename_prompt(&names, !images.is_empty());
    let instruction = AgentInstruction::new(Persona::Rename, prompt).with_images(images);

    let renames = match parse_action::<RenameAction>(&llm.complete(&instruction).await?)? {
        RenameAction::Rename { renames } => renames,
        RenameAction::None { reason } => {
            tracing::info!("Rename persona declined: {}", reason);
            return Ok(ActionPlan::new(PlanKind::Rename, reason));
        }
    };

    let mut plan = ActionPlan::new(PlanKind::Rename, "suggested names");
    let mut targets: HashSet<PathBuf> = HashSet::new();
    for file in files {
        let old = display_name(file);
        let Some(new) = renames.get(&old).map(|n| n.trim()) else {
            continue;
        };
        if new == old {
            continue;
        }
        if !is_plain_name(new) {
            tracing::warn!("Ignoring suggested name {:?} for {}: not a plain file name", new, old);
            continue;
        }
        let target = file.parent().unwrap_or_else(|| Path::new("")).join(new);
        if !targets.insert(target.clone()) {
            tracing::warn!("Ignoring suggested name {:?} for {}: already used", new, old);
            continue;
        }
        plan.push(file.clone(), target);
    }
    Ok(plan)
}

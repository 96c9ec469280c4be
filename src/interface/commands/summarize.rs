//! `alfred summarize <files...>`: read-only, asks for three bullet points.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::application::parsing::parse_action;
use crate::domain::error::AlfredError;
use crate::domain::paths::display_name;
use crate::domain::types::{AgentInstruction, Persona, SummarizeAction};
use crate::interface::commands::AppContext;
use crate::interface::report::{Event, Reporter};
use crate::strings::{messages, prompts};

const MAX_CHARS: usize = 4000;
// a char is at most four UTF-8 bytes
const MAX_BYTES: u64 = (MAX_CHARS * 4) as u64;

/// First `MAX_CHARS` characters of a file, decoded lossily.
fn read_excerpt(path: &Path) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    std::fs::File::open(path)?.take(MAX_BYTES).read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).chars().take(MAX_CHARS).collect())
}

fn collect_contents(paths: &[PathBuf]) -> Vec<String> {
    let mut contents = Vec::new();
    for path in paths {
        if !path.is_file() {
            tracing::warn!("Skipping {}: not a file", path.display());
            continue;
        }
        match read_excerpt(path) {
            Ok(text) => contents.push(format!("FILE: {}\n{}", display_name(path), text)),
            Err(e) => tracing::warn!("Failed to read file {}: {}", path.display(), e),
        }
    }
    contents
}

pub async fn handle_summarize(ctx: &AppContext, reporter: &mut Reporter, paths: &[PathBuf]) -> Result<()> {
    let contents = collect_contents(paths);
    if contents.is_empty() {
        return Err(AlfredError::InvalidInput(messages::NO_READABLE_FILES.to_string()).into());
    }

    reporter.emit(Event::message(messages::summarizing(contents.len())));
    let instruction = AgentInstruction::new(Persona::Summarize, prompts::summarize_prompt(&contents));
    let response = ctx.llm.complete(&instruction).await?;

    match parse_action::<SummarizeAction>(&response)? {
        SummarizeAction::Summarize { summary } => reporter.emit(Event::Summary { text: summary }),
        SummarizeAction::None { reason } => reporter.emit(Event::message(reason)),
    }
    Ok(())
}

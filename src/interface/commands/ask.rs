//! # Ask Command
//!
//! `alfred ask <instruction> [files...]`: the command persona writes a bash or
//! python snippet, the safety guard vets it, and it runs with a timeout.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::parsing::{parse_action, strip_think};
use crate::application::safety;
use crate::domain::error::AlfredError;
use crate::domain::types::{AgentInstruction, CommandAction, Persona, ScriptLanguage};
use crate::interface::commands::AppContext;
use crate::interface::report::{Event, Reporter};
use crate::strings::prompts;

pub async fn handle_ask(
    ctx: &AppContext,
    reporter: &mut Reporter,
    instruction: &str,
    files: &[PathBuf],
) -> Result<()> {
    let files: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
    let workdir = std::env::current_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|_| ".".to_string());

    let prompt = prompts::command_prompt(instruction, &files, &workdir);
    let response = ctx.llm.complete(&AgentInstruction::new(Persona::Command, prompt)).await?;

    let (language, code) = match parse_action::<CommandAction>(&response) {
        Ok(CommandAction::Run { language, code }) => (language, code),
        Ok(CommandAction::None { message }) => {
            reporter.emit(Event::message(message));
            return Ok(());
        }
        // prose without code is shown as-is
        Err(AlfredError::InvalidResponse(_)) => {
            reporter.emit(Event::message(strip_think(&response)));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let verdict = safety::evaluate(&code);
    if verdict.blocked {
        let rule = verdict.matched_rule.unwrap_or_default();
        reporter.emit(Event::Blocked {
            rule: rule.clone(),
            command: verdict.command_text,
        });
        return Err(AlfredError::SafetyBlocked { rule }.into());
    }

    reporter.emit(Event::Running {
        language: language.as_str().to_string(),
        code: code.clone(),
    });
    let output = match language {
        ScriptLanguage::Bash => ctx.executor.run_shell(&code).await?,
        ScriptLanguage::Python => ctx.executor.run_python(&code).await?,
    };
    reporter.emit(Event::command_output(&output));

    if !output.success() {
        return Err(AlfredError::Execution(format!(
            "{} exited with status {}",
            language.as_str(),
            output
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string())
        ))
        .into());
    }
    Ok(())
}

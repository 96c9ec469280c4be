//! # Command Handlers
//!
//! One handler per subcommand. Handlers talk to the user only through the
//! [`Reporter`] and return `anyhow::Result`; `main` turns an error into the
//! `[ERR]` line and exit status.

pub mod ask;
pub mod convert;
pub mod install;
pub mod organize;
pub mod rename;
pub mod summarize;

use std::sync::Arc;

use anyhow::Result;

use crate::application::plan::{Outcome, Workflow, apply_plan};
use crate::domain::config::AppConfig;
use crate::domain::traits::{LlmProvider, ToolLocator};
use crate::domain::types::ActionPlan;
use crate::infrastructure::tools::executor::ToolExecutor;
use crate::interface::cli::{Command, ConfirmArgs};
use crate::interface::report::{Event, Reporter};
use crate::strings::messages;

/// Everything a handler may use, built once in `main`.
pub struct AppContext {
    pub config: AppConfig,
    pub llm: Arc<dyn LlmProvider>,
    pub locator: Arc<dyn ToolLocator>,
    pub executor: ToolExecutor,
}

pub async fn run(ctx: &AppContext, reporter: &mut Reporter, command: Command) -> Result<()> {
    match command {
        Command::Convert { input_file, target_format } => {
            convert::handle_convert(ctx, reporter, &input_file, &target_format).await
        }
        Command::Organize { folder, instructions, confirm } => {
            organize::handle_organize(ctx, reporter, &folder, instructions.as_deref(), &confirm).await
        }
        Command::Rename { files, confirm } => rename::handle_rename(ctx, reporter, &files, &confirm).await,
        Command::Summarize { files } => summarize::handle_summarize(ctx, reporter, &files).await,
        Command::Ask { instruction, files } => ask::handle_ask(ctx, reporter, &instruction, &files).await,
        Command::Install { tool_name } => install::handle_install(ctx, reporter, &tool_name).await,
    }
}

/// Show `plan`, and apply it when the run carries `--confirm`.
pub(crate) fn preview_or_apply(
    reporter: &mut Reporter,
    plan: ActionPlan,
    confirm: &ConfirmArgs,
    verb: &str,
) -> Result<()> {
    let mut workflow = Workflow::new();
    let plan_id = workflow.preview(plan);
    if let Some(plan) = workflow.plan() {
        reporter.emit(Event::plan(plan, &plan_id));
    }

    if !confirm.confirm {
        reporter.emit(Event::PreviewOnly { plan_id });
        return Ok(());
    }

    let plan = workflow.confirm(confirm.plan_id.as_deref())?;
    let report = apply_plan(plan, |entry, outcome| match outcome {
        Outcome::Applied => reporter.emit(Event::Applied {
            from: entry.from.display().to_string(),
            to: entry.to.display().to_string(),
        }),
        Outcome::Skipped(reason) => reporter.emit(Event::Skipped {
            from: entry.from.display().to_string(),
            reason: reason.to_string(),
        }),
        Outcome::Failed(_) => {}
    });

    if let Some((entry, reason)) = &report.failed {
        anyhow::bail!(messages::partial_failure(
            report.applied.len(),
            &entry.from.display().to_string(),
            reason,
        ));
    }

    reporter.emit(Event::message(messages::applied_summary(
        verb,
        report.applied.len(),
        report.skipped.len(),
    )));
    Ok(())
}

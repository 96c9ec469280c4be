//! `alfred rename <files...> [--confirm]`

use std::path::PathBuf;

use anyhow::Result;

use crate::application::{rename, vision};
use crate::domain::error::AlfredError;
use crate::interface::cli::ConfirmArgs;
use crate::interface::commands::{AppContext, preview_or_apply};
use crate::interface::report::{Event, Reporter};
use crate::strings::messages;

pub async fn handle_rename(
    ctx: &AppContext,
    reporter: &mut Reporter,
    paths: &[PathBuf],
    confirm: &ConfirmArgs,
) -> Result<()> {
    let files = rename::existing_files(paths);
    if files.is_empty() {
        return Err(AlfredError::InvalidInput(messages::NO_VALID_FILES.to_string()).into());
    }

    let images = files.iter().filter(|f| vision::is_image(f)).count();
    reporter.emit(Event::message(messages::analyzing(files.len(), images)));

    let plan = rename::derive_plan(&files, ctx.llm.as_ref()).await?;
    if plan.is_empty() {
        reporter.emit(Event::message(messages::NO_RENAMES_NEEDED));
        return Ok(());
    }

    preview_or_apply(reporter, plan, confirm, "Renamed")
}

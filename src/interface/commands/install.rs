//! `alfred install <tool>`: fetch a converter into Alfred's own `bin/`.

use anyhow::Result;

use crate::domain::error::AlfredError;
use crate::infrastructure::tools::installer;
use crate::interface::commands::AppContext;
use crate::interface::report::{Event, Reporter};
use crate::strings::messages;

const PROGRESS_STEP: u64 = 25;

pub async fn handle_install(ctx: &AppContext, reporter: &mut Reporter, tool: &str) -> Result<()> {
    let tool = tool.trim().to_lowercase();
    let Some(url) = installer::download_url(&tool) else {
        return Err(AlfredError::InvalidInput(messages::unknown_tool(&tool, &installer::available_tools())).into());
    };

    reporter.emit(Event::message(messages::downloading(&tool, url)));
    let bin_dir = ctx.config.local_bin_dir();

    let mut next_step = PROGRESS_STEP;
    let path = installer::install(&tool, &bin_dir, |received, total| {
        let Some(total) = total.filter(|t| *t > 0) else { return };
        if received * 100 / total >= next_step {
            reporter.emit(Event::message(messages::download_progress(received, Some(total))));
            while next_step <= received * 100 / total {
                next_step += PROGRESS_STEP;
            }
        }
    })
    .await?;

    reporter.emit(Event::message(messages::installed(&tool, &path.display().to_string())));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::cli::OutputFormat;
    use crate::interface::commands::fixtures::harness;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unknown_tool_lists_available() {
        let home = TempDir::new().unwrap();
        let mut h = harness(home.path(), &[], OutputFormat::Human);

        let err = handle_install(&h.ctx, &mut h.reporter, "gimp").await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool 'gimp'. Available: ffmpeg, pandoc");
        assert!(h.out.text().is_empty());
        assert!(!home.path().join("bin").exists());
    }
}

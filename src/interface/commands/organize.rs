//! `alfred organize <folder> [--instructions TEXT] [--confirm]`

use std::path::Path;

use anyhow::Result;

use crate::application::organize;
use crate::interface::cli::ConfirmArgs;
use crate::interface::commands::{AppContext, preview_or_apply};
use crate::interface::report::{Event, Reporter};
use crate::strings::messages;

pub async fn handle_organize(
    ctx: &AppContext,
    reporter: &mut Reporter,
    folder: &Path,
    instructions: Option<&str>,
    confirm: &ConfirmArgs,
) -> Result<()> {
    let files = organize::list_files(folder)?;
    if files.is_empty() {
        reporter.emit(Event::message(messages::NOTHING_TO_ORGANIZE));
        return Ok(());
    }

    let plan = organize::derive_plan(folder, &files, instructions, ctx.llm.as_ref()).await?;
    if plan.is_empty() {
        reporter.emit(Event::message(messages::NO_FILES_TO_MOVE));
        return Ok(());
    }

    preview_or_apply(reporter, plan, confirm, "Moved")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::cli::OutputFormat;
    use crate::interface::commands::fixtures::harness;
    use tempfile::TempDir;

    fn confirm(yes: bool, plan_id: Option<&str>) -> ConfirmArgs {
        ConfirmArgs {
            confirm: yes,
            plan_id: plan_id.map(str::to_string),
        }
    }

    fn seed(dir: &Path) {
        for name in ["a.jpg", "b.pdf", "c.mp3"] {
            std::fs::write(dir.join(name), name).unwrap();
        }
    }

    fn plan_id(out: &str) -> String {
        out.lines()
            .find_map(|l| l.strip_prefix("Plan-Id: "))
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_preview_then_confirm() {
        let home = TempDir::new().unwrap();
        let folder = TempDir::new().unwrap();
        seed(folder.path());

        let mut preview = harness(home.path(), &[], OutputFormat::Human);
        handle_organize(&preview.ctx, &mut preview.reporter, folder.path(), None, &confirm(false, None))
            .await
            .unwrap();
        let out = preview.out.text();
        assert!(out.starts_with("Plan: Move 3 file(s) into 3 folder(s):"));
        assert!(out.contains("Preview only"));
        assert!(folder.path().join("a.jpg").exists());

        let id = plan_id(&out);
        let mut run = harness(home.path(), &[], OutputFormat::Human);
        handle_organize(&run.ctx, &mut run.reporter, folder.path(), None, &confirm(true, Some(&id)))
            .await
            .unwrap();

        assert!(folder.path().join("Images/a.jpg").exists());
        assert!(folder.path().join("Documents/b.pdf").exists());
        assert!(folder.path().join("Audio/c.mp3").exists());
        assert!(run.out.text().contains("Done. Moved 3 file(s)."));
    }

    #[tokio::test]
    async fn test_stale_plan_id_aborts_without_changes() {
        let home = TempDir::new().unwrap();
        let folder = TempDir::new().unwrap();
        seed(folder.path());

        let mut h = harness(home.path(), &[], OutputFormat::Human);
        let err = handle_organize(&h.ctx, &mut h.reporter, folder.path(), None, &confirm(true, Some("000000000000")))
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Plan changed since preview"));
        assert!(folder.path().join("a.jpg").exists());
        assert!(!folder.path().join("Images").exists());
    }

    #[tokio::test]
    async fn test_empty_folder() {
        let home = TempDir::new().unwrap();
        let folder = TempDir::new().unwrap();
        std::fs::write(folder.path().join(".hidden"), "").unwrap();

        let mut h = harness(home.path(), &[], OutputFormat::Human);
        handle_organize(&h.ctx, &mut h.reporter, folder.path(), None, &confirm(true, None))
            .await
            .unwrap();
        assert_eq!(h.out.text(), "Folder is empty. Nothing to organize.\n");
    }

    #[tokio::test]
    async fn test_instructions_with_json_events() {
        let home = TempDir::new().unwrap();
        let folder = TempDir::new().unwrap();
        seed(folder.path());

        let mut h = harness(
            home.path(),
            &[r#"{"action":"organize","folders":{"Music":["c.mp3"]}}"#],
            OutputFormat::Json,
        );
        handle_organize(&h.ctx, &mut h.reporter, folder.path(), Some("music only"), &confirm(true, None))
            .await
            .unwrap();

        let events: Vec<String> = h
            .out
            .text()
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["event"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(events, vec!["plan", "applied", "message"]);
        assert!(folder.path().join("Music/c.mp3").exists());
        assert!(folder.path().join("a.jpg").exists());
    }

    #[tokio::test]
    async fn test_missing_folder_is_error() {
        let home = TempDir::new().unwrap();
        let mut h = harness(home.path(), &[], OutputFormat::Human);
        let err = handle_organize(&h.ctx, &mut h.reporter, &home.path().join("nope"), None, &confirm(false, None))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Directory not found"));
    }
}

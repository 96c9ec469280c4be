//! # Convert Command
//!
//! `alfred convert <file> <target>`. A target that names a known format goes
//! straight to the resolver; anything else is read as an instruction for the
//! convert persona.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::convert::Dispatcher;
use crate::application::parsing::parse_action;
use crate::application::resolver;
use crate::domain::error::AlfredError;
use crate::domain::paths::display_name;
use crate::domain::types::{AgentInstruction, Category, ConversionRequest, ConvertAction, Persona, normalize_ext};
use crate::interface::commands::AppContext;
use crate::interface::report::{Event, Reporter};
use crate::strings::prompts;

/// A bare extension Alfred knows, as opposed to free text.
fn is_format(target: &str) -> bool {
    let target = target.trim();
    !target.contains(char::is_whitespace) && Category::of(&normalize_ext(target)).is_some()
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

pub async fn handle_convert(ctx: &AppContext, reporter: &mut Reporter, input: &Path, target: &str) -> Result<()> {
    if !input.is_file() {
        return Err(AlfredError::InvalidInput(format!("File not found: {}", input.display())).into());
    }

    if is_format(target) {
        return convert_to(ctx, reporter, input, target).await;
    }

    match ask_persona(ctx, input, target).await? {
        ConvertAction::Convert { target_format } => {
            tracing::info!("Convert persona chose .{}", target_format);
            convert_to(ctx, reporter, input, &target_format).await
        }
        ConvertAction::Resize { width, height } => resize(ctx, reporter, input, width, height),
        ConvertAction::None { reason } => {
            Err(AlfredError::InvalidInput(format!("Cannot do that: {reason}")).into())
        }
    }
}

async fn convert_to(ctx: &AppContext, reporter: &mut Reporter, input: &Path, target: &str) -> Result<()> {
    let request = ConversionRequest::new(input, target)?;
    let requirement = resolver::resolve(
        request.category,
        &request.source_format,
        &request.target_format,
        ctx.locator.as_ref(),
    )?
    .into_ready()?;

    reporter.emit(Event::Converting {
        input: input.display().to_string(),
        target: request.target_extension.clone(),
        tool: requirement.required_tool_name().to_string(),
    });

    let dispatcher = Dispatcher::new(&ctx.executor, ctx.locator.as_ref());
    let output = dispatcher
        .convert(&request, &requirement)
        .await
        .with_context(|| format!("Converting {}", display_name(input)))?;

    reporter.emit(Event::Converted {
        size: file_size(&output),
        output: output.display().to_string(),
    });
    Ok(())
}

fn resize(ctx: &AppContext, reporter: &mut Reporter, input: &Path, width: u32, height: u32) -> Result<()> {
    let ext = input
        .extension()
        .map(|e| normalize_ext(&e.to_string_lossy()))
        .unwrap_or_default();
    // resizing re-encodes to the same raster format
    if !resolver::is_raster(&ext) {
        return Err(AlfredError::InvalidInput(format!("Cannot resize .{ext} files")).into());
    }

    reporter.emit(Event::Converting {
        input: input.display().to_string(),
        target: format!("{width}x{height}"),
        tool: "image-codec".to_string(),
    });
    let dispatcher = Dispatcher::new(&ctx.executor, ctx.locator.as_ref());
    let output = dispatcher.resize(input, width, height)?;
    reporter.emit(Event::Converted {
        size: file_size(&output),
        output: output.display().to_string(),
    });
    Ok(())
}

async fn ask_persona(ctx: &AppContext, input: &Path, instruction: &str) -> Result<ConvertAction> {
    let source = input
        .extension()
        .map(|e| normalize_ext(&e.to_string_lossy()))
        .unwrap_or_default();
    let targets: Vec<&str> = resolver::supported_triples()
        .into_iter()
        .filter(|(_, from, _)| *from == source)
        .map(|(_, _, to)| to)
        .collect();

    let prompt = prompts::convert_prompt(&display_name(input), &source, instruction, &targets);
    let response = ctx.llm.complete(&AgentInstruction::new(Persona::Convert, prompt)).await?;
    Ok(parse_action::<ConvertAction>(&response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::cli::OutputFormat;
    use crate::interface::commands::fixtures::harness;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert!(is_format("png"));
        assert!(is_format(".JPEG"));
        assert!(!is_format("make it smaller"));
        assert!(!is_format("xyz"));
    }

    #[tokio::test]
    async fn test_json_to_csv_end_to_end() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("people.json");
        std::fs::write(&input, r#"[{"name":"Ada","age":36}]"#).unwrap();
        let mut h = harness(dir.path(), &[], OutputFormat::Human);

        handle_convert(&h.ctx, &mut h.reporter, &input, "csv").await.unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("people.csv")).unwrap(), "name,age\nAda,36\n");
        let out = h.out.text();
        assert!(out.starts_with("Converting people.json -> .csv using data-codec..."));
        assert!(out.contains("Output: "));
        assert_eq!(h.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_tool_is_need_install() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("clip.mov");
        std::fs::write(&input, b"\0\0\0\x14ftypqt  ").unwrap();
        let mut h = harness(dir.path(), &[], OutputFormat::Human);

        let err = handle_convert(&h.ctx, &mut h.reporter, &input, "mp4").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AlfredError>(), Some(AlfredError::NeedsInstall { tool }) if tool == "ffmpeg"));

        h.reporter.fail(&err);
        assert_eq!(h.out.text(), "[NEED_INSTALL] ffmpeg\n");
        assert!(h.err.text().starts_with("[ERR] "));
        assert!(!dir.path().join("clip.mp4").exists());
    }

    #[tokio::test]
    async fn test_unsupported_pair() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("song.mp3");
        std::fs::write(&input, b"ID3").unwrap();
        let mut h = harness(dir.path(), &[], OutputFormat::Human);

        let err = handle_convert(&h.ctx, &mut h.reporter, &input, "pdf").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AlfredError>(), Some(AlfredError::UnsupportedConversion { .. })));
    }

    #[tokio::test]
    async fn test_instruction_goes_through_persona() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("data.yaml");
        std::fs::write(&input, "name: alfred\n").unwrap();
        let mut h = harness(
            dir.path(),
            &[r#"{"action":"convert","target_format":"json"}"#],
            OutputFormat::Json,
        );

        handle_convert(&h.ctx, &mut h.reporter, &input, "turn this into json please").await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("data.json")).unwrap()).unwrap();
        assert_eq!(value["name"], "alfred");

        let seen = h.llm.instructions();
        assert_eq!(seen[0].persona, Persona::Convert);
        assert!(seen[0].prompt.contains("data.yaml"));
        assert!(h.out.text().contains(r#""event":"converted""#));
    }

    #[tokio::test]
    async fn test_persona_resize() {
        use ::image::{GenericImageView, ImageBuffer, Rgb};

        let dir = TempDir::new().unwrap();
        let input = dir.path().join("photo.png");
        ImageBuffer::from_pixel(100, 50, Rgb([1u8, 2, 3])).save(&input).unwrap();
        let mut h = harness(dir.path(), &[r#"{"action":"resize","width":50,"height":50}"#], OutputFormat::Human);

        handle_convert(&h.ctx, &mut h.reporter, &input, "make it half as big").await.unwrap();

        let output = dir.path().join("photo_50x50.png");
        assert_eq!(::image::open(output).unwrap().dimensions(), (50, 25));
    }

    #[tokio::test]
    async fn test_persona_decline_is_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.txt");
        std::fs::write(&input, "hi").unwrap();
        let mut h = harness(dir.path(), &[r#"{"action":"none","reason":"not possible"}"#], OutputFormat::Human);

        let err = handle_convert(&h.ctx, &mut h.reporter, &input, "make it sing").await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot do that: not possible");
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let mut h = harness(dir.path(), &[], OutputFormat::Human);
        let err = handle_convert(&h.ctx, &mut h.reporter, &dir.path().join("nope.png"), "jpg").await.unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }
}

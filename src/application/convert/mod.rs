//! # Conversion Dispatcher
//!
//! Runs the converter chosen by the resolver. Every converter writes into a
//! hidden temporary sibling of the output, which is moved into place only
//! after it succeeded and produced bytes. The source file is never touched.

pub mod data;
pub mod document;
pub mod external;
pub mod image;

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::domain::error::{AlfredError, Result};
use crate::domain::traits::ToolLocator;
use crate::domain::types::{ConversionRequest, Tool, ToolRequirement};
use crate::infrastructure::tools::executor::ToolExecutor;

pub struct Dispatcher<'a> {
    executor: &'a ToolExecutor,
    locator: &'a dyn ToolLocator,
}

/// Temporary file next to `output`, carrying the output's extension so
/// format-sniffing tools pick the right encoder.
fn stage(output: &Path) -> Result<NamedTempFile> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let suffix = output
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    tempfile::Builder::new()
        .prefix(".alfred-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(|e| AlfredError::io(dir, e))
}

/// Move a finished staging file onto `output`.
fn commit(staged: NamedTempFile, output: &Path, tool: Tool) -> Result<()> {
    let size = std::fs::metadata(staged.path())
        .map_err(|e| AlfredError::io(staged.path(), e))?
        .len();
    if size == 0 {
        return Err(AlfredError::conversion(tool.name(), "produced no output"));
    }
    if output.exists() {
        tracing::warn!("Replacing existing {}", output.display());
    }
    staged
        .persist(output)
        .map_err(|e| AlfredError::io(output, e.error))?;
    Ok(())
}

impl<'a> Dispatcher<'a> {
    pub fn new(executor: &'a ToolExecutor, locator: &'a dyn ToolLocator) -> Self {
        Self { executor, locator }
    }

    /// Convert per `requirement`, returning the output path.
    pub async fn convert(
        &self,
        request: &ConversionRequest,
        requirement: &ToolRequirement,
    ) -> Result<PathBuf> {
        let requirement = requirement.into_ready()?;
        let input = &request.input_path;
        if !input.is_file() {
            return Err(AlfredError::InvalidInput(format!(
                "File not found: {}",
                input.display()
            )));
        }

        let output = request.output_path();
        let staged = stage(&output)?;
        let tool = requirement.tool;
        tracing::info!(
            "Converting {} -> {} with {}",
            input.display(),
            output.display(),
            tool
        );

        match tool {
            Tool::DataCodec => data::convert(
                input,
                &request.source_format,
                &request.target_format,
                staged.path(),
            )?,
            Tool::ImageCodec => image::convert(input, &request.target_format, staged.path())?,
            Tool::Markdown => document::markdown_to_html(input, staged.path())?,
            external_tool => {
                self.run_external(external_tool, &request.target_format, input, staged.path())
                    .await?
            }
        }

        commit(staged, &output, tool)?;
        Ok(output)
    }

    /// Bundled resize writing `<stem>_<w>x<h>.<ext>` beside the input.
    pub fn resize(&self, input: &Path, width: u32, height: u32) -> Result<PathBuf> {
        let ext = input
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = input.with_file_name(format!("{stem}_{width}x{height}.{ext}"));

        let staged = stage(&output)?;
        image::resize(
            input,
            width,
            height,
            &crate::domain::types::normalize_ext(&ext),
            staged.path(),
        )?;
        commit(staged, &output, Tool::ImageCodec)?;
        Ok(output)
    }

    async fn run_external(&self, tool: Tool, target: &str, input: &Path, output: &Path) -> Result<()> {
        let invocation = external::invocation(tool, target, input, output, self.locator)?;
        let result = self
            .executor
            .run_program(invocation.program, &invocation.args)
            .await
            .map_err(|e| match e {
                AlfredError::Execution(message) => AlfredError::conversion(tool.name(), message),
                other => other,
            })?;

        if !result.success() {
            return Err(AlfredError::conversion(tool.name(), result.diagnostic()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Category;
    use tempfile::TempDir;

    struct NoTools;

    impl ToolLocator for NoTools {
        fn is_available(&self, _executable: &str) -> bool {
            false
        }
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".alfred-"))
            .collect()
    }

    #[tokio::test]
    async fn test_bundled_conversion_writes_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("people.json");
        std::fs::write(&input, r#"[{"name":"Ada"},{"name":"Alan"}]"#).unwrap();

        let executor = ToolExecutor::new(dir.path().join("bin"), 10);
        let dispatcher = Dispatcher::new(&executor, &NoTools);
        let request = ConversionRequest::new(&input, "csv").unwrap();
        let requirement = ToolRequirement { category: Category::Data, tool: Tool::DataCodec, present: true };

        let output = dispatcher.convert(&request, &requirement).await.unwrap();
        assert_eq!(output, dir.path().join("people.csv"));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "name\nAda\nAlan\n");
        assert!(input.exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_conversion_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("empty.json");
        std::fs::write(&input, "[]").unwrap();

        let executor = ToolExecutor::new(dir.path().join("bin"), 10);
        let dispatcher = Dispatcher::new(&executor, &NoTools);
        let request = ConversionRequest::new(&input, "csv").unwrap();
        let requirement = ToolRequirement { category: Category::Data, tool: Tool::DataCodec, present: true };

        let err = dispatcher.convert(&request, &requirement).await.unwrap_err();
        assert!(matches!(err, AlfredError::Conversion { .. }));
        assert!(!dir.path().join("empty.csv").exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_absent_tool_needs_install() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("song.flac");
        std::fs::write(&input, b"fLaC").unwrap();

        let executor = ToolExecutor::new(dir.path().join("bin"), 10);
        let dispatcher = Dispatcher::new(&executor, &NoTools);
        let request = ConversionRequest::new(&input, "mp3").unwrap();
        let requirement = ToolRequirement { category: Category::Audio, tool: Tool::Ffmpeg, present: false };

        let err = dispatcher.convert(&request, &requirement).await.unwrap_err();
        assert!(matches!(err, AlfredError::NeedsInstall { tool } if tool == "ffmpeg"));
        assert!(!dir.path().join("song.mp3").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_failure_carries_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let fake = bin.join("pandoc");
        std::fs::write(&fake, "#!/bin/sh\necho 'pandoc: unknown reader' >&2\nexit 64\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let input = dir.path().join("notes.md");
        std::fs::write(&input, "# hi").unwrap();

        let executor = ToolExecutor::new(bin, 10);
        let dispatcher = Dispatcher::new(&executor, &NoTools);
        let request = ConversionRequest::new(&input, "docx").unwrap();
        let requirement = ToolRequirement { category: Category::Document, tool: Tool::Pandoc, present: true };

        let err = dispatcher.convert(&request, &requirement).await.unwrap_err();
        assert_eq!(err.to_string(), "pandoc failed: pandoc: unknown reader");
        assert!(!dir.path().join("notes.docx").exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_resize_output_name() {
        use ::image::{ImageBuffer, Rgb};

        let dir = TempDir::new().unwrap();
        let input = dir.path().join("Photo.png");
        ImageBuffer::from_pixel(40, 20, Rgb([10u8, 20, 30]))
            .save_with_format(&input, ::image::ImageFormat::Png)
            .unwrap();

        let executor = ToolExecutor::new(dir.path().join("bin"), 10);
        let dispatcher = Dispatcher::new(&executor, &NoTools);
        let output = dispatcher.resize(&input, 20, 20).unwrap();

        assert_eq!(output, dir.path().join("Photo_20x20.png"));
        assert!(output.exists());
    }
}

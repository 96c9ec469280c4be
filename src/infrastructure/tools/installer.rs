//! # Tool Installer
//!
//! Downloads a prebuilt binary archive for the tools Alfred can install,
//! unpacks the executable into the local `bin/` and marks it executable.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use futures::StreamExt;

use crate::domain::error::{AlfredError, Result};

/// Fixed download locations (macOS builds).
pub const TOOL_URLS: &[(&str, &str)] = &[
    ("ffmpeg", "https://evermeet.cx/ffmpeg/ffmpeg-7.1.zip"),
    (
        "pandoc",
        "https://github.com/jgm/pandoc/releases/download/3.6.3/pandoc-3.6.3-x86_64-macOS.zip",
    ),
];

pub fn download_url(tool: &str) -> Option<&'static str> {
    TOOL_URLS
        .iter()
        .find(|(name, _)| *name == tool)
        .map(|(_, url)| *url)
}

pub fn available_tools() -> Vec<&'static str> {
    TOOL_URLS.iter().map(|(name, _)| *name).collect()
}

fn install_error(tool: &str, message: impl Into<String>) -> AlfredError {
    AlfredError::Install {
        tool: tool.to_string(),
        message: message.into(),
    }
}

/// Download and install `tool` into `bin_dir`. `on_progress` receives
/// (bytes so far, total if known) after every chunk.
pub async fn install(
    tool: &str,
    bin_dir: &Path,
    mut on_progress: impl FnMut(u64, Option<u64>),
) -> Result<PathBuf> {
    let url = download_url(tool).ok_or_else(|| {
        install_error(
            tool,
            format!("unknown tool (available: {})", available_tools().join(", ")),
        )
    })?;

    std::fs::create_dir_all(bin_dir).map_err(|e| AlfredError::io(bin_dir, e))?;

    tracing::info!("Downloading {tool} from {url}");
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| install_error(tool, format!("download failed: {e}")))?;

    let total = response.content_length();
    let mut archive = tempfile::Builder::new()
        .prefix("alfred-download-")
        .suffix(".zip")
        .tempfile()
        .map_err(|e| AlfredError::io(std::env::temp_dir(), e))?;

    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| install_error(tool, format!("download interrupted: {e}")))?;
        archive
            .write_all(&chunk)
            .map_err(|e| AlfredError::io(archive.path(), e))?;
        downloaded += chunk.len() as u64;
        on_progress(downloaded, total);
    }
    archive
        .flush()
        .map_err(|e| AlfredError::io(archive.path(), e))?;

    tracing::info!("Downloaded {downloaded} bytes, extracting {tool}");
    extract_binary(archive.path(), tool, bin_dir)
}

/// Name of the archive entry holding `tool`: an exact or trailing path match
/// wins over a `bin/<tool>` prefix match.
fn find_entry<'a>(names: &[&'a str], tool: &str) -> Option<&'a str> {
    let suffix = format!("/{tool}");
    let in_bin = format!("bin/{tool}");
    names
        .iter()
        .find(|name| **name == tool || name.ends_with(&suffix))
        .or_else(|| {
            names
                .iter()
                .find(|name| name.contains(&in_bin) && !name.ends_with('/'))
        })
        .copied()
}

/// Pull `tool` out of a zip archive into `bin_dir/tool`, executable.
pub fn extract_binary(archive_path: &Path, tool: &str, bin_dir: &Path) -> Result<PathBuf> {
    let file = File::open(archive_path).map_err(|e| AlfredError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| install_error(tool, format!("not a zip archive: {e}")))?;

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let entry_name = find_entry(&name_refs, tool)
        .ok_or_else(|| install_error(tool, format!("{tool} not found in archive")))?
        .to_string();

    let mut entry = archive
        .by_name(&entry_name)
        .map_err(|e| install_error(tool, format!("cannot read {entry_name}: {e}")))?;

    std::fs::create_dir_all(bin_dir).map_err(|e| AlfredError::io(bin_dir, e))?;
    let mut staged = tempfile::NamedTempFile::new_in(bin_dir).map_err(|e| AlfredError::io(bin_dir, e))?;
    std::io::copy(&mut entry, &mut staged).map_err(|e| AlfredError::io(staged.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(staged.path(), std::fs::Permissions::from_mode(0o755))
            .map_err(|e| AlfredError::io(staged.path(), e))?;
    }

    let target = bin_dir.join(tool);
    staged
        .persist(&target)
        .map_err(|e| AlfredError::io(&target, e.error))?;

    tracing::info!("Installed {tool} to {}", target.display());
    Ok(target)
}

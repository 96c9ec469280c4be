//! # Tool Resolver
//!
//! Maps a (category, source, target) triple to the converter that handles it.
//! The capability table is static; rules are searched in order and the first
//! rule covering the triple decides the candidate list.

use crate::domain::error::{AlfredError, Result};
use crate::domain::traits::ToolLocator;
use crate::domain::types::{Category, Tool, ToolRequirement, normalize_ext};

/// Every ordered pair of distinct formats from `sources` x `targets`.
struct Rule {
    category: Category,
    sources: &'static [&'static str],
    targets: &'static [&'static str],
    tools: &'static [Tool],
}

const DATA_TEXT: &[&str] = &["json", "csv", "yaml", "toml"];
const RASTER: &[&str] = &["png", "jpg", "gif", "bmp", "tiff", "webp", "ico"];
const AUDIO: &[&str] = &["mp3", "wav", "flac", "ogg", "aac", "m4a", "opus"];
const VIDEO: &[&str] = &["mp4", "mov", "mkv", "avi", "webm"];

const RULES: &[Rule] = &[
    // data
    Rule {
        category: Category::Data,
        sources: DATA_TEXT,
        targets: DATA_TEXT,
        tools: &[Tool::DataCodec],
    },
    Rule {
        category: Category::Data,
        sources: &["xlsx"],
        targets: &["json", "csv"],
        tools: &[Tool::DataCodec],
    },
    Rule {
        category: Category::Data,
        sources: &["json", "csv"],
        targets: &["xlsx"],
        tools: &[Tool::DataCodec],
    },
    // image
    Rule {
        category: Category::Image,
        sources: RASTER,
        targets: RASTER,
        tools: &[Tool::ImageCodec],
    },
    Rule {
        category: Category::Image,
        sources: &["heic"],
        targets: &["jpg", "png"],
        tools: &[Tool::Sips, Tool::Magick],
    },
    Rule {
        category: Category::Image,
        sources: &["svg"],
        targets: &["png", "jpg"],
        tools: &[Tool::Magick],
    },
    // audio: the macOS encoder is preferred for AAC
    Rule {
        category: Category::Audio,
        sources: &["wav"],
        targets: &["aac", "m4a"],
        tools: &[Tool::Afconvert, Tool::Ffmpeg],
    },
    Rule {
        category: Category::Audio,
        sources: AUDIO,
        targets: AUDIO,
        tools: &[Tool::Ffmpeg],
    },
    // video
    Rule {
        category: Category::Video,
        sources: VIDEO,
        targets: VIDEO,
        tools: &[Tool::Ffmpeg],
    },
    Rule {
        category: Category::Video,
        sources: VIDEO,
        targets: &["mp3", "wav", "gif"],
        tools: &[Tool::Ffmpeg],
    },
    // document
    Rule {
        category: Category::Document,
        sources: &["md"],
        targets: &["html"],
        tools: &[Tool::Markdown, Tool::Pandoc],
    },
    Rule {
        category: Category::Document,
        sources: &["txt"],
        targets: &["html"],
        tools: &[Tool::Textutil, Tool::Pandoc],
    },
    Rule {
        category: Category::Document,
        sources: &["md"],
        targets: &["pdf", "docx", "epub"],
        tools: &[Tool::Pandoc],
    },
    Rule {
        category: Category::Document,
        sources: &["docx"],
        targets: &["pdf", "md", "html"],
        tools: &[Tool::Pandoc],
    },
    Rule {
        category: Category::Document,
        sources: &["html"],
        targets: &["md", "docx", "pdf"],
        tools: &[Tool::Pandoc],
    },
    Rule {
        category: Category::Document,
        sources: &["txt"],
        targets: &["pdf", "docx"],
        tools: &[Tool::Pandoc],
    },
    Rule {
        category: Category::Document,
        sources: &["txt"],
        targets: &["rtf"],
        tools: &[Tool::Textutil, Tool::Pandoc],
    },
    Rule {
        category: Category::Document,
        sources: &["rtf"],
        targets: &["txt", "html"],
        tools: &[Tool::Textutil, Tool::Pandoc],
    },
];

/// Ordered candidate tools for a triple, or `None` when unsupported.
pub fn candidates(category: Category, source: &str, target: &str) -> Option<&'static [Tool]> {
    let source = normalize_ext(source);
    let target = normalize_ext(target);
    if source == target {
        return None;
    }
    RULES
        .iter()
        .find(|rule| {
            rule.category == category
                && rule.sources.contains(&source.as_str())
                && rule.targets.contains(&target.as_str())
        })
        .map(|rule| rule.tools)
}

/// Formats the bundled image codec reads and writes.
pub fn is_raster(ext: &str) -> bool {
    RASTER.contains(&normalize_ext(ext).as_str())
}

/// Every supported triple, in table order.
pub fn supported_triples() -> Vec<(Category, &'static str, &'static str)> {
    let mut triples = Vec::new();
    for rule in RULES {
        for source in rule.sources {
            for target in rule.targets {
                if source != target && !triples.contains(&(rule.category, *source, *target)) {
                    triples.push((rule.category, *source, *target));
                }
            }
        }
    }
    triples
}

fn is_present(tool: Tool, locator: &dyn ToolLocator) -> bool {
    tool.is_bundled() || tool.executables().iter().any(|exe| locator.is_available(exe))
}

/// Resolve a triple. Unsupported triples fail without probing the host; a
/// supported triple whose tools are all missing yields `present: false`
/// naming the tool to install.
pub fn resolve(
    category: Category,
    source: &str,
    target: &str,
    locator: &dyn ToolLocator,
) -> Result<ToolRequirement> {
    let tools = candidates(category, source, target).ok_or_else(|| {
        AlfredError::UnsupportedConversion {
            from: normalize_ext(source),
            to: normalize_ext(target),
        }
    })?;

    if let Some(tool) = tools.iter().find(|tool| tool.is_bundled()) {
        return Ok(ToolRequirement { category, tool: *tool, present: true });
    }

    if let Some(tool) = tools.iter().find(|tool| is_present(**tool, locator)) {
        tracing::debug!("Resolved {source} -> {target} to {tool}");
        return Ok(ToolRequirement { category, tool: *tool, present: true });
    }

    let missing = tools
        .iter()
        .find(|tool| tool.is_installable())
        .or_else(|| tools.first())
        .copied()
        .ok_or_else(|| AlfredError::UnsupportedConversion {
            from: normalize_ext(source),
            to: normalize_ext(target),
        })?;

    tracing::info!("No tool present for {source} -> {target}; needs {missing}");
    Ok(ToolRequirement { category, tool: missing, present: false })
}

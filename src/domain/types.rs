//! # Domain Types
//!
//! Shared data structures: formats and categories, conversion requests, the
//! closed set of converter tools, action plans, safety verdicts and the typed
//! action descriptors each AI persona answers with.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::error::{AlfredError, Result};

/// Lowercases an extension, drops a leading dot and folds aliases
/// (`jpeg` -> `jpg`, `tif` -> `tiff`, `yml` -> `yaml`).
pub fn normalize_ext(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.').to_lowercase();
    match ext.as_str() {
        "jpeg" => "jpg".to_string(),
        "tif" => "tiff".to_string(),
        "yml" => "yaml".to_string(),
        "markdown" => "md".to_string(),
        "htm" => "html".to_string(),
        _ => ext,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Audio,
    Video,
    Document,
    Data,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Image,
        Category::Audio,
        Category::Video,
        Category::Document,
        Category::Data,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Document => "document",
            Category::Data => "data",
        }
    }

    /// Normalized extensions that belong to this category.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Image => &["png", "jpg", "gif", "bmp", "tiff", "webp", "ico", "heic", "svg"],
            Category::Audio => &["mp3", "wav", "flac", "ogg", "aac", "m4a", "opus"],
            Category::Video => &["mp4", "mov", "mkv", "avi", "webm"],
            Category::Document => &["md", "html", "pdf", "docx", "epub", "txt", "rtf"],
            Category::Data => &["json", "csv", "yaml", "toml", "xlsx"],
        }
    }

    /// Category owning a (normalized) extension, if any.
    pub fn of(ext: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| category.extensions().contains(&ext))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversion invocation. Built once from the CLI arguments and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub source_format: String,
    pub target_format: String,
    /// Target extension as the user spelled it (minus dot, lowercased); used for the output name.
    pub target_extension: String,
    pub category: Category,
}

impl ConversionRequest {
    pub fn new(input_path: &Path, target: &str) -> Result<Self> {
        let source_format = input_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(normalize_ext)
            .unwrap_or_default();
        let target_extension = target.trim().trim_start_matches('.').to_lowercase();
        let target_format = normalize_ext(&target_extension);

        if target_format.is_empty() {
            return Err(AlfredError::InvalidInput(
                "Target format must not be empty".to_string(),
            ));
        }

        let category = Category::of(&source_format)
            .or_else(|| Category::of(&target_format))
            .ok_or_else(|| AlfredError::UnsupportedConversion {
                from: source_format.clone(),
                to: target_format.clone(),
            })?;

        Ok(Self {
            input_path: input_path.to_path_buf(),
            source_format,
            target_format,
            target_extension,
            category,
        })
    }

    /// Input path with its extension replaced by the target.
    pub fn output_path(&self) -> PathBuf {
        self.input_path.with_extension(&self.target_extension)
    }
}

/// Every converter Alfred knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    DataCodec,
    ImageCodec,
    Markdown,
    Ffmpeg,
    Pandoc,
    Magick,
    Sips,
    Afconvert,
    Textutil,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::DataCodec => "data-codec",
            Tool::ImageCodec => "image-codec",
            Tool::Markdown => "markdown",
            Tool::Ffmpeg => "ffmpeg",
            Tool::Pandoc => "pandoc",
            Tool::Magick => "magick",
            Tool::Sips => "sips",
            Tool::Afconvert => "afconvert",
            Tool::Textutil => "textutil",
        }
    }

    /// Runs in process, never needs an executable.
    pub fn is_bundled(&self) -> bool {
        matches!(self, Tool::DataCodec | Tool::ImageCodec | Tool::Markdown)
    }

    /// Executable names that satisfy this tool, in order of preference.
    pub fn executables(&self) -> &'static [&'static str] {
        match self {
            Tool::DataCodec | Tool::ImageCodec | Tool::Markdown => &[],
            Tool::Ffmpeg => &["ffmpeg"],
            Tool::Pandoc => &["pandoc"],
            Tool::Magick => &["magick", "convert"],
            Tool::Sips => &["sips"],
            Tool::Afconvert => &["afconvert"],
            Tool::Textutil => &["textutil"],
        }
    }

    /// `alfred install <name>` knows where to fetch it.
    pub fn is_installable(&self) -> bool {
        matches!(self, Tool::Ffmpeg | Tool::Pandoc)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of resolving a supported conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolRequirement {
    pub category: Category,
    pub tool: Tool,
    pub present: bool,
}

impl ToolRequirement {
    pub fn required_tool_name(&self) -> &'static str {
        self.tool.name()
    }

    /// Turns an absent tool into `NeedsInstall`.
    pub fn into_ready(self) -> Result<Self> {
        if self.present {
            Ok(self)
        } else {
            Err(AlfredError::NeedsInstall {
                tool: self.tool.name().to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Rename,
    Organize,
}

impl PlanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::Rename => "rename",
            PlanKind::Organize => "organize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// A proposed set of moves. Only a proposal until a confirm run applies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    pub kind: PlanKind,
    pub entries: Vec<PlanEntry>,
    pub explanation: String,
}

impl ActionPlan {
    pub fn new(kind: PlanKind, explanation: impl Into<String>) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            explanation: explanation.into(),
        }
    }

    pub fn push(&mut self, from: PathBuf, to: PathBuf) {
        self.entries.push(PlanEntry { from, to });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub command_text: String,
    pub blocked: bool,
    pub matched_rule: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    Convert,
    Command,
    Summarize,
    Rename,
    Organize,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Convert => "convert",
            Persona::Command => "command",
            Persona::Summarize => "summarize",
            Persona::Rename => "rename",
            Persona::Organize => "organize",
        }
    }
}

/// An image handed to a vision-capable model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

/// Free text plus optional files, handed to the LLM under one persona.
#[derive(Debug, Clone)]
pub struct AgentInstruction {
    pub persona: Persona,
    pub prompt: String,
    pub images: Vec<ImageAttachment>,
}

impl AgentInstruction {
    pub fn new(persona: Persona, prompt: impl Into<String>) -> Self {
        Self {
            persona,
            prompt: prompt.into(),
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<ImageAttachment>) -> Self {
        self.images = images;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    #[serde(alias = "sh", alias = "shell", alias = "zsh")]
    Bash,
    #[serde(alias = "python3", alias = "py")]
    Python,
}

impl ScriptLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptLanguage::Bash => "bash",
            ScriptLanguage::Python => "python",
        }
    }
}

fn default_language() -> ScriptLanguage {
    ScriptLanguage::Bash
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ConvertAction {
    Convert {
        #[serde(alias = "format", alias = "target")]
        target_format: String,
    },
    Resize {
        width: u32,
        height: u32,
    },
    None {
        #[serde(default)]
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CommandAction {
    Run {
        #[serde(default = "default_language")]
        language: ScriptLanguage,
        code: String,
    },
    None {
        #[serde(default)]
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SummarizeAction {
    Summarize { summary: String },
    None {
        #[serde(default)]
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RenameAction {
    Rename { renames: HashMap<String, String> },
    None {
        #[serde(default)]
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrganizeAction {
    Organize {
        folders: BTreeMap<String, Vec<String>>,
    },
    None {
        #[serde(default)]
        reason: String,
    },
}

//! # Organize
//!
//! Derives a plan that moves the files of a folder into subfolders. Without
//! instructions the files are bucketed by extension; with instructions the
//! organize persona decides, and its answer is validated against the listing.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::application::parsing::parse_action;
use crate::application::plan::is_plain_name;
use crate::application::vision;
use crate::domain::error::{AlfredError, Result};
use crate::domain::traits::LlmProvider;
use crate::domain::types::{ActionPlan, AgentInstruction, OrganizeAction, Persona, PlanKind};
use crate::strings::prompts;

const MAX_IMAGES: usize = 10;
const MAX_LISTED: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileGroup {
    Images,
    Documents,
    Spreadsheets,
    Audio,
    Video,
    Archives,
    Code,
    Data,
    Presentations,
    Design,
    Other,
}

impl FileGroup {
    const GROUPED: [FileGroup; 10] = [
        FileGroup::Images,
        FileGroup::Documents,
        FileGroup::Spreadsheets,
        FileGroup::Audio,
        FileGroup::Video,
        FileGroup::Archives,
        FileGroup::Code,
        FileGroup::Data,
        FileGroup::Presentations,
        FileGroup::Design,
    ];

    /// Folder name the group's files move into.
    pub fn folder(&self) -> &'static str {
        match self {
            FileGroup::Images => "Images",
            FileGroup::Documents => "Documents",
            FileGroup::Spreadsheets => "Spreadsheets",
            FileGroup::Audio => "Audio",
            FileGroup::Video => "Video",
            FileGroup::Archives => "Archives",
            FileGroup::Code => "Code",
            FileGroup::Data => "Data",
            FileGroup::Presentations => "Presentations",
            FileGroup::Design => "Design",
            FileGroup::Other => "Other",
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileGroup::Images => &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp", "svg", "ico", "heic", "heif"],
            FileGroup::Documents => &["pdf", "doc", "docx", "txt", "rtf", "odt", "pages", "tex", "md", "rst", "epub"],
            FileGroup::Spreadsheets => &["csv", "xlsx", "xls", "tsv", "ods", "numbers"],
            FileGroup::Audio => &["mp3", "wav", "flac", "ogg", "aac", "m4a", "wma", "opus"],
            FileGroup::Video => &["mp4", "avi", "mkv", "mov", "webm", "flv", "wmv", "m4v"],
            FileGroup::Archives => &["zip", "tar", "gz", "bz2", "rar", "7z", "xz", "dmg", "iso"],
            FileGroup::Code => &["py", "js", "ts", "html", "css", "java", "c", "cpp", "h", "swift", "go", "rs", "rb", "sh"],
            FileGroup::Data => &["json", "xml", "yaml", "yml", "toml", "sql", "db", "sqlite"],
            FileGroup::Presentations => &["ppt", "pptx", "key", "odp"],
            FileGroup::Design => &["psd", "ai", "sketch", "fig", "xd"],
            FileGroup::Other => &[],
        }
    }

    pub fn of(file_name: &str) -> FileGroup {
        let ext = Path::new(file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        FileGroup::GROUPED
            .into_iter()
            .find(|group| group.extensions().contains(&ext.as_str()))
            .unwrap_or(FileGroup::Other)
    }
}

/// Visible regular files directly inside `folder`, sorted by name.
pub fn list_files(folder: &Path) -> Result<Vec<String>> {
    if !folder.is_dir() {
        return Err(AlfredError::InvalidInput(format!(
            "Directory not found: {}",
            folder.display()
        )));
    }
    let entries = std::fs::read_dir(folder).map_err(|e| AlfredError::io(folder, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AlfredError::io(folder, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_file() {
            continue;
        }
        files.push(name);
    }
    files.sort();
    Ok(files)
}

fn plan_from_folders(folder: &Path, folders: &BTreeMap<String, Vec<String>>, explanation: &str) -> ActionPlan {
    let mut plan = ActionPlan::new(PlanKind::Organize, explanation);
    for (name, files) in folders {
        for file in files {
            plan.push(folder.join(file), folder.join(name).join(file));
        }
    }
    plan
}

/// Buckets by [`FileGroup`]; folders and files come out sorted by name.
pub fn categorical_plan(folder: &Path, files: &[String]) -> ActionPlan {
    let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in files {
        buckets
            .entry(FileGroup::of(file).folder().to_string())
            .or_default()
            .push(file.clone());
    }
    for bucket in buckets.values_mut() {
        bucket.sort();
    }
    plan_from_folders(folder, &buckets, "grouped by file type")
}

/// Keep only moves that name a single folder component and a listed file,
/// each file at most once.
pub fn validate_folders(folders: BTreeMap<String, Vec<String>>, files: &[String]) -> BTreeMap<String, Vec<String>> {
    let listed: HashSet<&str> = files.iter().map(String::as_str).collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut valid = BTreeMap::new();

    for (name, members) in folders {
        let name = name.trim().to_string();
        if !is_plain_name(&name) {
            tracing::warn!("Dropping folder {:?}: not a single folder name", name);
            continue;
        }
        let mut kept = Vec::new();
        for member in members {
            if !listed.contains(member.as_str()) {
                tracing::warn!("Dropping {:?} from {}: not in the folder", member, name);
                continue;
            }
            if !placed.insert(member.clone()) {
                tracing::warn!("Dropping {:?} from {}: already placed", member, name);
                continue;
            }
            kept.push(member);
        }
        if !kept.is_empty() {
            valid.insert(name, kept);
        }
    }
    valid
}

async fn ai_plan(folder: &Path, files: &[String], instructions: &str, llm: &dyn LlmProvider) -> Result<ActionPlan> {
    let image_paths: Vec<PathBuf> = files
        .iter()
        .map(|f| folder.join(f))
        .filter(|p| vision::is_image(p))
        .collect();
    let images = vision::load_images(image_paths.iter().map(PathBuf::as_path), MAX_IMAGES);

    let listed: Vec<String> = files.iter().take(MAX_LISTED).cloned().collect();
    let prompt = prompts::organize_prompt(
        &folder.display().to_string(),
        &listed,
        instructions,
        !images.is_empty(),
    );
    let instruction = AgentInstruction::new(Persona::Organize, prompt).with_images(images);
    let response = llm.complete(&instruction).await?;

    match parse_action::<OrganizeAction>(&response)? {
        OrganizeAction::Organize { folders } => {
            let folders = validate_folders(folders, files);
            Ok(plan_from_folders(folder, &folders, instructions))
        }
        OrganizeAction::None { reason } => {
            tracing::info!("Organize persona declined: {}", reason);
            Ok(ActionPlan::new(PlanKind::Organize, reason))
        }
    }
}

/// Plan for `folder`. Derivation never touches the disk beyond reading it.
pub async fn derive_plan(
    folder: &Path,
    files: &[String],
    instructions: Option<&str>,
    llm: &dyn LlmProvider,
) -> Result<ActionPlan> {
    match instructions.map(str::trim).filter(|i| !i.is_empty()) {
        Some(instructions) => ai_plan(folder, files, instructions, llm).await,
        None => Ok(categorical_plan(folder, files)),
    }
}

//! # Messages
//!
//! Contains constant strings and format functions for user-facing messages.
//! The sentinel lines (`Plan:`, `Preview only`, `[NEED_INSTALL]`, `[ERR]`)
//! are matched by callers that script Alfred, so they never change.

pub const PLAN_HEADER: &str = "Plan:";
pub const PREVIEW_ONLY: &str = "Preview only. Use --confirm to execute.";
pub const NEED_INSTALL_PREFIX: &str = "[NEED_INSTALL]";
pub const ERR_PREFIX: &str = "[ERR]";

pub const NO_RENAMES_NEEDED: &str = "No renames needed.";
pub const NOTHING_TO_ORGANIZE: &str = "Folder is empty. Nothing to organize.";
pub const NO_FILES_TO_MOVE: &str = "No files to move.";
pub const NO_READABLE_FILES: &str = "No readable files.";
pub const NO_VALID_FILES: &str = "No valid files.";
pub const OUTPUT_EMPTY_WARNING: &str = "Warning: Output file is empty.";

pub fn need_install(tool: &str) -> String {
    format!("{NEED_INSTALL_PREFIX} {tool}")
}

pub fn err_line(message: &str) -> String {
    format!("{ERR_PREFIX} {message}")
}

pub fn plan_id_line(plan_id: &str) -> String {
    format!("Plan-Id: {plan_id}")
}

pub fn converting(input: &str, target: &str, tool: &str) -> String {
    format!("Converting {input} -> .{target} using {tool}...")
}

pub fn converted(output: &str, size: u64) -> String {
    format!("Output: {output} ({})", human_size(size))
}

pub fn organize_summary(moves: usize, folders: usize) -> String {
    format!("{PLAN_HEADER} Move {moves} file(s) into {folders} folder(s):")
}

pub fn rename_line(old: &str, new: &str) -> String {
    format!("  {old} -> {new}")
}

pub fn more_files(count: usize) -> String {
    format!("    ... and {count} more")
}

pub fn applied_summary(verb: &str, applied: usize, skipped: usize) -> String {
    if skipped == 0 {
        format!("Done. {verb} {applied} file(s).")
    } else {
        format!("Done. {verb} {applied} file(s), skipped {skipped}.")
    }
}

pub fn skipped(from: &str, reason: &str) -> String {
    format!("Skipped {from}: {reason}")
}

pub fn partial_failure(applied: usize, from: &str, reason: &str) -> String {
    format!("Stopped after {applied} change(s): {from} failed: {reason}")
}

pub fn summarizing(count: usize) -> String {
    format!("Summarizing {count} file(s)...")
}

pub fn analyzing(count: usize, images: usize) -> String {
    if images > 0 {
        format!("Analyzing {images} image(s) with vision...")
    } else {
        format!("Analyzing {count} file(s)...")
    }
}

pub fn running(language: &str, code: &str) -> String {
    format!("Running {language}:\n{code}")
}

pub fn blocked(rule: &str, command: &str) -> String {
    format!("Refused to run (matched `{rule}`):\n{command}")
}

pub fn downloading(tool: &str, url: &str) -> String {
    format!("Downloading {tool} from {url}...")
}

pub fn download_progress(received: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => format!(
            "  {} / {} ({}%)",
            human_size(received),
            human_size(total),
            (received * 100 / total).min(100)
        ),
        _ => format!("  {}", human_size(received)),
    }
}

pub fn installed(tool: &str, path: &str) -> String {
    format!("Installed {tool} to {path}")
}

pub fn unknown_tool(tool: &str, available: &[&str]) -> String {
    format!("Unknown tool '{tool}'. Available: {}", available.join(", "))
}

/// `512 B`, `1.5 KB`, `3.2 MB`, ...
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return if unit == "B" {
                format!("{size:.0} {unit}")
            } else {
                format!("{size:.1} {unit}")
            };
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

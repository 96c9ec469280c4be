//! # Reporter
//!
//! Every user-visible line goes through here. Handlers emit structured
//! [`Event`]s; the reporter renders them as the human sentinels or as one
//! JSON object per line. `[ERR]` lines always go to stderr.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::error::AlfredError;
use crate::domain::paths::display_name;
use crate::domain::types::{ActionPlan, PlanKind};
use crate::infrastructure::tools::executor::CommandOutput;
use crate::interface::cli::OutputFormat;
use crate::strings::messages;

const PREVIEW_FILES_PER_FOLDER: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryView {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Converting { input: String, target: String, tool: String },
    Converted { output: String, size: u64 },
    NeedInstall { tool: String },
    Plan {
        kind: PlanKind,
        plan_id: String,
        explanation: String,
        entries: Vec<EntryView>,
    },
    PreviewOnly { plan_id: String },
    Applied { from: String, to: String },
    Skipped { from: String, reason: String },
    Blocked { rule: String, command: String },
    Running { language: String, code: String },
    CommandOutput { stdout: String, stderr: String, exit_code: Option<i32> },
    Summary { text: String },
    Message { text: String },
    Error { kind: String, message: String },
}

impl Event {
    pub fn message(text: impl Into<String>) -> Self {
        Event::Message { text: text.into() }
    }

    pub fn plan(plan: &ActionPlan, plan_id: &str) -> Self {
        Event::Plan {
            kind: plan.kind,
            plan_id: plan_id.to_string(),
            explanation: plan.explanation.clone(),
            entries: plan
                .entries
                .iter()
                .map(|e| EntryView {
                    from: e.from.display().to_string(),
                    to: e.to.display().to_string(),
                })
                .collect(),
        }
    }

    pub fn command_output(output: &CommandOutput) -> Self {
        Event::CommandOutput {
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
            exit_code: output.exit_code,
        }
    }
}

fn name_of(path: &str) -> String {
    display_name(Path::new(path))
}

/// Parent folder name of a plan destination.
fn folder_of(path: &str) -> String {
    Path::new(path)
        .parent()
        .map(display_name)
        .unwrap_or_default()
}

/// `new.jpg` for a rename in place, `Folder/file.jpg` for a move.
fn short_destination(from: &str, to: &str) -> String {
    let (from, to) = (Path::new(from), Path::new(to));
    if from.parent() == to.parent() {
        display_name(to)
    } else {
        format!("{}/{}", to.parent().map(display_name).unwrap_or_default(), display_name(to))
    }
}

fn render_plan(kind: PlanKind, plan_id: &str, entries: &[EntryView]) -> Vec<String> {
    let mut lines = Vec::new();
    match kind {
        PlanKind::Organize => {
            let mut folders: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for entry in entries {
                folders.entry(folder_of(&entry.to)).or_default().push(name_of(&entry.from));
            }
            lines.push(messages::organize_summary(entries.len(), folders.len()));
            for (folder, files) in &folders {
                lines.push(format!("  {folder}/"));
                for file in files.iter().take(PREVIEW_FILES_PER_FOLDER) {
                    lines.push(format!("    {file}"));
                }
                if files.len() > PREVIEW_FILES_PER_FOLDER {
                    lines.push(messages::more_files(files.len() - PREVIEW_FILES_PER_FOLDER));
                }
            }
        }
        PlanKind::Rename => {
            lines.push(messages::PLAN_HEADER.to_string());
            for entry in entries {
                lines.push(messages::rename_line(&name_of(&entry.from), &name_of(&entry.to)));
            }
        }
    }
    lines.push(messages::plan_id_line(plan_id));
    lines
}

/// Human rendering of an event; `None` for events that only exist in JSON.
fn render_human(event: &Event) -> Option<String> {
    let text = match event {
        Event::Converting { input, target, tool } => messages::converting(&name_of(input), target, tool),
        Event::Converted { output, size } if *size == 0 => {
            format!("Output: {output}\n{}", messages::OUTPUT_EMPTY_WARNING)
        }
        Event::Converted { output, size } => messages::converted(output, *size),
        Event::NeedInstall { tool } => messages::need_install(tool),
        Event::Plan { kind, plan_id, entries, .. } => render_plan(*kind, plan_id, entries).join("\n"),
        Event::PreviewOnly { .. } => messages::PREVIEW_ONLY.to_string(),
        Event::Applied { from, to } => messages::rename_line(&name_of(from), &short_destination(from, to)),
        Event::Skipped { from, reason } => messages::skipped(&name_of(from), reason),
        Event::Blocked { rule, command } => messages::blocked(rule, command),
        Event::Running { language, code } => messages::running(language, code),
        Event::CommandOutput { stdout, stderr, exit_code } => {
            let output = CommandOutput {
                stdout: stdout.clone(),
                stderr: stderr.clone(),
                exit_code: *exit_code,
            };
            let text = output.format();
            if text.is_empty() {
                return None;
            }
            text
        }
        Event::Summary { text } | Event::Message { text } => text.clone(),
        Event::Error { .. } => return None,
    };
    Some(text)
}

pub struct Reporter {
    format: OutputFormat,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            out: Box::new(std::io::stdout()),
            err: Box::new(std::io::stderr()),
        }
    }

    pub fn with_writers(format: OutputFormat, out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self { format, out, err }
    }

    pub fn emit(&mut self, event: Event) {
        let line = match self.format {
            OutputFormat::Human => render_human(&event),
            OutputFormat::Json => match serde_json::to_string(&event) {
                Ok(json) => Some(json),
                Err(e) => {
                    tracing::error!("Failed to serialize event {:?}: {}", event, e);
                    None
                }
            },
        };
        if let Some(line) = line {
            if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
                tracing::warn!("stdout write failed: {}", e);
            }
        }
    }

    /// Report a terminal error: `[NEED_INSTALL]` where it applies, then one `[ERR]` line.
    pub fn fail(&mut self, error: &anyhow::Error) {
        let domain = error.downcast_ref::<AlfredError>();
        if let Some(AlfredError::NeedsInstall { tool }) = domain {
            self.emit(Event::NeedInstall { tool: tool.clone() });
        }

        let message = format!("{error:#}");
        tracing::error!("{}", message);
        if self.format == OutputFormat::Json {
            self.emit(Event::Error {
                kind: domain.map(AlfredError::kind).unwrap_or("internal").to_string(),
                message: message.clone(),
            });
        }
        if let Err(e) = writeln!(self.err, "{}", messages::err_line(&message)).and_then(|_| self.err.flush()) {
            tracing::warn!("stderr write failed: {}", e);
        }
    }
}

#[cfg(test)]
pub mod capture {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory stdout/stderr pair for end-to-end handler tests.
    #[derive(Clone, Default)]
    pub struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    pub fn reporter(format: OutputFormat) -> (Reporter, Buffer, Buffer) {
        let (out, err) = (Buffer::default(), Buffer::default());
        let reporter = Reporter::with_writers(format, Box::new(out.clone()), Box::new(err.clone()));
        (reporter, out, err)
    }
}

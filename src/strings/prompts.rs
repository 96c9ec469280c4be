//! # Prompts
//!
//! Persona templates live in `prompts/*.md` and are filled through
//! [`PromptRenderer`].

/// A builder for rendering prompts with context.
pub struct PromptRenderer<'a> {
    template: &'a str,
    replacements: Vec<(&'a str, String)>,
}

impl<'a> PromptRenderer<'a> {
    pub fn new(template: &'a str) -> Self {
        Self {
            template,
            replacements: Vec::new(),
        }
    }

    pub fn set(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.replacements.push((key, value.into()));
        self
    }

    pub fn render(self) -> String {
        let mut result = self.template.to_string();
        for (key, value) in &self.replacements {
            result = result.replace(key, value);
        }

        // Checked against the template: file contents may legitimately hold `{{`.
        let mut rest = self.template;
        while let Some(start) = rest.find("{{") {
            let Some(end) = rest[start..].find("}}") else { break };
            let placeholder = &rest[start..start + end + 2];
            if !self.replacements.iter().any(|(key, _)| *key == placeholder) {
                tracing::error!(
                    "Alfred: [PROMPT RENDER ERROR] Unreplaced placeholder found in output: {}",
                    placeholder
                );
            }
            rest = &rest[start + end + 2..];
        }

        result
    }
}

pub const CONVERT_TEMPLATE: &str = include_str!("../../prompts/convert.md");
pub const COMMAND_TEMPLATE: &str = include_str!("../../prompts/command.md");
pub const SUMMARIZE_TEMPLATE: &str = include_str!("../../prompts/summarize.md");
pub const RENAME_TEMPLATE: &str = include_str!("../../prompts/rename.md");
pub const ORGANIZE_TEMPLATE: &str = include_str!("../../prompts/organize.md");

const RENAME_VISION_NOTE: &str = " The images are attached: name each one after what it actually shows (objects, scenes, text).";
const ORGANIZE_VISION_NOTE: &str = " Some images are attached: use what they actually show, not just their filenames.";

/// Sent as the system message ahead of every persona prompt.
pub fn system_prompt(persona: &str) -> String {
    format!(
        "You are Alfred, a file assistant acting as the {persona} persona. \
         Answer exactly in the format the request asks for."
    )
}

/// Files shown to a persona, as a JSON string list.
fn file_list(files: &[String]) -> String {
    serde_json::to_string(files).unwrap_or_else(|_| files.join(", "))
}

pub fn convert_prompt(file_name: &str, source_format: &str, instruction: &str, known_formats: &[&str]) -> String {
    PromptRenderer::new(CONVERT_TEMPLATE)
        .set("{{FILE_NAME}}", file_name)
        .set("{{SOURCE_FORMAT}}", source_format)
        .set("{{INSTRUCTION}}", instruction)
        .set("{{KNOWN_FORMATS}}", known_formats.join(", "))
        .render()
}

pub fn command_prompt(instruction: &str, files: &[String], workdir: &str) -> String {
    let files = if files.is_empty() {
        "(none)".to_string()
    } else {
        file_list(files)
    };
    PromptRenderer::new(COMMAND_TEMPLATE)
        .set("{{INSTRUCTION}}", instruction)
        .set("{{FILES}}", files)
        .set("{{WORKDIR}}", workdir)
        .render()
}

pub fn summarize_prompt(contents: &[String]) -> String {
    PromptRenderer::new(SUMMARIZE_TEMPLATE)
        .set("{{CONTENTS}}", contents.join("\n\n"))
        .render()
}

pub fn rename_prompt(file_names: &[String], with_images: bool) -> String {
    PromptRenderer::new(RENAME_TEMPLATE)
        .set("{{VISION_NOTE}}", if with_images { RENAME_VISION_NOTE } else { "" })
        .set("{{FILES}}", file_list(file_names))
        .render()
}

pub fn organize_prompt(folder: &str, file_names: &[String], instructions: &str, with_images: bool) -> String {
    PromptRenderer::new(ORGANIZE_TEMPLATE)
        .set("{{VISION_NOTE}}", if with_images { ORGANIZE_VISION_NOTE } else { "" })
        .set("{{FOLDER}}", folder)
        .set("{{FILES}}", file_list(file_names))
        .set("{{INSTRUCTIONS}}", instructions)
        .render()
}

//! # Parsing Utils
//!
//! Turns raw LLM answers into the typed action descriptors of each persona.
//! Models are asked for a tagged JSON object; older prompt styles (a bare
//! rename map, a bare folder map, a fenced code block, plain prose) are
//! accepted as fallbacks.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use crate::domain::error::{AlfredError, Result};
use crate::domain::types::{
    CommandAction, ConvertAction, OrganizeAction, Persona, RenameAction, ScriptLanguage,
    SummarizeAction,
};

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("static pattern"));

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9]*)[ \t]*\r?\n(.*?)```").expect("static pattern")
});

/// Removes reasoning blocks some local models emit before the answer.
pub fn strip_think(text: &str) -> String {
    let without = THINK_BLOCK.replace_all(text, "");
    // Chat templates sometimes open the block themselves, leaving only the close tag.
    let without = match without.rfind("</think>") {
        Some(end) => &without[end + "</think>".len()..],
        None => &without[..],
    };
    // An unterminated block swallows the rest.
    let without = match without.find("<think>") {
        Some(start) => &without[..start],
        None => without,
    };
    without.trim().to_string()
}

/// The outermost `{...}` span, which also sees through ```json fences.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// First fenced code block as (language, code). Unlabelled blocks count as bash.
pub fn extract_code_block(text: &str) -> Option<(ScriptLanguage, String)> {
    CODE_BLOCK.captures_iter(text).find_map(|caps| {
        let label = caps.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
        let code = caps.get(2)?.as_str().trim().to_string();
        if code.is_empty() {
            return None;
        }
        let language = match label.as_str() {
            "" | "bash" | "sh" | "shell" | "zsh" => ScriptLanguage::Bash,
            "python" | "python3" | "py" => ScriptLanguage::Python,
            _ => return None,
        };
        Some((language, code))
    })
}

/// A persona's answer type, with a fallback for untagged answers.
pub trait PersonaAction: DeserializeOwned + Sized {
    const PERSONA: Persona;

    /// Interpret an answer that did not match the tagged schema.
    fn fallback(text: &str, json: Option<&Value>) -> Option<Self>;
}

fn string_map(value: &Value) -> Option<HashMap<String, String>> {
    let object = value.as_object()?;
    object
        .iter()
        .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}

fn folder_map(value: &Value) -> Option<BTreeMap<String, Vec<String>>> {
    let object = value.as_object()?;
    object
        .iter()
        .map(|(folder, files)| {
            let files = files
                .as_array()?
                .iter()
                .map(|f| f.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()?;
            Some((folder.clone(), files))
        })
        .collect()
}

impl PersonaAction for ConvertAction {
    const PERSONA: Persona = Persona::Convert;

    fn fallback(_text: &str, json: Option<&Value>) -> Option<Self> {
        let json = json?;
        if let (Some(width), Some(height)) = (
            json.get("width").and_then(Value::as_u64),
            json.get("height").and_then(Value::as_u64),
        ) {
            return Some(ConvertAction::Resize {
                width: u32::try_from(width).ok()?,
                height: u32::try_from(height).ok()?,
            });
        }
        json.get("target_format")
            .or_else(|| json.get("format"))
            .and_then(Value::as_str)
            .map(|format| ConvertAction::Convert {
                target_format: format.to_string(),
            })
    }
}

impl PersonaAction for CommandAction {
    const PERSONA: Persona = Persona::Command;

    fn fallback(text: &str, json: Option<&Value>) -> Option<Self> {
        if let Some(code) = json.and_then(|j| j.get("code")).and_then(Value::as_str) {
            let language = json
                .and_then(|j| j.get("language"))
                .and_then(|l| serde_json::from_value(l.clone()).ok())
                .unwrap_or(ScriptLanguage::Bash);
            return Some(CommandAction::Run {
                language,
                code: code.to_string(),
            });
        }
        extract_code_block(text).map(|(language, code)| CommandAction::Run { language, code })
    }
}

impl PersonaAction for SummarizeAction {
    const PERSONA: Persona = Persona::Summarize;

    fn fallback(text: &str, json: Option<&Value>) -> Option<Self> {
        if let Some(json) = json {
            return json
                .get("summary")
                .and_then(Value::as_str)
                .map(|summary| SummarizeAction::Summarize {
                    summary: summary.to_string(),
                });
        }
        let text = text.trim();
        (!text.is_empty()).then(|| SummarizeAction::Summarize {
            summary: text.to_string(),
        })
    }
}

impl PersonaAction for RenameAction {
    const PERSONA: Persona = Persona::Rename;

    fn fallback(_text: &str, json: Option<&Value>) -> Option<Self> {
        let json = json?;
        let renames = json
            .get("renames")
            .and_then(string_map)
            .or_else(|| string_map(json))?;
        Some(RenameAction::Rename { renames })
    }
}

impl PersonaAction for OrganizeAction {
    const PERSONA: Persona = Persona::Organize;

    fn fallback(_text: &str, json: Option<&Value>) -> Option<Self> {
        let json = json?;
        let folders = json
            .get("folders")
            .and_then(folder_map)
            .or_else(|| folder_map(json))?;
        Some(OrganizeAction::Organize { folders })
    }
}

fn preview(text: &str) -> String {
    let mut snippet: String = text.chars().take(200).collect();
    if text.chars().count() > 200 {
        snippet.push_str("...");
    }
    snippet
}

/// Parse a raw answer into the persona's action type.
pub fn parse_action<T: PersonaAction>(response: &str) -> Result<T> {
    let cleaned = strip_think(response);
    let json = extract_json_object(&cleaned).and_then(|raw| serde_json::from_str::<Value>(raw).ok());

    if let Some(value) = &json {
        if let Ok(action) = serde_json::from_value::<T>(value.clone()) {
            return Ok(action);
        }
    }

    if let Some(action) = T::fallback(&cleaned, json.as_ref()) {
        tracing::warn!(
            "{} persona answered outside the tagged schema; used fallback parsing",
            T::PERSONA.as_str()
        );
        return Ok(action);
    }

    Err(AlfredError::InvalidResponse(format!(
        "{} answer had no usable action: {}",
        T::PERSONA.as_str(),
        preview(&cleaned)
    )))
}

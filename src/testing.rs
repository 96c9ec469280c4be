//! Test doubles shared by the unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::error::{AlfredError, Result};
use crate::domain::traits::{LlmProvider, ToolLocator};
use crate::domain::types::AgentInstruction;

/// Answers with canned responses, in order, and records what it was asked.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<AgentInstruction>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn instructions(&self) -> Vec<AgentInstruction> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, instruction: &AgentInstruction) -> Result<String> {
        self.seen.lock().unwrap().push(instruction.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AlfredError::provider("scripted", "no more responses"))
    }
}

/// Reports a fixed set of executables as installed.
pub struct StaticLocator(pub HashSet<&'static str>);

impl StaticLocator {
    pub fn with(executables: &[&'static str]) -> Self {
        Self(executables.iter().copied().collect())
    }

    pub fn none() -> Self {
        Self(HashSet::new())
    }
}

impl ToolLocator for StaticLocator {
    fn is_available(&self, executable: &str) -> bool {
        self.0.contains(executable)
    }
}

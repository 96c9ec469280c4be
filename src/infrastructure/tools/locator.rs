//! Tool presence on the host: Alfred's local `bin/` first, then `PATH`.

use std::path::PathBuf;

use crate::domain::traits::ToolLocator;

#[derive(Debug, Clone)]
pub struct SystemLocator {
    local_bin: PathBuf,
}

impl SystemLocator {
    pub fn new(local_bin: PathBuf) -> Self {
        Self { local_bin }
    }
}

impl ToolLocator for SystemLocator {
    fn is_available(&self, executable: &str) -> bool {
        self.local_bin.join(executable).is_file() || which::which(executable).is_ok()
    }
}

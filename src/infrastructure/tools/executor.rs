//! # Tool Executor
//!
//! Spawns external converters and generated scripts. Alfred's local `bin/`
//! is searched before `PATH`, output is captured, and every child is killed
//! when it outlives the configured timeout.

use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::domain::error::{AlfredError, Result};

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout, then stderr and a non-zero exit code when present.
    pub fn format(&self) -> String {
        let mut result = self.stdout.trim_end().to_string();
        if !self.stderr.trim().is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str("--- STDERR ---\n");
            result.push_str(self.stderr.trim_end());
        }
        if !self.success() {
            let code = self
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&format!("[Exit Code: {code}]"));
        }
        result
    }

    /// Last few non-empty stderr lines, or stdout when stderr is silent.
    pub fn diagnostic(&self) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let tail: Vec<&str> = source
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        let start = tail.len().saturating_sub(5);
        let text = tail[start..].join("\n");
        if text.is_empty() {
            format!("exited with status {:?}", self.exit_code)
        } else {
            text
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolExecutor {
    local_bin: PathBuf,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(local_bin: PathBuf, timeout_secs: u64) -> Self {
        Self {
            local_bin,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// `PATH` with the local bin directory in front.
    fn search_path(&self) -> OsString {
        let mut dirs = vec![self.local_bin.clone()];
        if let Some(path) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path));
        }
        std::env::join_paths(dirs).unwrap_or_else(|_| self.local_bin.clone().into_os_string())
    }

    /// Full path of an executable, looking in the local bin first.
    pub fn resolve_program(&self, name: &str) -> Option<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in(name, Some(self.search_path()), cwd).ok()
    }

    /// Run a program directly with the given arguments.
    pub async fn run_program<S: AsRef<OsStr>>(&self, program: &str, args: &[S]) -> Result<CommandOutput> {
        let resolved = self
            .resolve_program(program)
            .ok_or_else(|| AlfredError::Execution(format!("{program}: command not found")))?;

        let mut cmd = Command::new(resolved);
        cmd.args(args);
        self.run(program, cmd).await
    }

    /// Run a shell snippet with `sh -c`.
    pub async fn run_shell(&self, script: &str) -> Result<CommandOutput> {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", script]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", script]);
            c
        };
        cmd.env("PATH", self.search_path());
        self.run("sh", cmd).await
    }

    /// Run Python source from a temporary script file.
    pub async fn run_python(&self, source: &str) -> Result<CommandOutput> {
        let interpreter = ["python3", "python"]
            .into_iter()
            .find_map(|name| self.resolve_program(name))
            .ok_or_else(|| AlfredError::Execution("python3 not found".to_string()))?;

        let mut script = tempfile::Builder::new()
            .prefix("alfred-")
            .suffix(".py")
            .tempfile()
            .map_err(|e| AlfredError::io(std::env::temp_dir(), e))?;
        script
            .write_all(source.as_bytes())
            .map_err(|e| AlfredError::io(script.path(), e))?;

        let mut cmd = Command::new(interpreter);
        cmd.arg(script.path());
        cmd.env("PATH", self.search_path());
        // `script` must outlive the child
        let output = self.run("python", cmd).await;
        drop(script);
        output
    }

    async fn run(&self, label: &str, mut cmd: Command) -> Result<CommandOutput> {
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::info!("Running {label}: {:?}", cmd.as_std());
        let child = cmd
            .spawn()
            .map_err(|e| AlfredError::Execution(format!("Failed to start {label}: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AlfredError::Execution(format!(
                    "{label} timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AlfredError::Execution(format!("{label} did not finish: {e}")))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        tracing::info!("{label} exited with {:?}", result.exit_code);
        Ok(result)
    }
}

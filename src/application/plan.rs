//! # Plan / Confirm Workflow
//!
//! Rename and organize never touch the disk on their first pass. A plan is
//! derived, shown, and only applied by a separate run carrying `--confirm`.
//! Plans are not stored; the confirm run re-derives them from the same
//! inputs. The fingerprint lets a caller insist the plan did not drift.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::domain::error::{AlfredError, Result};
use crate::domain::types::{ActionPlan, PlanEntry};

const FINGERPRINT_LEN: usize = 12;

/// Short, stable identifier of a plan's kind and moves.
pub fn fingerprint(plan: &ActionPlan) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plan.kind.as_str().as_bytes());
    for entry in &plan.entries {
        hasher.update([0u8]);
        hasher.update(entry.from.as_os_str().as_encoded_bytes());
        hasher.update([0u8]);
        hasher.update(entry.to.as_os_str().as_encoded_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Unresolved,
    Previewed { plan_id: String },
    Confirmed { plan_id: String },
    Aborted { reason: String },
}

/// Tracks one invocation through preview and, optionally, confirmation.
#[derive(Debug)]
pub struct Workflow {
    state: WorkflowState,
    plan: Option<ActionPlan>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Unresolved,
            plan: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn plan(&self) -> Option<&ActionPlan> {
        self.plan.as_ref()
    }

    /// Record a freshly derived plan. Returns its fingerprint.
    pub fn preview(&mut self, plan: ActionPlan) -> String {
        let plan_id = fingerprint(&plan);
        tracing::info!(
            "Previewed {} plan {} ({} entries)",
            plan.kind.as_str(),
            plan_id,
            plan.entries.len()
        );
        self.state = WorkflowState::Previewed {
            plan_id: plan_id.clone(),
        };
        self.plan = Some(plan);
        plan_id
    }

    /// Move to `Confirmed`, checking `expected` against the previewed plan when given.
    pub fn confirm(&mut self, expected: Option<&str>) -> Result<&ActionPlan> {
        let plan_id = match &self.state {
            WorkflowState::Previewed { plan_id } => plan_id.clone(),
            other => {
                return Err(AlfredError::InvalidInput(format!(
                    "Cannot confirm a plan in state {other:?}"
                )));
            }
        };

        if let Some(expected) = expected {
            if !plan_id.starts_with(expected.trim()) || expected.trim().is_empty() {
                let err = AlfredError::StalePlan {
                    expected: expected.to_string(),
                    actual: plan_id.clone(),
                };
                self.abort(err.to_string());
                return Err(err);
            }
        }

        self.state = WorkflowState::Confirmed { plan_id };
        self.plan
            .as_ref()
            .ok_or_else(|| AlfredError::InvalidInput("No plan to confirm".to_string()))
    }

    pub fn abort(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!("Workflow aborted: {}", reason);
        self.state = WorkflowState::Aborted { reason };
        self.plan = None;
    }
}

/// What happened when a confirmed plan ran.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub applied: Vec<PlanEntry>,
    pub skipped: Vec<(PlanEntry, String)>,
    pub failed: Option<(PlanEntry, String)>,
}

fn skip_reason(entry: &PlanEntry) -> Option<String> {
    if !entry.from.exists() {
        return Some(format!("{} no longer exists", entry.from.display()));
    }
    if entry.to.exists() {
        return Some(format!("{} already exists", entry.to.display()));
    }
    None
}

fn move_entry(entry: &PlanEntry) -> std::io::Result<()> {
    if let Some(parent) = entry.to.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::rename(&entry.from, &entry.to)
}

/// Apply entries in order. Never overwrites. Stops at the first failure.
pub fn apply_plan(plan: &ActionPlan, mut on_entry: impl FnMut(&PlanEntry, Outcome<'_>)) -> ApplyReport {
    let mut report = ApplyReport::default();

    for entry in &plan.entries {
        if let Some(reason) = skip_reason(entry) {
            tracing::warn!("Skipping {}: {}", entry.from.display(), reason);
            on_entry(entry, Outcome::Skipped(&reason));
            report.skipped.push((entry.clone(), reason));
            continue;
        }

        match move_entry(entry) {
            Ok(()) => {
                tracing::info!("Moved {} -> {}", entry.from.display(), entry.to.display());
                on_entry(entry, Outcome::Applied);
                report.applied.push(entry.clone());
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!("Failed to move {}: {}", entry.from.display(), message);
                on_entry(entry, Outcome::Failed(&message));
                report.failed = Some((entry.clone(), message));
                break;
            }
        }
    }

    report
}

/// Per-entry result handed to the `apply_plan` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    Applied,
    Skipped(&'a str),
    Failed(&'a str),
}

/// Plain file name: no separators, not `.` or `..`, not empty.
pub fn is_plain_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && Path::new(name).file_name().is_some_and(|n| n == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::PlanKind;
    use tempfile::TempDir;

    fn plan_in(dir: &Path, moves: &[(&str, &str)]) -> ActionPlan {
        let mut plan = ActionPlan::new(PlanKind::Organize, "test");
        for (from, to) in moves {
            plan.push(dir.join(from), dir.join(to));
        }
        plan
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let dir = Path::new("/photos");
        let a = plan_in(dir, &[("a.jpg", "Images/a.jpg")]);
        let b = plan_in(dir, &[("a.jpg", "Images/a.jpg")]);
        let c = plan_in(dir, &[("a.jpg", "Pictures/a.jpg")]);

        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
        assert_eq!(fingerprint(&a).len(), 12);

        let mut renamed = a.clone();
        renamed.kind = PlanKind::Rename;
        assert_ne!(fingerprint(&a), fingerprint(&renamed));
    }

    #[test]
    fn test_workflow_transitions() {
        let mut workflow = Workflow::new();
        assert_eq!(workflow.state(), &WorkflowState::Unresolved);
        assert!(workflow.confirm(None).is_err());

        let plan = plan_in(Path::new("/x"), &[("a", "b")]);
        let id = workflow.preview(plan.clone());
        assert_eq!(workflow.state(), &WorkflowState::Previewed { plan_id: id.clone() });

        let confirmed = workflow.confirm(Some(&id)).unwrap();
        assert_eq!(confirmed, &plan);
        assert_eq!(workflow.state(), &WorkflowState::Confirmed { plan_id: id });
    }

    #[test]
    fn test_confirm_rejects_drifted_plan() {
        let mut workflow = Workflow::new();
        workflow.preview(plan_in(Path::new("/x"), &[("a", "b")]));

        let err = workflow.confirm(Some("deadbeef0000")).unwrap_err();
        assert!(matches!(err, AlfredError::StalePlan { .. }));
        assert!(matches!(workflow.state(), WorkflowState::Aborted { .. }));
    }

    #[test]
    fn test_apply_moves_and_creates_folders() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("b.png"), "b").unwrap();

        let plan = plan_in(dir.path(), &[("a.txt", "Docs/a.txt"), ("b.png", "Images/b.png")]);
        let mut seen = Vec::new();
        let report = apply_plan(&plan, |entry, outcome| {
            seen.push((entry.to.clone(), outcome == Outcome::Applied));
        });

        assert!(report.failed.is_none());
        assert_eq!(report.applied.len(), 2);
        assert!(dir.path().join("Docs/a.txt").exists());
        assert!(dir.path().join("Images/b.png").exists());
        assert!(!dir.path().join("a.txt").exists());
        assert!(seen.iter().all(|(_, ok)| *ok));
    }

    #[test]
    fn test_apply_never_overwrites() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("old.txt"), "old").unwrap();
        std::fs::write(dir.path().join("new.txt"), "keep me").unwrap();

        let plan = plan_in(dir.path(), &[("old.txt", "new.txt"), ("gone.txt", "x.txt")]);
        let report = apply_plan(&plan, |_, _| {});

        assert!(report.applied.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(std::fs::read_to_string(dir.path().join("new.txt")).unwrap(), "keep me");
        assert!(dir.path().join("old.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a"), "").unwrap();
        std::fs::write(dir.path().join("b"), "").unwrap();
        std::fs::write(dir.path().join("c"), "").unwrap();
        // "a" is a file, so "a/nested" cannot be created
        let plan = plan_in(dir.path(), &[("b", "B/b"), ("c", "a/nested/c"), ("a", "A/a")]);

        let report = apply_plan(&plan, |_, _| {});
        assert_eq!(report.applied.len(), 1);
        assert!(report.failed.is_some());
        assert!(dir.path().join("B/b").exists());
        assert!(dir.path().join("c").exists());
        assert!(dir.path().join("a").exists());
    }

    #[test]
    fn test_plain_names() {
        assert!(is_plain_name("sunset_beach.jpg"));
        assert!(is_plain_name(".hidden"));
        assert!(!is_plain_name("../escape.jpg"));
        assert!(!is_plain_name("sub/dir.jpg"));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name("  "));
    }
}

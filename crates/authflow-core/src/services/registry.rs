//! In-memory run registry.
//!
//! One entry per launched run, owned by `AppCore` and injected wherever runs
//! are started. Capabilities are deliberately small: register, update
//! progress, finish, and list.

use crate::models::{RunKind, RunRecord, RunStatus};
use authflow_storage::time_utils;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct RunRegistry {
    runs: Arc<DashMap<String, RunRecord>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly launched run and return its id.
    pub fn register(&self, kind: RunKind, identity_emails: Vec<String>) -> String {
        let record = RunRecord::new(kind, identity_emails);
        let id = record.id.clone();
        self.runs.insert(id.clone(), record);
        id
    }

    /// Bump the processed-identity counter for a run.
    pub fn update_progress(&self, run_id: &str, progress: u32) {
        if let Some(mut entry) = self.runs.get_mut(run_id) {
            entry.progress = progress;
        }
    }

    pub fn finish(&self, run_id: &str) {
        self.complete(run_id, RunStatus::Completed, None);
    }

    pub fn fail(&self, run_id: &str, error: String) {
        self.complete(run_id, RunStatus::Failed, Some(error));
    }

    fn complete(&self, run_id: &str, status: RunStatus, error: Option<String>) {
        if let Some(mut entry) = self.runs.get_mut(run_id) {
            entry.status = status;
            entry.error = error;
            entry.finished_at = Some(time_utils::now_ms());
        }
    }

    pub fn get(&self, run_id: &str) -> Option<RunRecord> {
        self.runs.get(run_id).map(|e| e.clone())
    }

    /// All runs, newest first.
    pub fn list(&self) -> Vec<RunRecord> {
        let mut runs: Vec<RunRecord> = self.runs.iter().map(|e| e.clone()).collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_progress() {
        let registry = RunRegistry::new();
        let id = registry.register(RunKind::Group, vec!["a@x.com".into(), "b@x.com".into()]);

        registry.update_progress(&id, 1);
        let run = registry.get(&id).unwrap();
        assert_eq!(run.progress, 1);
        assert_eq!(run.total, 2);
        assert_eq!(run.status, RunStatus::Running);
    }

    #[test]
    fn test_finish_sets_terminal_fields() {
        let registry = RunRegistry::new();
        let id = registry.register(RunKind::Identity, vec!["a@x.com".into()]);

        registry.finish(&id);
        let run = registry.get(&id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.finished_at.is_some());
        assert!(run.error.is_none());
    }

    #[test]
    fn test_fail_records_error() {
        let registry = RunRegistry::new();
        let id = registry.register(RunKind::Capture, vec!["a@x.com".into()]);

        registry.fail(&id, "browser crashed".to_string());
        let run = registry.get(&id).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.as_deref(), Some("browser crashed"));
    }

    #[test]
    fn test_list_is_newest_first() {
        let registry = RunRegistry::new();
        let first = registry.register(RunKind::Identity, vec!["a@x.com".into()]);
        // Force distinct timestamps
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = registry.register(RunKind::Identity, vec!["b@x.com".into()]);

        let runs = registry.list();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[1].id, first);
    }
}

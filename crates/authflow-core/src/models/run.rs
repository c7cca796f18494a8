//! Background run bookkeeping records.
//!
//! One record per launched run, held in memory by the run registry and
//! queried for operator display. Nothing here is persisted.

use authflow_storage::time_utils;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a run was launched against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    /// One identity's full onboarding pipeline.
    Identity,
    /// Every identity in one group.
    Group,
    /// Every pending identity across all groups.
    AllPending,
    /// OAuth callback capture for one identity.
    Capture,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Identity => "identity",
            RunKind::Group => "group",
            RunKind::AllPending => "all-pending",
            RunKind::Capture => "capture",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub kind: RunKind,
    /// Login addresses of the identities this run covers.
    pub identity_emails: Vec<String>,
    /// Identities processed so far.
    pub progress: u32,
    pub total: u32,
    pub status: RunStatus,
    pub error: Option<String>,
    pub started_at: i64,
    pub finished_at: Option<i64>,
}

impl RunRecord {
    pub fn new(kind: RunKind, identity_emails: Vec<String>) -> Self {
        let total = identity_emails.len() as u32;
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            identity_emails,
            progress: 0,
            total,
            status: RunStatus::Running,
            error: None,
            started_at: time_utils::now_ms(),
            finished_at: None,
        }
    }
}

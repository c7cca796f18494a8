//! Managed identity model.
//!
//! An identity is one external-provider account under automation. The flow
//! engine reads its credentials and writes status, failure reason, and the
//! captured callback URL (stashed in `note`) at terminal points only.

use authflow_storage::time_utils;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Automation status lifecycle.
///
/// `Pending -> Activated -> Joined`, with `Failed` reachable from any
/// non-terminal step. `Joined` is terminal; the only way back to `Pending`
/// is an explicit operator reset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    #[default]
    Pending,
    /// One-time activation step completed.
    Activated,
    /// Invite accepted; fully onboarded.
    Joined,
    Failed,
}

impl IdentityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStatus::Pending => "pending",
            IdentityStatus::Activated => "activated",
            IdentityStatus::Joined => "joined",
            IdentityStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for IdentityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    pub group_id: String,
    pub email: String,
    pub password: String,
    /// Base32 seed for time-based one-time codes, when 2FA is enrolled.
    #[serde(default)]
    pub totp_secret: Option<String>,
    /// Free-text slot; the callback-capture flow stashes the captured URL here.
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub status: IdentityStatus,
    /// Reason for the most recent failure, cleared on success.
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Identity {
    pub fn new(
        group_id: String,
        email: String,
        password: String,
        totp_secret: Option<String>,
    ) -> Self {
        let now = time_utils::now_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            group_id,
            email,
            password,
            totp_secret,
            note: None,
            status: IdentityStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

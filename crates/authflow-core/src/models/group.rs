//! Sponsor group model.

use authflow_storage::time_utils;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sponsor account that managed identities are attached to.
///
/// The external provider caps how many members one sponsor can carry, so the
/// group records its own capacity and identity creation checks against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: String,
    /// Sponsor account's login address.
    pub email: String,
    pub nickname: String,
    /// Maximum number of identities this group may hold.
    pub max_identities: u32,
    pub created_at: i64,
}

impl Group {
    pub fn new(email: String, nickname: String, max_identities: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            nickname,
            max_identities,
            created_at: time_utils::now_ms(),
        }
    }
}

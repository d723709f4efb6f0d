use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read access to one record for one grantee. Never grants write access
/// and never outlives the record it references.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareGrant {
    pub id: String,
    pub record_id: String,
    /// Owner of the record at grant time; only they may revoke.
    pub owner_id: String,
    pub grantee_id: String,
    pub created_at: String,
}

impl ShareGrant {
    pub fn new(record_id: &str, owner_id: &str, grantee_id: &str) -> ShareGrant {
        ShareGrant {
            id: Uuid::new_v4().to_string(),
            record_id: record_id.to_string(),
            owner_id: owner_id.to_string(),
            grantee_id: grantee_id.to_string(),
            created_at: super::now_rfc3339(),
        }
    }
}

use serde::{Deserialize, Serialize};

/// Row shape used by the record list and shared-with-me views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: String,
    pub kind: String,
    pub kind_label: String,
    pub name: String,
    pub summary: String,
    pub updated: String,
}

/// Records shared by one owner, grouped for the shared-with-me page.
#[derive(Debug, Clone)]
pub struct SharedOwnerGroup {
    pub owner_username: String,
    pub records: Vec<RecordRow>,
}

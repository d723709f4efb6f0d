use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRow {
    pub id: String,
    pub file_name: String,
    pub record_id: String,
    pub record_name: String,
    pub size: String,
    pub note: String,
    pub uploaded: String,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded file tied to one record. The file itself lives under the
/// upload root at `stored_path`; deleting the record removes the row, and
/// the handler removes the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub owner_id: String,
    pub record_id: String,
    /// Original file name; unique per owner.
    pub file_name: String,
    /// Path relative to the upload root: `<owner_id>/<attachment_id>.<ext>`.
    pub stored_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub note: String,
    pub created_at: String,
}

impl Attachment {
    pub fn new(
        owner_id: &str,
        record_id: &str,
        file_name: &str,
        stored_path: &str,
        content_type: &str,
        size_bytes: i64,
        note: &str,
    ) -> Attachment {
        Attachment {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            record_id: record_id.to_string(),
            file_name: file_name.to_string(),
            stored_path: stored_path.to_string(),
            content_type: content_type.to_string(),
            size_bytes,
            note: note.trim().to_string(),
            created_at: super::now_rfc3339(),
        }
    }

    pub fn size_display(&self) -> String {
        let bytes = self.size_bytes;
        if bytes >= 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else if bytes >= 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{} B", bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_display_scales_units() {
        let mut att = Attachment::new("u1", "r1", "scan.pdf", "u1/a1.pdf", "application/pdf", 512, "");
        assert_eq!(att.size_display(), "512 B");
        att.size_bytes = 2048;
        assert_eq!(att.size_display(), "2.0 KB");
        att.size_bytes = 3 * 1024 * 1024;
        assert_eq!(att.size_display(), "3.0 MB");
    }
}

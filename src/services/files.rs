use std::path::Path;

/// File extensions accepted for attachment uploads.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg"];

/// Lowercased extension of an uploaded file name, if it has one.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

pub fn is_allowed_extension(ext: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&ext)
}

pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Relative path of an attachment's bytes under the upload root.
/// Files are grouped per owner so an account wipe is one directory removal.
pub fn stored_rel_path(owner_id: &str, attachment_id: &str, ext: &str) -> String {
    format!("{}/{}.{}", owner_id, attachment_id, ext)
}

pub fn save_upload(upload_root: &Path, rel_path: &str, bytes: &[u8]) -> std::io::Result<()> {
    let path = upload_root.join(rel_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}

pub fn open_stored(upload_root: &Path, rel_path: &str) -> std::io::Result<Vec<u8>> {
    std::fs::read(upload_root.join(rel_path))
}

/// Best-effort removal of a stored file. A missing file is not an error;
/// anything else is logged and swallowed so row cleanup still completes.
pub fn remove_file(upload_root: &Path, rel_path: &str) {
    let path = upload_root.join(rel_path);
    if let Err(err) = std::fs::remove_file(&path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to remove stored file {}: {}", path.display(), err);
        }
    }
}

/// Best-effort removal of everything a user ever uploaded.
pub fn remove_user_dir(upload_root: &Path, owner_id: &str) {
    let path = upload_root.join(owner_id);
    if let Err(err) = std::fs::remove_dir_all(&path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to remove upload dir {}: {}", path.display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("Scan.PDF"), Some("pdf".to_string()));
        assert_eq!(extension_of("photo.jpg"), Some("jpg".to_string()));
    }

    #[test]
    fn missing_extension_is_none() {
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("archive."), None);
    }

    #[test]
    fn only_documents_and_images_allowed() {
        assert!(is_allowed_extension("pdf"));
        assert!(is_allowed_extension("png"));
        assert!(is_allowed_extension("jpg"));
        assert!(!is_allowed_extension("exe"));
        assert!(!is_allowed_extension("svg"));
    }

    #[test]
    fn stored_path_groups_by_owner() {
        assert_eq!(stored_rel_path("u1", "a9", "png"), "u1/a9.png");
    }
}

use std::env;
use std::path::{Path, PathBuf};

// Default configuration constants
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "";
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// SQLite database file name inside the data directory.
pub const DATABASE_FILE: &str = "keepsake.db";
/// Directory for uploaded attachment files inside the data directory.
pub const UPLOADS_DIR: &str = "uploads";

/// Upper bound for a single attachment upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Request body cap for the upload route; leaves headroom over
/// `MAX_UPLOAD_BYTES` for the multipart framing and the note field.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub fn load_env_file(env_file: Option<&str>) {
    if let Some(path) = env_file {
        dotenvy::from_path(Path::new(path)).ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

pub fn get_data_dir() -> PathBuf {
    env::var("KEEPSAKE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE)
}

pub fn uploads_dir() -> PathBuf {
    get_data_dir().join(UPLOADS_DIR)
}

pub fn get_public_base_url() -> String {
    sanitize_base_url(&env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string()))
}

pub fn sanitize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        format!("http://{}:{}", DEFAULT_HOST, DEFAULT_PORT)
    } else {
        trimmed.to_string()
    }
}

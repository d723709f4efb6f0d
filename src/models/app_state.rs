use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::store::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Active sessions keyed by session id, value is the user id.
    pub sessions: Arc<Mutex<HashMap<String, String>>>,
    pub flash_store: Arc<Mutex<HashMap<String, Vec<String>>>>,
    pub public_base_url: String,
    /// Directory where uploaded attachment files are written.
    pub upload_root: PathBuf,
    pub custom_css: Option<String>,
}

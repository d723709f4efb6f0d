pub mod export;
pub mod files;

// Re-export commonly used functions
pub use export::records_csv;
pub use files::{
    content_type_for, extension_of, is_allowed_extension, open_stored, remove_file,
    remove_user_dir, save_upload, stored_rel_path, ALLOWED_EXTENSIONS,
};

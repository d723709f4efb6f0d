pub mod app_state;
pub mod attachment;
pub mod attachment_row;
pub mod current_user;
pub mod record;
pub mod record_row;
pub mod select_option;
pub mod share;
pub mod user;

pub use app_state::AppState;
pub use attachment::Attachment;
pub use attachment_row::AttachmentRow;
pub use current_user::CurrentUser;
pub use record::{
    CreditType, PaymentFrequency, PaymentStatus, Record, RecordDetails, RecordKind, TaskPriority,
    TaskStatus,
};
pub use record_row::{RecordRow, SharedOwnerGroup};
pub use select_option::SelectOption;
pub use share::ShareGrant;
pub use user::User;

/// Current UTC time as the RFC 3339 string stored in the database.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Shorten a stored RFC 3339 timestamp for display; falls back to the raw
/// value when it does not parse.
pub fn short_datetime(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

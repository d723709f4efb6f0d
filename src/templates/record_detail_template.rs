use askama::Template;
use crate::models::{AttachmentRow, CurrentUser};

#[derive(Template)]
#[template(path = "record_detail.html")]
pub struct RecordDetailTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub record_id: String,
    pub kind_value: String,
    pub kind_label: String,
    pub name: String,
    pub notes: String,
    /// Kind-specific label/value pairs, already filtered to non-empty values.
    pub fields: Vec<(String, String)>,
    pub created: String,
    pub updated: String,
    pub is_owner: bool,
    pub owner_username: String,
    pub attachments: Vec<AttachmentRow>,
    pub shared_with: Vec<String>,
}

crate::impl_base_template!(RecordDetailTemplate);

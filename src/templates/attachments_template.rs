use askama::Template;
use crate::models::{AttachmentRow, CurrentUser};

#[derive(Template)]
#[template(path = "attachments.html")]
pub struct AttachmentsTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub total: usize,
    pub rows: Vec<AttachmentRow>,
}

crate::impl_base_template!(AttachmentsTemplate);

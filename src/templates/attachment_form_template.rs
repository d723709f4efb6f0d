use askama::Template;
use crate::models::CurrentUser;

#[derive(Template)]
#[template(path = "attachment_form.html")]
pub struct AttachmentFormTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub record_id: String,
    pub record_name: String,
    pub error: Option<String>,
    pub note: String,
}

crate::impl_base_template!(AttachmentFormTemplate);

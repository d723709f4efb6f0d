use askama::Template;
use crate::models::CurrentUser;

#[derive(Template)]
#[template(path = "share.html")]
pub struct ShareTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub record_id: String,
    pub record_name: String,
    pub kind_label: String,
    /// (grant id, grantee username, granted at)
    pub grants: Vec<(String, String, String)>,
    pub error: Option<String>,
    pub username: String,
}

crate::impl_base_template!(ShareTemplate);

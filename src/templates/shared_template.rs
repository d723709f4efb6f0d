use askama::Template;
use crate::models::{CurrentUser, SharedOwnerGroup};

#[derive(Template)]
#[template(path = "shared.html")]
pub struct SharedTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub total: usize,
    pub groups: Vec<SharedOwnerGroup>,
}

crate::impl_base_template!(SharedTemplate);

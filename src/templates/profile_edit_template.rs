use askama::Template;
use crate::models::CurrentUser;

#[derive(Template)]
#[template(path = "profile_edit.html")]
pub struct ProfileEditTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub error: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
}

crate::impl_base_template!(ProfileEditTemplate);

use askama::Template;
use crate::models::CurrentUser;

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub error: Option<String>,
    pub username: String,
    pub email: String,
}

crate::impl_base_template!(RegisterTemplate);

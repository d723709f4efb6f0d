use askama::Template;
use crate::models::CurrentUser;
use crate::store::SharePartner;

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub member_since: String,
    pub record_count: i64,
    pub attachment_count: i64,
    /// People this user shares records with.
    pub partners_out: Vec<SharePartner>,
    /// People sharing records with this user.
    pub partners_in: Vec<SharePartner>,
}

crate::impl_base_template!(ProfileTemplate);

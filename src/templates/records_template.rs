use askama::Template;
use crate::models::{CurrentUser, RecordRow, SelectOption};

#[derive(Template)]
#[template(path = "records.html")]
pub struct RecordsTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub total: usize,
    pub rows: Vec<RecordRow>,
    pub kind_filters: Vec<SelectOption>,
    pub current_kind: String,
    pub sort_value: String,
    pub sort_options: Vec<SelectOption>,
}

crate::impl_base_template!(RecordsTemplate);

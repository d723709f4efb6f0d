use askama::Template;
use crate::models::{CurrentUser, SelectOption};

/// Create/edit form for every record kind; the template switches the
/// detail fields on `kind_value`.
#[derive(Template)]
#[template(path = "record_form.html")]
pub struct RecordFormTemplate {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub title: String,
    pub action: String,
    pub kind_value: String,
    pub kind_label: String,
    pub is_edit: bool,
    pub error: Option<String>,
    pub name: String,
    pub notes: String,
    pub amount: String,
    pub due_date: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub estimated_cost: String,
    pub specialization: String,
    pub practitioner: String,
    pub visit_date: String,
    pub location: String,
    pub currency: String,
    pub installment: String,
    pub agreement_date: String,
    pub status_options: Vec<SelectOption>,
    pub frequency_options: Vec<SelectOption>,
    pub priority_options: Vec<SelectOption>,
    pub credit_type_options: Vec<SelectOption>,
}

crate::impl_base_template!(RecordFormTemplate);

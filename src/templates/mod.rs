// Base template trait for inheritance
pub mod base_template;
pub use base_template::BaseTemplate;

// Individual template files
pub mod attachment_form_template;
pub mod attachments_template;
pub mod confirmation_template;
pub mod login_template;
pub mod profile_edit_template;
pub mod profile_template;
pub mod record_detail_template;
pub mod record_form_template;
pub mod records_template;
pub mod register_template;
pub mod share_template;
pub mod shared_template;

// Re-export all templates
pub use attachment_form_template::AttachmentFormTemplate;
pub use attachments_template::AttachmentsTemplate;
pub use confirmation_template::ConfirmationTemplate;
pub use login_template::LoginTemplate;
pub use profile_edit_template::ProfileEditTemplate;
pub use profile_template::ProfileTemplate;
pub use record_detail_template::RecordDetailTemplate;
pub use record_form_template::RecordFormTemplate;
pub use records_template::RecordsTemplate;
pub use register_template::RegisterTemplate;
pub use share_template::ShareTemplate;
pub use shared_template::SharedTemplate;

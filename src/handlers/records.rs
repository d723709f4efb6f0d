use axum::{
    extract::{Form, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::models::{
    short_datetime, AppState, CreditType, PaymentFrequency, PaymentStatus, Record, RecordDetails,
    RecordKind, RecordRow, SelectOption, TaskPriority, TaskStatus,
};
use crate::store::{RecordSort, StoreError};
use crate::templates::{
    ConfirmationTemplate, RecordDetailTemplate, RecordFormTemplate, RecordsTemplate,
};

use super::helpers::{
    build_template_globals, current_user_id_from_jar, handle_store_error, push_flash,
    render_template, TemplateGlobals,
};

#[derive(Deserialize)]
pub struct RecordsQuery {
    pub kind: Option<String>,
    pub sort: Option<String>,
}

#[derive(Deserialize)]
pub struct RecordKindQuery {
    pub kind: Option<String>,
}

/// One form covers every kind; only the fields of the active kind
/// are rendered, the rest arrive as `None`.
#[derive(Deserialize, Default)]
pub struct RecordForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub estimated_cost: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub practitioner: Option<String>,
    #[serde(default)]
    pub visit_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub credit_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub installment: Option<String>,
    #[serde(default)]
    pub agreement_date: Option<String>,
}

impl RecordForm {
    fn from_record(record: &Record) -> RecordForm {
        let mut form = RecordForm {
            name: record.name.clone(),
            notes: record.notes.clone(),
            ..RecordForm::default()
        };
        match &record.details {
            RecordDetails::Payment {
                amount,
                status,
                frequency,
                due_date,
            } => {
                form.amount = amount.map(|a| format!("{:.2}", a));
                form.status = Some(status.as_str().to_string());
                form.frequency = frequency.as_ref().map(|f| f.as_str().to_string());
                form.due_date = due_date.clone();
            }
            RecordDetails::Credit {
                credit_type,
                amount,
                currency,
                installment,
                agreement_date,
            } => {
                form.credit_type = Some(credit_type.as_str().to_string());
                form.amount = amount.map(|a| format!("{:.2}", a));
                form.currency = currency.clone();
                form.installment = installment.map(|i| format!("{:.2}", i));
                form.agreement_date = agreement_date.clone();
            }
            RecordDetails::Task {
                status,
                priority,
                due_date,
            } => {
                form.status = Some(status.as_str().to_string());
                form.priority = priority.as_ref().map(|p| p.as_str().to_string());
                form.due_date = due_date.clone();
            }
            RecordDetails::Trip {
                destination,
                start_date,
                end_date,
                estimated_cost,
            } => {
                form.destination = destination.clone();
                form.start_date = start_date.clone();
                form.end_date = end_date.clone();
                form.estimated_cost = estimated_cost.map(|c| format!("{:.2}", c));
            }
            RecordDetails::Renovation {
                estimated_cost,
                start_date,
                end_date,
            } => {
                form.estimated_cost = estimated_cost.map(|c| format!("{:.2}", c));
                form.start_date = start_date.clone();
                form.end_date = end_date.clone();
            }
            RecordDetails::Health {
                specialization,
                practitioner,
                visit_date,
                location,
            } => {
                form.specialization = specialization.clone();
                form.practitioner = practitioner.clone();
                form.visit_date = visit_date.clone();
                form.location = location.clone();
            }
        }
        form
    }
}

fn clean(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_money(raw: &Option<String>, label: &str) -> Result<Option<f64>, String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .replace(',', ".")
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("{} must be a number.", label)),
    }
}

fn details_from_form(kind: RecordKind, form: &RecordForm) -> Result<RecordDetails, String> {
    match kind {
        RecordKind::Payment => Ok(RecordDetails::Payment {
            amount: parse_money(&form.amount, "Amount")?,
            status: form
                .status
                .as_deref()
                .and_then(PaymentStatus::from_str)
                .unwrap_or_default(),
            frequency: clean(&form.frequency)
                .as_deref()
                .and_then(PaymentFrequency::from_str),
            due_date: clean(&form.due_date),
        }),
        RecordKind::Credit => Ok(RecordDetails::Credit {
            credit_type: form
                .credit_type
                .as_deref()
                .and_then(CreditType::from_str)
                .unwrap_or_default(),
            amount: parse_money(&form.amount, "Amount")?,
            currency: clean(&form.currency),
            installment: parse_money(&form.installment, "Installment")?,
            agreement_date: clean(&form.agreement_date),
        }),
        RecordKind::Task => Ok(RecordDetails::Task {
            status: form
                .status
                .as_deref()
                .and_then(TaskStatus::from_str)
                .unwrap_or_default(),
            priority: clean(&form.priority)
                .as_deref()
                .and_then(TaskPriority::from_str),
            due_date: clean(&form.due_date),
        }),
        RecordKind::Trip => Ok(RecordDetails::Trip {
            destination: clean(&form.destination),
            start_date: clean(&form.start_date),
            end_date: clean(&form.end_date),
            estimated_cost: parse_money(&form.estimated_cost, "Estimated cost")?,
        }),
        RecordKind::Renovation => Ok(RecordDetails::Renovation {
            estimated_cost: parse_money(&form.estimated_cost, "Estimated cost")?,
            start_date: clean(&form.start_date),
            end_date: clean(&form.end_date),
        }),
        RecordKind::Health => Ok(RecordDetails::Health {
            specialization: clean(&form.specialization),
            practitioner: clean(&form.practitioner),
            visit_date: clean(&form.visit_date),
            location: clean(&form.location),
        }),
    }
}

fn record_row(record: &Record) -> RecordRow {
    RecordRow {
        id: record.id.clone(),
        kind: record.kind.as_str().to_string(),
        kind_label: record.kind.label().to_string(),
        name: record.name.clone(),
        summary: record.details.summary(),
        updated: short_datetime(&record.updated_at),
    }
}

fn status_options(kind: RecordKind, form: &RecordForm) -> Vec<SelectOption> {
    let current = form.status.as_deref().unwrap_or("");
    match kind {
        RecordKind::Payment => PaymentStatus::all()
            .iter()
            .map(|s| SelectOption::new(s.as_str(), s.label(), current))
            .collect(),
        RecordKind::Task => TaskStatus::all()
            .iter()
            .map(|s| SelectOption::new(s.as_str(), s.label(), current))
            .collect(),
        _ => vec![],
    }
}

fn frequency_options(kind: RecordKind, form: &RecordForm) -> Vec<SelectOption> {
    if kind != RecordKind::Payment {
        return vec![];
    }
    let current = form.frequency.as_deref().unwrap_or("");
    let mut options = vec![SelectOption::new("", "Not set", current)];
    options.extend(
        PaymentFrequency::all()
            .iter()
            .map(|f| SelectOption::new(f.as_str(), f.label(), current)),
    );
    options
}

fn priority_options(kind: RecordKind, form: &RecordForm) -> Vec<SelectOption> {
    if kind != RecordKind::Task {
        return vec![];
    }
    let current = form.priority.as_deref().unwrap_or("");
    let mut options = vec![SelectOption::new("", "Not set", current)];
    options.extend(
        TaskPriority::all()
            .iter()
            .map(|p| SelectOption::new(p.as_str(), p.label(), current)),
    );
    options
}

fn credit_type_options(kind: RecordKind, form: &RecordForm) -> Vec<SelectOption> {
    if kind != RecordKind::Credit {
        return vec![];
    }
    let current = form.credit_type.as_deref().unwrap_or("");
    CreditType::all()
        .iter()
        .map(|t| SelectOption::new(t.as_str(), t.label(), current))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn form_template(
    globals: TemplateGlobals,
    kind: RecordKind,
    action: String,
    title: String,
    is_edit: bool,
    error: Option<String>,
    form: &RecordForm,
) -> RecordFormTemplate {
    let TemplateGlobals {
        current_user,
        base_url,
        flash_messages,
        has_flash_messages,
    } = globals;
    RecordFormTemplate {
        current_user,
        base_url,
        flash_messages,
        has_flash_messages,
        title,
        action,
        kind_value: kind.as_str().to_string(),
        kind_label: kind.label().to_string(),
        is_edit,
        error,
        name: form.name.trim().to_string(),
        notes: form.notes.trim().to_string(),
        amount: form.amount.clone().unwrap_or_default(),
        due_date: form.due_date.clone().unwrap_or_default(),
        destination: form.destination.clone().unwrap_or_default(),
        start_date: form.start_date.clone().unwrap_or_default(),
        end_date: form.end_date.clone().unwrap_or_default(),
        estimated_cost: form.estimated_cost.clone().unwrap_or_default(),
        specialization: form.specialization.clone().unwrap_or_default(),
        practitioner: form.practitioner.clone().unwrap_or_default(),
        visit_date: form.visit_date.clone().unwrap_or_default(),
        location: form.location.clone().unwrap_or_default(),
        currency: form.currency.clone().unwrap_or_default(),
        installment: form.installment.clone().unwrap_or_default(),
        agreement_date: form.agreement_date.clone().unwrap_or_default(),
        status_options: status_options(kind, form),
        frequency_options: frequency_options(kind, form),
        priority_options: priority_options(kind, form),
        credit_type_options: credit_type_options(kind, form),
    }
}

pub async fn records_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RecordsQuery>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let kind = query.kind.as_deref().and_then(RecordKind::from_str);
    let sort = query
        .sort
        .as_deref()
        .map(RecordSort::from_param)
        .unwrap_or_default();

    let records = match state.db.record_repo().list_for_owner(&user_id, kind, sort) {
        Ok(records) => records,
        Err(e) => return handle_store_error(&state, &jar, e, "list records"),
    };

    let current_kind = kind.map(|k| k.as_str()).unwrap_or("").to_string();
    let mut kind_filters = vec![SelectOption::new("", "All", &current_kind)];
    kind_filters.extend(
        RecordKind::all()
            .iter()
            .map(|k| SelectOption::new(k.as_str(), k.label(), &current_kind)),
    );
    let sort_value = sort.as_param().to_string();
    let sort_options = vec![
        SelectOption::new("-updated", "Recently updated", &sort_value),
        SelectOption::new("updated", "Least recently updated", &sort_value),
        SelectOption::new("name", "Name A to Z", &sort_value),
        SelectOption::new("-name", "Name Z to A", &sort_value),
        SelectOption::new("-created", "Newest first", &sort_value),
        SelectOption::new("created", "Oldest first", &sort_value),
    ];

    let TemplateGlobals {
        current_user,
        base_url,
        flash_messages,
        has_flash_messages,
    } = build_template_globals(&state, &jar);
    render_template(
        &state,
        &jar,
        RecordsTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            total: records.len(),
            rows: records.iter().map(record_row).collect(),
            kind_filters,
            current_kind,
            sort_value,
            sort_options,
        },
    )
}

pub async fn record_new_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RecordKindQuery>,
) -> Response {
    let kind = query
        .kind
        .as_deref()
        .and_then(RecordKind::from_str)
        .unwrap_or(RecordKind::Task);
    let globals = build_template_globals(&state, &jar);
    render_template(
        &state,
        &jar,
        form_template(
            globals,
            kind,
            format!("/records/new?kind={}", kind.as_str()),
            format!("New {}", kind.label().to_lowercase()),
            false,
            None,
            &RecordForm::default(),
        ),
    )
}

pub async fn record_new_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RecordKindQuery>,
    Form(form): Form<RecordForm>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let kind = query
        .kind
        .as_deref()
        .and_then(RecordKind::from_str)
        .unwrap_or(RecordKind::Task);

    let outcome = if form.name.trim().is_empty() {
        Err("Name is required.".to_string())
    } else {
        details_from_form(kind, &form)
    };

    let error = match outcome {
        Err(message) => message,
        Ok(details) => {
            let record = Record::new(&user_id, &form.name, &form.notes, details);
            match state.db.record_repo().insert(&record) {
                Ok(()) => {
                    push_flash(
                        &state,
                        &jar,
                        format!("{} \"{}\" created.", record.kind.label(), record.name),
                    );
                    return Redirect::to(&format!("/records/{}", record.id)).into_response();
                }
                Err(StoreError::Conflict(message)) | Err(StoreError::Invalid(message)) => message,
                Err(e) => return handle_store_error(&state, &jar, e, "create record"),
            }
        }
    };

    let globals = build_template_globals(&state, &jar);
    render_template(
        &state,
        &jar,
        form_template(
            globals,
            kind,
            format!("/records/new?kind={}", kind.as_str()),
            format!("New {}", kind.label().to_lowercase()),
            false,
            Some(error),
            &form,
        ),
    )
}

pub async fn record_detail_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<String>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let record = match state.db.record_repo().fetch_readable(&record_id, &user_id) {
        Ok(record) => record,
        Err(e) => return handle_store_error(&state, &jar, e, "view record"),
    };
    let is_owner = record.owner_id == user_id;

    let owner_username = match state.db.user_repo().find_by_id(&record.owner_id) {
        Ok(Some(owner)) => owner.username,
        Ok(None) => "unknown".to_string(),
        Err(e) => return handle_store_error(&state, &jar, e, "view record"),
    };

    let attachments = match state.db.attachment_repo().list_for_record(&record.id) {
        Ok(list) => list,
        Err(e) => return handle_store_error(&state, &jar, e, "view record"),
    };
    let attachment_rows = attachments
        .iter()
        .map(|a| crate::models::AttachmentRow {
            id: a.id.clone(),
            file_name: a.file_name.clone(),
            record_id: a.record_id.clone(),
            record_name: record.name.clone(),
            size: a.size_display(),
            note: a.note.clone(),
            uploaded: short_datetime(&a.created_at),
        })
        .collect();

    let shared_with = if is_owner {
        match state.db.share_repo().grants_for_record(&record.id, &user_id) {
            Ok(grants) => grants.into_iter().map(|g| g.grantee_username).collect(),
            Err(e) => return handle_store_error(&state, &jar, e, "view record"),
        }
    } else {
        vec![]
    };

    let TemplateGlobals {
        current_user,
        base_url,
        flash_messages,
        has_flash_messages,
    } = build_template_globals(&state, &jar);
    render_template(
        &state,
        &jar,
        RecordDetailTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            record_id: record.id.clone(),
            kind_value: record.kind.as_str().to_string(),
            kind_label: record.kind.label().to_string(),
            name: record.name.clone(),
            notes: record.notes.clone(),
            fields: record
                .details
                .fields()
                .into_iter()
                .map(|(label, value)| (label.to_string(), value))
                .collect(),
            created: short_datetime(&record.created_at),
            updated: short_datetime(&record.updated_at),
            is_owner,
            owner_username,
            attachments: attachment_rows,
            shared_with,
        },
    )
}

pub async fn record_edit_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<String>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let record = match state.db.record_repo().fetch_owned(&record_id, &user_id) {
        Ok(record) => record,
        Err(e) => return handle_store_error(&state, &jar, e, "edit record"),
    };
    let globals = build_template_globals(&state, &jar);
    render_template(
        &state,
        &jar,
        form_template(
            globals,
            record.kind,
            format!("/records/{}/edit", record.id),
            format!(
                "Edit {}: {}",
                record.kind.label().to_lowercase(),
                record.name
            ),
            true,
            None,
            &RecordForm::from_record(&record),
        ),
    )
}

pub async fn record_edit_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<String>,
    Form(form): Form<RecordForm>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let record = match state.db.record_repo().fetch_owned(&record_id, &user_id) {
        Ok(record) => record,
        Err(e) => return handle_store_error(&state, &jar, e, "edit record"),
    };

    let outcome = if form.name.trim().is_empty() {
        Err("Name is required.".to_string())
    } else {
        details_from_form(record.kind, &form)
    };

    let error = match outcome {
        Err(message) => message,
        Ok(details) => {
            let updated = Record {
                name: form.name.trim().to_string(),
                notes: form.notes.trim().to_string(),
                details,
                ..record.clone()
            };
            match state.db.record_repo().update(&updated, &user_id) {
                Ok(()) => {
                    push_flash(&state, &jar, "Changes saved.");
                    return Redirect::to(&format!("/records/{}", record.id)).into_response();
                }
                Err(StoreError::Conflict(message)) | Err(StoreError::Invalid(message)) => message,
                Err(e) => return handle_store_error(&state, &jar, e, "edit record"),
            }
        }
    };

    let globals = build_template_globals(&state, &jar);
    render_template(
        &state,
        &jar,
        form_template(
            globals,
            record.kind,
            format!("/records/{}/edit", record.id),
            format!(
                "Edit {}: {}",
                record.kind.label().to_lowercase(),
                record.name
            ),
            true,
            Some(error),
            &form,
        ),
    )
}

pub async fn record_delete_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<String>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let record = match state.db.record_repo().fetch_owned(&record_id, &user_id) {
        Ok(record) => record,
        Err(e) => return handle_store_error(&state, &jar, e, "delete record"),
    };
    let attachment_count = match state.db.attachment_repo().list_for_record(&record.id) {
        Ok(list) => list.len(),
        Err(e) => return handle_store_error(&state, &jar, e, "delete record"),
    };
    let share_count = match state.db.share_repo().grants_for_record(&record.id, &user_id) {
        Ok(grants) => grants.len(),
        Err(e) => return handle_store_error(&state, &jar, e, "delete record"),
    };

    let mut message = format!(
        "Delete {} \"{}\"? This cannot be undone.",
        record.kind.label().to_lowercase(),
        record.name
    );
    if attachment_count > 0 {
        message.push_str(&format!(
            " {} attached file(s) will be removed.",
            attachment_count
        ));
    }
    if share_count > 0 {
        message.push_str(&format!(" {} share(s) will be revoked.", share_count));
    }

    let TemplateGlobals {
        current_user,
        base_url,
        flash_messages,
        has_flash_messages,
    } = build_template_globals(&state, &jar);
    render_template(
        &state,
        &jar,
        ConfirmationTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            title: "Delete record".to_string(),
            message,
            target_url: format!("/records/{}/delete", record.id),
            confirm_label: "Delete".to_string(),
            cancel_url: format!("/records/{}", record.id),
            button_class: "danger".to_string(),
        },
    )
}

pub async fn record_delete_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<String>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let record = match state.db.record_repo().fetch_owned(&record_id, &user_id) {
        Ok(record) => record,
        Err(e) => return handle_store_error(&state, &jar, e, "delete record"),
    };
    let attachments = match state.db.attachment_repo().list_for_record(&record.id) {
        Ok(list) => list,
        Err(e) => return handle_store_error(&state, &jar, e, "delete record"),
    };
    if let Err(e) = state.db.record_repo().delete(&record.id, &user_id) {
        return handle_store_error(&state, &jar, e, "delete record");
    }
    // Rows are gone; now drop the stored files.
    for attachment in &attachments {
        crate::services::remove_file(&state.upload_root, &attachment.stored_path);
    }
    push_flash(
        &state,
        &jar,
        format!("{} \"{}\" deleted.", record.kind.label(), record.name),
    );
    Redirect::to("/records").into_response()
}

use axum::{
    extract::{Form, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::config::MAX_UPLOAD_BYTES;
use crate::models::{short_datetime, AppState, Attachment, AttachmentRow};
use crate::services;
use crate::store::StoreError;
use crate::templates::{AttachmentFormTemplate, AttachmentsTemplate};

use super::helpers::{
    build_template_globals, current_user_id_from_jar, handle_store_error, push_flash,
    render_template, TemplateGlobals,
};

#[derive(Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub next: Option<String>,
}

pub async fn attachments_get(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let attachments = match state.db.attachment_repo().list_for_owner(&user_id) {
        Ok(list) => list,
        Err(e) => return handle_store_error(&state, &jar, e, "list attachments"),
    };
    let rows: Vec<AttachmentRow> = attachments
        .iter()
        .map(|entry| AttachmentRow {
            id: entry.attachment.id.clone(),
            file_name: entry.attachment.file_name.clone(),
            record_id: entry.attachment.record_id.clone(),
            record_name: entry.record_name.clone(),
            size: entry.attachment.size_display(),
            note: entry.attachment.note.clone(),
            uploaded: short_datetime(&entry.attachment.created_at),
        })
        .collect();

    let TemplateGlobals {
        current_user,
        base_url,
        flash_messages,
        has_flash_messages,
    } = build_template_globals(&state, &jar);
    render_template(
        &state,
        &jar,
        AttachmentsTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            total: rows.len(),
            rows,
        },
    )
}

pub async fn attachment_new_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<String>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let record = match state.db.record_repo().fetch_owned(&record_id, &user_id) {
        Ok(record) => record,
        Err(e) => return handle_store_error(&state, &jar, e, "attach file"),
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
        AttachmentFormTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            record_id: record.id,
            record_name: record.name,
            error: None,
            note: String::new(),
        },
    )
}

pub async fn attachment_new_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let record = match state.db.record_repo().fetch_owned(&record_id, &user_id) {
        Ok(record) => record,
        Err(e) => return handle_store_error(&state, &jar, e, "attach file"),
    };

    let mut note = String::new();
    let mut file_name = String::new();
    let mut file_bytes: Vec<u8> = Vec::new();
    let mut read_error = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(%e, "Reading upload failed");
                read_error = true;
                break;
            }
        };
        // The field is consumed by text()/bytes(), so grab the name first.
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "note" => note = field.text().await.unwrap_or_default(),
            "file" => {
                file_name = field.file_name().unwrap_or("").to_string();
                match field.bytes().await {
                    Ok(bytes) => file_bytes = bytes.to_vec(),
                    Err(e) => {
                        tracing::error!(%e, "Reading upload failed");
                        read_error = true;
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    let error = if read_error {
        Some("Upload failed. The file may be too large.".to_string())
    } else if file_name.is_empty() || file_bytes.is_empty() {
        Some("Choose a file to upload.".to_string())
    } else if file_bytes.len() > MAX_UPLOAD_BYTES {
        Some("The file is too large.".to_string())
    } else {
        match services::extension_of(&file_name) {
            Some(ext) if services::is_allowed_extension(&ext) => {
                let mut attachment = Attachment::new(
                    &user_id,
                    &record.id,
                    &file_name,
                    "",
                    services::content_type_for(&ext),
                    file_bytes.len() as i64,
                    &note,
                );
                attachment.stored_path = services::stored_rel_path(&user_id, &attachment.id, &ext);

                // Row first so a duplicate name fails before any disk write.
                match state.db.attachment_repo().insert(&attachment, &user_id) {
                    Ok(()) => {
                        if let Err(e) =
                            services::save_upload(&state.upload_root, &attachment.stored_path, &file_bytes)
                        {
                            tracing::error!(%e, "Writing upload to disk failed");
                            if let Err(cleanup) =
                                state.db.attachment_repo().delete(&attachment.id, &user_id)
                            {
                                tracing::error!(%cleanup, "Orphaned attachment row cleanup failed");
                            }
                            Some("Could not store the file. Please try again.".to_string())
                        } else {
                            push_flash(
                                &state,
                                &jar,
                                format!("File \"{}\" attached.", attachment.file_name),
                            );
                            return Redirect::to(&format!("/records/{}", record.id)).into_response();
                        }
                    }
                    Err(StoreError::Conflict(message)) | Err(StoreError::Invalid(message)) => {
                        Some(message)
                    }
                    Err(e) => return handle_store_error(&state, &jar, e, "attach file"),
                }
            }
            _ => Some("Only pdf, png and jpg files are accepted.".to_string()),
        }
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
        AttachmentFormTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            record_id: record.id,
            record_name: record.name,
            error,
            note,
        },
    )
}

pub async fn attachment_download_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(attachment_id): Path<String>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let attachment = match state
        .db
        .attachment_repo()
        .fetch_readable(&attachment_id, &user_id)
    {
        Ok(attachment) => attachment,
        Err(e) => return handle_store_error(&state, &jar, e, "download attachment"),
    };
    let bytes = match services::open_stored(&state.upload_root, &attachment.stored_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(%e, path = %attachment.stored_path, "Stored file missing");
            push_flash(&state, &jar, "The stored file could not be read.");
            return Redirect::to(&format!("/records/{}", attachment.record_id)).into_response();
        }
    };
    let headers = [
        (header::CONTENT_TYPE, attachment.content_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename*=UTF-8''{}",
                urlencoding::encode(&attachment.file_name)
            ),
        ),
    ];
    (headers, bytes).into_response()
}

pub async fn attachment_delete_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(attachment_id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let attachment = match state.db.attachment_repo().delete(&attachment_id, &user_id) {
        Ok(attachment) => attachment,
        Err(e) => return handle_store_error(&state, &jar, e, "delete attachment"),
    };
    services::remove_file(&state.upload_root, &attachment.stored_path);
    push_flash(
        &state,
        &jar,
        format!("File \"{}\" removed.", attachment.file_name),
    );
    let target = form
        .next
        .filter(|next| next.starts_with('/'))
        .unwrap_or_else(|| format!("/records/{}", attachment.record_id));
    Redirect::to(&target).into_response()
}

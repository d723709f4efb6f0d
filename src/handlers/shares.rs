use axum::{
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::models::{short_datetime, AppState, RecordRow, SharedOwnerGroup};
use crate::store::StoreError;
use crate::templates::{SharedTemplate, ShareTemplate};

use super::helpers::{
    build_template_globals, current_user_id_from_jar, handle_store_error, push_flash,
    render_template, TemplateGlobals,
};

#[derive(Deserialize)]
pub struct ShareForm {
    pub username: String,
}

fn grant_rows(
    state: &AppState,
    record_id: &str,
    user_id: &str,
) -> Result<Vec<(String, String, String)>, StoreError> {
    let grants = state.db.share_repo().grants_for_record(record_id, user_id)?;
    Ok(grants
        .into_iter()
        .map(|g| (g.id, g.grantee_username, short_datetime(&g.created_at)))
        .collect())
}

pub async fn share_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<String>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let record = match state.db.record_repo().fetch_owned(&record_id, &user_id) {
        Ok(record) => record,
        Err(e) => return handle_store_error(&state, &jar, e, "manage shares"),
    };
    let grants = match grant_rows(&state, &record.id, &user_id) {
        Ok(grants) => grants,
        Err(e) => return handle_store_error(&state, &jar, e, "manage shares"),
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
        ShareTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            record_id: record.id,
            record_name: record.name,
            kind_label: record.kind.label().to_string(),
            grants,
            error: None,
            username: String::new(),
        },
    )
}

pub async fn share_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(record_id): Path<String>,
    Form(form): Form<ShareForm>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let record = match state.db.record_repo().fetch_owned(&record_id, &user_id) {
        Ok(record) => record,
        Err(e) => return handle_store_error(&state, &jar, e, "manage shares"),
    };

    let needle = form.username.trim().to_lowercase();
    let error = if needle.is_empty() {
        Some("Enter a username to share with.".to_string())
    } else {
        match state.db.user_repo().find_by_username(&needle) {
            Ok(Some(grantee)) => {
                match state.db.share_repo().grant(&record.id, &user_id, &grantee.id) {
                    Ok(()) => {
                        push_flash(
                            &state,
                            &jar,
                            format!(
                                "Now sharing \"{}\" with {}.",
                                record.name, grantee.username
                            ),
                        );
                        return Redirect::to(&format!("/records/{}/share", record.id))
                            .into_response();
                    }
                    Err(StoreError::Conflict(message)) | Err(StoreError::Invalid(message)) => {
                        Some(message)
                    }
                    Err(e) => return handle_store_error(&state, &jar, e, "manage shares"),
                }
            }
            Ok(None) => Some(format!("No user named \"{}\".", needle)),
            Err(e) => return handle_store_error(&state, &jar, e, "manage shares"),
        }
    };

    let grants = match grant_rows(&state, &record.id, &user_id) {
        Ok(grants) => grants,
        Err(e) => return handle_store_error(&state, &jar, e, "manage shares"),
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
        ShareTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            record_id: record.id,
            record_name: record.name,
            kind_label: record.kind.label().to_string(),
            grants,
            error,
            username: form.username.trim().to_string(),
        },
    )
}

pub async fn share_revoke_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((record_id, grant_id)): Path<(String, String)>,
) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    if let Err(e) = state.db.share_repo().revoke(&grant_id, &user_id) {
        return handle_store_error(&state, &jar, e, "revoke share");
    }
    push_flash(&state, &jar, "Share revoked.");
    Redirect::to(&format!("/records/{}/share", record_id)).into_response()
}

pub async fn shared_get(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let shared = match state.db.record_repo().list_shared_with(&user_id) {
        Ok(shared) => shared,
        Err(e) => return handle_store_error(&state, &jar, e, "list shared records"),
    };

    // Rows arrive ordered by owner, so grouping is a single pass.
    let total = shared.len();
    let mut groups: Vec<SharedOwnerGroup> = Vec::new();
    for entry in shared {
        let row = RecordRow {
            id: entry.record.id.clone(),
            kind: entry.record.kind.as_str().to_string(),
            kind_label: entry.record.kind.label().to_string(),
            name: entry.record.name.clone(),
            summary: entry.record.details.summary(),
            updated: short_datetime(&entry.record.updated_at),
        };
        match groups.last_mut() {
            Some(group) if group.owner_username == entry.owner_username => {
                group.records.push(row);
            }
            _ => groups.push(SharedOwnerGroup {
                owner_username: entry.owner_username,
                records: vec![row],
            }),
        }
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
        SharedTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            total,
            groups,
        },
    )
}

use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::auth::{generate_password_hash, validate_email, validate_password};
use crate::models::{short_datetime, AppState, User};
use crate::services;
use crate::store::StoreError;
use crate::templates::{ConfirmationTemplate, ProfileEditTemplate, ProfileTemplate};

use super::helpers::{
    build_template_globals, current_user_id_from_jar, force_logout, handle_store_error,
    push_flash, render_template, TemplateGlobals,
};

#[derive(Deserialize)]
pub struct ProfileEditForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub new_password_confirm: String,
}

fn load_account(state: &AppState, jar: &CookieJar) -> Result<User, Response> {
    let Some(user_id) = current_user_id_from_jar(state, jar) else {
        return Err(Redirect::to("/login").into_response());
    };
    match state.db.user_repo().find_by_id(&user_id) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(force_logout(state, jar, "Your session is no longer valid.").into_response()),
        Err(e) => Err(handle_store_error(state, jar, e, "load account")),
    }
}

pub async fn profile_get(State(state): State<AppState>, jar: CookieJar) -> Response {
    let user = match load_account(&state, &jar) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let record_count = match state.db.record_repo().count_for_owner(&user.id) {
        Ok(count) => count,
        Err(e) => return handle_store_error(&state, &jar, e, "load account"),
    };
    let attachment_count = match state.db.attachment_repo().count_for_owner(&user.id) {
        Ok(count) => count,
        Err(e) => return handle_store_error(&state, &jar, e, "load account"),
    };
    let partners_out = match state.db.share_repo().partners_of_owner(&user.id) {
        Ok(partners) => partners,
        Err(e) => return handle_store_error(&state, &jar, e, "load account"),
    };
    let partners_in = match state.db.share_repo().owners_sharing_with(&user.id) {
        Ok(partners) => partners,
        Err(e) => return handle_store_error(&state, &jar, e, "load account"),
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
        ProfileTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            username: user.username.clone(),
            display_name: user.display_name(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            city: user.city.clone(),
            member_since: short_datetime(&user.created_at),
            record_count,
            attachment_count,
            partners_out,
            partners_in,
        },
    )
}

pub async fn profile_edit_get(State(state): State<AppState>, jar: CookieJar) -> Response {
    let user = match load_account(&state, &jar) {
        Ok(user) => user,
        Err(response) => return response,
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
        ProfileEditTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            error: None,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            city: user.city,
        },
    )
}

pub async fn profile_edit_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ProfileEditForm>,
) -> Response {
    let user = match load_account(&state, &jar) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let email = form.email.trim().to_lowercase();
    let wants_password_change =
        !form.new_password.is_empty() || !form.new_password_confirm.is_empty();

    let validation = validate_email(&email).and_then(|_| {
        if !wants_password_change {
            return Ok(());
        }
        validate_password(&form.new_password).and_then(|_| {
            if form.new_password == form.new_password_confirm {
                Ok(())
            } else {
                Err("Passwords do not match.".to_string())
            }
        })
    });

    let error = match validation {
        Err(message) => Some(message),
        Ok(()) => {
            let updated = User {
                email: email.clone(),
                first_name: form.first_name.trim().to_string(),
                last_name: form.last_name.trim().to_string(),
                phone: form.phone.trim().to_string(),
                city: form.city.trim().to_string(),
                ..user.clone()
            };
            match state.db.user_repo().update_profile(&updated) {
                Ok(()) => {
                    if wants_password_change {
                        let hash = generate_password_hash(&form.new_password);
                        if let Err(e) = state.db.user_repo().set_password_hash(&user.id, &hash) {
                            return handle_store_error(&state, &jar, e, "change password");
                        }
                    }
                    push_flash(&state, &jar, "Profile updated.");
                    return Redirect::to("/profile").into_response();
                }
                Err(StoreError::Conflict(message)) | Err(StoreError::Invalid(message)) => {
                    Some(message)
                }
                Err(e) => return handle_store_error(&state, &jar, e, "update profile"),
            }
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
        ProfileEditTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            error,
            email: form.email.trim().to_string(),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            city: form.city.trim().to_string(),
        },
    )
}

pub async fn profile_delete_get(State(state): State<AppState>, jar: CookieJar) -> Response {
    let user = match load_account(&state, &jar) {
        Ok(user) => user,
        Err(response) => return response,
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
        ConfirmationTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            title: "Delete account".to_string(),
            message: format!(
                "Delete the account \"{}\"? All records, uploaded files and shares will be removed. This cannot be undone.",
                user.username
            ),
            target_url: "/profile/delete".to_string(),
            confirm_label: "Delete my account".to_string(),
            cancel_url: "/profile".to_string(),
            button_class: "danger".to_string(),
        },
    )
}

pub async fn profile_delete_post(State(state): State<AppState>, jar: CookieJar) -> Response {
    let user = match load_account(&state, &jar) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if let Err(e) = state.db.user_repo().delete(&user.id) {
        return handle_store_error(&state, &jar, e, "delete account");
    }
    services::remove_user_dir(&state.upload_root, &user.id);
    state
        .sessions
        .lock()
        .unwrap()
        .retain(|_, session_user| session_user != &user.id);
    tracing::info!(username = %user.username, "Account deleted");
    force_logout(&state, &jar, "Your account has been deleted.").into_response()
}

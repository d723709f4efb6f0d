use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use crate::auth::{
    generate_password_hash, random_session_id, validate_email, validate_password,
    validate_username, verify_password,
};
use crate::models::{AppState, User};
use crate::store::StoreError;
use crate::templates::{LoginTemplate, RegisterTemplate};

use super::helpers::{
    build_template_globals, current_user_id_from_jar, render_template, TemplateGlobals,
};

/// Sessions live for a week; signing in again extends them.
const SESSION_TTL_DAYS: i64 = 7;

fn session_cookie(sid: String) -> Cookie<'static> {
    let mut cookie = Cookie::new("session_id", sid);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_max_age(time::Duration::days(SESSION_TTL_DAYS));
    cookie
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

pub async fn login_get(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if current_user_id_from_jar(&state, &jar).is_some() {
        return Redirect::to("/records").into_response();
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
        LoginTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            error: None,
        },
    )
}

pub async fn login_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    let uname = form.username.trim().to_lowercase();
    match state.db.user_repo().find_by_username(&uname) {
        Ok(Some(user)) if verify_password(&user.password_hash, &form.password) => {
            let sid = random_session_id();
            state
                .sessions
                .lock()
                .unwrap()
                .insert(sid.clone(), user.id.clone());
            tracing::info!(username = %user.username, "User signed in");
            return (jar.add(session_cookie(sid)), Redirect::to("/records")).into_response();
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(%e, "Login lookup failed");
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
        LoginTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            error: Some("Invalid credentials".into()),
        },
    )
}

pub async fn register_get(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if current_user_id_from_jar(&state, &jar).is_some() {
        return Redirect::to("/records").into_response();
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
        RegisterTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            error: None,
            username: String::new(),
            email: String::new(),
        },
    )
}

pub async fn register_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> impl IntoResponse {
    let uname = form.username.trim().to_lowercase();
    let email = form.email.trim().to_lowercase();

    let validation = validate_username(&uname)
        .and_then(|_| validate_email(&email))
        .and_then(|_| validate_password(&form.password))
        .and_then(|_| {
            if form.password == form.password_confirm {
                Ok(())
            } else {
                Err("Passwords do not match.".to_string())
            }
        });

    let error = match validation {
        Err(message) => Some(message),
        Ok(()) => {
            let user = User::new(&uname, &email, &generate_password_hash(&form.password));
            match state.db.user_repo().insert(&user) {
                Ok(()) => {
                    // Sign the fresh account in right away.
                    let sid = random_session_id();
                    state
                        .sessions
                        .lock()
                        .unwrap()
                        .insert(sid.clone(), user.id.clone());
                    state
                        .flash_store
                        .lock()
                        .unwrap()
                        .entry(sid.clone())
                        .or_default()
                        .push(format!("Welcome, {}! Your account is ready.", user.username));
                    tracing::info!(username = %user.username, "New account registered");
                    return (jar.add(session_cookie(sid)), Redirect::to("/records"))
                        .into_response();
                }
                Err(StoreError::Conflict(message)) => Some(message),
                Err(e) => {
                    tracing::error!(%e, "Failed to create account");
                    Some("Could not create the account. Please try again.".into())
                }
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
        RegisterTemplate {
            current_user,
            base_url,
            flash_messages,
            has_flash_messages,
            error,
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
        },
    )
}

pub async fn logout_post(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(sid) = jar.get("session_id").map(|c| c.value().to_string()) {
        state.sessions.lock().unwrap().remove(&sid);
    }
    let cleared = jar.remove(Cookie::new("session_id", ""));
    (cleared, Redirect::to("/login")).into_response()
}

pub async fn root_get(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if current_user_id_from_jar(&state, &jar).is_some() {
        return Redirect::to("/records").into_response();
    }
    Redirect::to("/login").into_response()
}

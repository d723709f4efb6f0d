use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::models::{AppState, CurrentUser};
use crate::store::StoreError;

pub fn session_id_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get("session_id").map(|c| c.value().to_string())
}

pub fn current_user_id_from_jar(state: &AppState, jar: &CookieJar) -> Option<String> {
    let sid = session_id_from_jar(jar)?;
    state.sessions.lock().unwrap().get(&sid).cloned()
}

pub fn take_flash_messages(state: &AppState, jar: &CookieJar) -> Vec<String> {
    let sid = session_id_from_jar(jar);
    if sid.is_none() {
        return vec![];
    }
    let sid = sid.unwrap();
    let mut fs = state.flash_store.lock().unwrap();
    fs.remove(&sid).unwrap_or_else(Vec::new)
}

pub fn push_flash(state: &AppState, jar: &CookieJar, message: impl Into<String>) {
    if let Some(sid) = session_id_from_jar(jar) {
        let mut flashes = state.flash_store.lock().unwrap();
        flashes.entry(sid).or_default().push(message.into());
    }
}

pub fn build_current_user(state: &AppState, jar: &CookieJar) -> Option<CurrentUser> {
    let user_id = current_user_id_from_jar(state, jar)?;
    match state.db.user_repo().find_by_id(&user_id) {
        Ok(Some(user)) => Some(CurrentUser {
            id: user.id,
            username: user.username,
        }),
        Ok(None) => None,
        Err(e) => {
            tracing::error!(%e, "Failed to load current user");
            None
        }
    }
}

#[derive(Default)]
pub struct TemplateGlobals {
    pub current_user: Option<CurrentUser>,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
}

pub fn build_template_globals(state: &AppState, jar: &CookieJar) -> TemplateGlobals {
    let current_user = build_current_user(state, jar);
    let flash_messages = take_flash_messages(state, jar);
    let has_flash_messages = !flash_messages.is_empty();
    TemplateGlobals {
        current_user,
        base_url: state.public_base_url.clone(),
        flash_messages,
        has_flash_messages,
    }
}

pub fn inject_context(state: &AppState, jar: &CookieJar, mut html: String) -> Response {
    // Inject a global context object into the HTML.
    // We don't use this currently but it's for potential JS needs.
    let base_url = state.public_base_url.clone();
    let current_user = build_current_user(state, jar);
    let context = serde_json::json!({
        "baseUrl": base_url,
        "currentUser": current_user,
    });
    let context_str = serde_json::to_string(&context).unwrap_or_else(|_| "{}".into());
    let inject = format!(
        r#"<script>window.__APP_CONTEXT__ = {};</script></body>"#,
        context_str
    );
    html = html.replace("</body>", &inject);
    Html(html).into_response()
}

pub fn render_template<T: askama::Template>(state: &AppState, jar: &CookieJar, t: T) -> Response {
    match t.render() {
        Ok(body) => inject_context(state, jar, body),
        Err(e) => {
            tracing::error!(%e, "Template render error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

pub fn ensure_logged_in(state: &AppState, jar: &CookieJar) -> Option<Redirect> {
    if current_user_id_from_jar(state, jar).is_none() {
        return Some(Redirect::to("/login"));
    }
    None
}

/// Kill the session but keep the cookie, so the flash stored under the
/// old session id is still shown on the login page.
pub fn force_logout(state: &AppState, jar: &CookieJar, message: &str) -> Redirect {
    if let Some(sid) = session_id_from_jar(jar) {
        state.sessions.lock().unwrap().remove(&sid);
        let mut flashes = state.flash_store.lock().unwrap();
        flashes.entry(sid).or_default().push(message.to_string());
    }
    Redirect::to("/login")
}

/// A user reached for data that is not theirs. Log it loudly and end
/// the session on the spot.
pub fn access_violation(state: &AppState, jar: &CookieJar, context: &str) -> Redirect {
    let user_id = current_user_id_from_jar(state, jar).unwrap_or_else(|| "anonymous".into());
    tracing::error!(user_id, context, "Access violation");
    force_logout(state, jar, "Access denied. You have been signed out.")
}

/// Shared fallback for store errors on non-form pages. Form handlers
/// match `Conflict` and `Invalid` themselves to re-render the form.
pub fn handle_store_error(
    state: &AppState,
    jar: &CookieJar,
    err: StoreError,
    context: &str,
) -> Response {
    match err {
        StoreError::Forbidden => access_violation(state, jar, context).into_response(),
        StoreError::NotFound => {
            push_flash(state, jar, "That item does not exist.");
            Redirect::to("/records").into_response()
        }
        StoreError::Conflict(msg) | StoreError::Invalid(msg) => {
            push_flash(state, jar, msg);
            Redirect::to("/records").into_response()
        }
        other => {
            tracing::error!(%other, context, "Store error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

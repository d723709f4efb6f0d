use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::models::AppState;

// Embed the default stylesheet in the binary
pub const DEFAULT_STYLESHEET: &str = include_str!("../static/styles.css");

/// Assemble the full application router. Everything except the auth pages
/// and the stylesheet sits behind `auth_middleware`.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/records", get(handlers::records::records_get))
        .route(
            "/records/new",
            get(handlers::records::record_new_get).post(handlers::records::record_new_post),
        )
        .route("/records/:record_id", get(handlers::records::record_detail_get))
        .route(
            "/records/:record_id/edit",
            get(handlers::records::record_edit_get).post(handlers::records::record_edit_post),
        )
        .route(
            "/records/:record_id/delete",
            get(handlers::records::record_delete_get).post(handlers::records::record_delete_post),
        )
        .route(
            "/records/:record_id/share",
            get(handlers::shares::share_get).post(handlers::shares::share_post),
        )
        .route(
            "/records/:record_id/share/:grant_id/revoke",
            post(handlers::shares::share_revoke_post),
        )
        .route(
            "/records/:record_id/attachments/new",
            get(handlers::attachments::attachment_new_get)
                .post(handlers::attachments::attachment_new_post)
                // axum caps bodies at 2 MB; uploads need the full allowance
                .layer(DefaultBodyLimit::max(crate::config::UPLOAD_BODY_LIMIT)),
        )
        .route("/attachments", get(handlers::attachments::attachments_get))
        .route(
            "/attachments/:attachment_id/download",
            get(handlers::attachments::attachment_download_get),
        )
        .route(
            "/attachments/:attachment_id/delete",
            post(handlers::attachments::attachment_delete_post),
        )
        .route("/shared", get(handlers::shares::shared_get))
        .route("/profile", get(handlers::profile::profile_get))
        .route(
            "/profile/edit",
            get(handlers::profile::profile_edit_get).post(handlers::profile::profile_edit_post),
        )
        .route(
            "/profile/delete",
            get(handlers::profile::profile_delete_get).post(handlers::profile::profile_delete_post),
        )
        .route("/export/records.csv", get(handlers::export::export_records_csv))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::middleware::auth_middleware,
        ));

    // Always serve styles.css - use custom if provided, otherwise use embedded default
    let stylesheet_content = state
        .custom_css
        .clone()
        .unwrap_or_else(|| DEFAULT_STYLESHEET.to_string());

    let app = Router::new()
        .route("/", get(handlers::auth::root_get))
        .route("/login", get(handlers::auth::login_get).post(handlers::auth::login_post))
        .route(
            "/register",
            get(handlers::auth::register_get).post(handlers::auth::register_post),
        )
        .route("/logout", post(handlers::auth::logout_post))
        .route("/static/styles.css", get(move || {
            let css = stylesheet_content.clone();
            async move {
                (
                    [(axum::http::header::CONTENT_TYPE, "text/css")],
                    css
                )
            }
        }))
        .merge(protected_routes);

    app.nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=31536000, immutable"),
                ))
                .service(ServeDir::new("static")),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

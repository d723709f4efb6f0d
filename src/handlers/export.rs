use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::models::AppState;
use crate::services;
use crate::store::RecordSort;

use super::helpers::{current_user_id_from_jar, handle_store_error};

/// Download all of the signed-in user's records as CSV. Shared records
/// belong to their owners and are not included.
pub async fn export_records_csv(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(user_id) = current_user_id_from_jar(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    let records = match state
        .db
        .record_repo()
        .list_for_owner(&user_id, None, RecordSort::default())
    {
        Ok(records) => records,
        Err(e) => return handle_store_error(&state, &jar, e, "export records"),
    };
    let csv = services::records_csv(&records);
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"records.csv\"".to_string(),
        ),
    ];
    (headers, csv).into_response()
}

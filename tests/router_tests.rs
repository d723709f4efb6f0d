use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use keepsake::auth;
use keepsake::models::{AppState, Record, RecordDetails, RecordKind, User};
use keepsake::routes::build_router;
use keepsake::store::Database;

struct TestApp {
    state: AppState,
    _upload_dir: tempfile::TempDir,
}

impl TestApp {
    fn new() -> TestApp {
        let upload_dir = tempfile::tempdir().expect("tempdir");
        let state = AppState {
            db: Database::open_in_memory().expect("in-memory database"),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            flash_store: Arc::new(Mutex::new(HashMap::new())),
            public_base_url: "http://127.0.0.1:8080".to_string(),
            upload_root: upload_dir.path().to_path_buf(),
            custom_css: None,
        };
        TestApp {
            state,
            _upload_dir: upload_dir,
        }
    }

    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    fn add_user(&self, username: &str, password: &str) -> User {
        let user = User::new(
            username,
            &format!("{}@example.com", username),
            &auth::generate_password_hash(password),
        );
        self.state.db.user_repo().insert(&user).expect("user insert");
        user
    }

    /// Open a session for the user and return the cookie header value.
    fn sign_in(&self, user: &User) -> String {
        let sid = auth::random_session_id();
        self.state
            .sessions
            .lock()
            .unwrap()
            .insert(sid.clone(), user.id.clone());
        format!("session_id={}", sid)
    }
}

fn multipart_upload_body(boundary: &str, note: &str, file_name: &str, file_bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\n{}\r\n",
            boundary, note
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
            boundary, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8_lossy(&bytes).into_owned()
}

#[tokio::test]
async fn root_redirects_anonymous_visitors_to_login() {
    let app = TestApp::new();
    let response = app
        .router()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn protected_pages_require_a_session() {
    let app = TestApp::new();
    for path in [
        "/records",
        "/shared",
        "/attachments",
        "/profile",
        "/export/records.csv",
    ] {
        let response = app
            .router()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "path {}", path);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }
}

#[tokio::test]
async fn login_page_renders() {
    let app = TestApp::new();
    let response = app
        .router()
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Sign in"));
}

#[tokio::test]
async fn stylesheet_is_served_without_a_session() {
    let app = TestApp::new();
    let response = app
        .router()
        .oneshot(Request::get("/static/styles.css").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
}

#[tokio::test]
async fn login_with_valid_credentials_opens_a_session() {
    let app = TestApp::new();
    app.add_user("annanowak1", "secret-enough");

    let response = app
        .router()
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=annanowak1&password=secret-enough"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/records");
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session_id="));
    assert_eq!(app.state.sessions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn login_with_bad_password_re_renders_the_form() {
    let app = TestApp::new();
    app.add_user("annanowak1", "secret-enough");

    let response = app
        .router()
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=annanowak1&password=wrong"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Invalid credentials"));
    assert!(app.state.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn records_page_lists_the_owners_records() {
    let app = TestApp::new();
    let anna = app.add_user("annanowak1", "secret-enough");
    let record = Record::new(
        &anna.id,
        "October rent",
        "",
        RecordDetails::empty_for(RecordKind::Payment),
    );
    app.state.db.record_repo().insert(&record).unwrap();
    let cookie = app.sign_in(&anna);

    let response = app
        .router()
        .oneshot(
            Request::get("/records")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("October rent"));
    assert!(body.contains("annanowak1"));
}

#[tokio::test]
async fn record_create_form_roundtrip() {
    let app = TestApp::new();
    let anna = app.add_user("annanowak1", "secret-enough");
    let cookie = app.sign_in(&anna);

    let response = app
        .router()
        .oneshot(
            Request::post("/records/new?kind=task")
                .header(header::COOKIE, cookie.clone())
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "name=Water+the+plants&status=planned&priority=urgent&notes=",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let records = app
        .state
        .db
        .record_repo()
        .list_for_owner(&anna.id, None, Default::default())
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Water the plants");
    assert_eq!(records[0].kind, RecordKind::Task);
}

#[tokio::test]
async fn credit_create_form_roundtrip() {
    let app = TestApp::new();
    let anna = app.add_user("annanowak1", "secret-enough");
    let cookie = app.sign_in(&anna);

    let response = app
        .router()
        .oneshot(
            Request::post("/records/new?kind=credit")
                .header(header::COOKIE, cookie.clone())
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "name=Flat+mortgage&credit_type=home_loan&amount=250000&currency=EUR\
                     &installment=1200&agreement_date=2021-03-15&notes=",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let records = app
        .state
        .db
        .record_repo()
        .list_for_owner(&anna.id, Some(RecordKind::Credit), Default::default())
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Flat mortgage");
    let summary = records[0].details.summary();
    assert!(summary.contains("Home loan"));
    assert!(summary.contains("EUR"));
}

#[tokio::test]
async fn upload_larger_than_two_megabytes_is_stored() {
    let app = TestApp::new();
    let anna = app.add_user("annanowak1", "secret-enough");
    let record = Record::new(
        &anna.id,
        "Boiler installation",
        "",
        RecordDetails::empty_for(RecordKind::Renovation),
    );
    app.state.db.record_repo().insert(&record).unwrap();
    let cookie = app.sign_in(&anna);

    let boundary = "keepsake-test-boundary";
    let payload = vec![b'a'; 5 * 1024 * 1024];
    let body = multipart_upload_body(boundary, "invoice", "invoice.pdf", &payload);

    let response = app
        .router()
        .oneshot(
            Request::post(format!("/records/{}/attachments/new", record.id).as_str())
                .header(header::COOKIE, cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("/records/{}", record.id)
    );

    let attachments = app
        .state
        .db
        .attachment_repo()
        .list_for_record(&record.id)
        .unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].size_bytes, payload.len() as i64);
}

#[tokio::test]
async fn upload_over_the_size_limit_re_renders_the_form() {
    let app = TestApp::new();
    let anna = app.add_user("annanowak1", "secret-enough");
    let record = Record::new(
        &anna.id,
        "Boiler installation",
        "",
        RecordDetails::empty_for(RecordKind::Renovation),
    );
    app.state.db.record_repo().insert(&record).unwrap();
    let cookie = app.sign_in(&anna);

    let boundary = "keepsake-test-boundary";
    let payload = vec![b'a'; keepsake::config::MAX_UPLOAD_BYTES + 1];
    let body = multipart_upload_body(boundary, "invoice", "invoice.pdf", &payload);

    let response = app
        .router()
        .oneshot(
            Request::post(format!("/records/{}/attachments/new", record.id).as_str())
                .header(header::COOKIE, cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    assert!(page.contains("The file is too large."));
    assert!(app
        .state
        .db
        .attachment_repo()
        .list_for_record(&record.id)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn grantee_sees_a_shared_record_but_cannot_open_its_edit_form() {
    let app = TestApp::new();
    let anna = app.add_user("annanowak1", "secret-enough");
    let piotr = app.add_user("piotrkowalski", "secret-enough");
    let record = Record::new(
        &anna.id,
        "October rent",
        "",
        RecordDetails::empty_for(RecordKind::Payment),
    );
    app.state.db.record_repo().insert(&record).unwrap();
    app.state
        .db
        .share_repo()
        .grant(&record.id, &anna.id, &piotr.id)
        .unwrap();
    let cookie = app.sign_in(&piotr);

    let response = app
        .router()
        .oneshot(
            Request::get(format!("/records/{}", record.id).as_str())
                .header(header::COOKIE, cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("October rent"));
    assert!(body.contains("annanowak1"));

    // The edit page is owner-only; the breach ends the session.
    let response = app
        .router()
        .oneshot(
            Request::get(format!("/records/{}/edit", record.id).as_str())
                .header(header::COOKIE, cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
    assert!(app.state.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stranger_detail_view_is_denied() {
    let app = TestApp::new();
    let anna = app.add_user("annanowak1", "secret-enough");
    let piotr = app.add_user("piotrkowalski", "secret-enough");
    let record = Record::new(
        &anna.id,
        "October rent",
        "",
        RecordDetails::empty_for(RecordKind::Payment),
    );
    app.state.db.record_repo().insert(&record).unwrap();
    let cookie = app.sign_in(&piotr);

    let response = app
        .router()
        .oneshot(
            Request::get(format!("/records/{}", record.id).as_str())
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn csv_export_carries_the_owners_records_only() {
    let app = TestApp::new();
    let anna = app.add_user("annanowak1", "secret-enough");
    let piotr = app.add_user("piotrkowalski", "secret-enough");
    let rent = Record::new(
        &anna.id,
        "October rent",
        "",
        RecordDetails::empty_for(RecordKind::Payment),
    );
    app.state.db.record_repo().insert(&rent).unwrap();
    app.state
        .db
        .share_repo()
        .grant(&rent.id, &anna.id, &piotr.id)
        .unwrap();
    let lisbon = Record::new(
        &piotr.id,
        "Lisbon",
        "",
        RecordDetails::empty_for(RecordKind::Trip),
    );
    app.state.db.record_repo().insert(&lisbon).unwrap();
    let cookie = app.sign_in(&piotr);

    let response = app
        .router()
        .oneshot(
            Request::get("/export/records.csv")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let body = body_string(response).await;
    assert!(body.starts_with("kind,name,notes,details,created_at,updated_at"));
    assert!(body.contains("Lisbon"));
    // Shared records belong to their owner and stay out of the export.
    assert!(!body.contains("October rent"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new();
    let anna = app.add_user("annanowak1", "secret-enough");
    let cookie = app.sign_in(&anna);

    let response = app
        .router()
        .oneshot(
            Request::post("/logout")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
    assert!(app.state.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::new();
    let response = app
        .router()
        .oneshot(Request::get("/no-such-page").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

mod common;

use actix_web::web::Data;
use actix_web::{App, test};
use sqlx::SqlitePool;

use common::{clock, migrated_pool, peer, test_config};
use qr_attendance::routes;

async fn row_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
        .fetch_one(pool)
        .await
        .unwrap()
}

macro_rules! spawn_app {
    ($pool:expr, $config:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($pool.clone()))
                .app_data(Data::new($config.clone()))
                .app_data(Data::new(clock()))
                .configure(|cfg| routes::configure(cfg, $config.clone())),
        )
        .await
    };
}

fn scan_uri(exp_ts: i64, subject: Option<&str>, branch: Option<&str>) -> String {
    let mut uri = format!("/scan?exp_ts={exp_ts}");
    if let Some(s) = subject {
        uri.push_str(&format!("&sub={}", urlencoding::encode(s)));
    }
    if let Some(b) = branch {
        uri.push_str(&format!("&branch={}", urlencoding::encode(b)));
    }
    uri
}

#[actix_web::test]
async fn first_scan_inserts_exactly_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let pool = migrated_pool().await;
    let config = test_config(dir.path().to_str().unwrap());
    let app = spawn_app!(pool, config);

    let uri = scan_uri(clock().timestamp() + 120, Some("ML"), Some("CSE-A"));
    let req = test::TestRequest::post()
        .uri(&uri)
        .peer_addr(peer())
        .set_form([("roll", "21A1"), ("name", "Asha")])
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let body = String::from_utf8(body.to_vec()).unwrap();

    assert!(body.contains("Attendance Marked"), "unexpected body: {body}");
    assert_eq!(row_count(&pool).await, 1);

    let (roll, subject): (String, String) =
        sqlx::query_as("SELECT roll, subject FROM attendance")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(roll, "21A1");
    assert_eq!(subject, "ML");
}

#[actix_web::test]
async fn repeat_scan_is_rejected_by_store_check() {
    let dir = tempfile::tempdir().unwrap();
    let pool = migrated_pool().await;
    let config = test_config(dir.path().to_str().unwrap());
    let app = spawn_app!(pool, config);

    let uri = scan_uri(clock().timestamp() + 120, Some("ML"), Some("CSE-A"));
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&uri)
            .peer_addr(peer())
            .set_form([("roll", "21A1"), ("name", "Asha")])
            .to_request();
        let _ = test::call_and_read_body(&app, req).await;
    }

    // second submission, fresh browser: only the persisted-row check applies
    let req = test::TestRequest::post()
        .uri(&uri)
        .peer_addr(peer())
        .set_form([("roll", "21A1"), ("name", "Asha")])
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let body = String::from_utf8(body.to_vec()).unwrap();

    assert!(body.contains("Attendance Already Marked"), "unexpected body: {body}");
    assert_eq!(row_count(&pool).await, 1);
}

#[actix_web::test]
async fn repeat_scan_with_cookie_short_circuits_before_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let pool = migrated_pool().await;
    let config = test_config(dir.path().to_str().unwrap());
    let app = spawn_app!(pool, config);

    let uri = scan_uri(clock().timestamp() + 120, Some("ML"), Some("CSE-A"));
    let req = test::TestRequest::post()
        .uri(&uri)
        .peer_addr(peer())
        .set_form([("roll", "21A1"), ("name", "Asha")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("success should set a session marker")
        .into_owned();

    // even the GET form is suppressed for this marker key
    let req = test::TestRequest::get()
        .uri(&uri)
        .peer_addr(peer())
        .cookie(cookie.clone())
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("for this Subject/Branch Today"), "unexpected body: {body}");

    // and a POST from the same browser never reaches the duplicate query
    let req = test::TestRequest::post()
        .uri(&uri)
        .peer_addr(peer())
        .cookie(cookie)
        .set_form([("roll", "21B9"), ("name", "Someone Else")])
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("for this Subject/Branch Today"), "unexpected body: {body}");
    assert_eq!(row_count(&pool).await, 1);
}

#[actix_web::test]
async fn expired_token_is_rejected_regardless_of_payload() {
    let dir = tempfile::tempdir().unwrap();
    let pool = migrated_pool().await;
    let config = test_config(dir.path().to_str().unwrap());
    let app = spawn_app!(pool, config);

    let uri = scan_uri(clock().timestamp() - 60, Some("ML"), Some("CSE-A"));
    let req = test::TestRequest::post()
        .uri(&uri)
        .peer_addr(peer())
        .set_form([("roll", "21A1"), ("name", "Asha")])
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let body = String::from_utf8(body.to_vec()).unwrap();

    assert!(body.contains("QR Expired"), "unexpected body: {body}");
    assert_eq!(row_count(&pool).await, 0);

    // the GET form is refused too
    let req = test::TestRequest::get().uri(&uri).peer_addr(peer()).to_request();
    let body = test::call_and_read_body(&app, req).await;
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("QR Expired"));
}

#[actix_web::test]
async fn valid_token_renders_the_form() {
    let dir = tempfile::tempdir().unwrap();
    let pool = migrated_pool().await;
    let config = test_config(dir.path().to_str().unwrap());
    let app = spawn_app!(pool, config);

    let uri = scan_uri(clock().timestamp() + 120, Some("ML"), None);
    let req = test::TestRequest::get().uri(&uri).peer_addr(peer()).to_request();
    let body = test::call_and_read_body(&app, req).await;
    let body = String::from_utf8(body.to_vec()).unwrap();

    assert!(body.contains("name=\"roll\""));
    assert!(body.contains("sub=ML"));
}

#[actix_web::test]
async fn exp_only_token_form_round_trips_to_success() {
    let dir = tempfile::tempdir().unwrap();
    let pool = migrated_pool().await;
    let config = test_config(dir.path().to_str().unwrap());
    let app = spawn_app!(pool, config);

    // a +2min expiry can wrap past midnight; pin to end of day then
    let now = clock().now();
    let expiry = now + chrono::Duration::minutes(2);
    let exp = if expiry.date_naive() == now.date_naive() {
        expiry.format("%H:%M").to_string()
    } else {
        "23:59".to_string()
    };

    let uri = format!("/scan?exp={}&sub=ML", urlencoding::encode(&exp));
    let req = test::TestRequest::get().uri(&uri).peer_addr(peer()).to_request();
    let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();

    let start = body.find("action=\"").unwrap() + "action=\"".len();
    let end = start + body[start..].find('"').unwrap();
    let action = body[start..end].replace("&amp;", "&");
    assert!(!action.contains("exp_ts"), "form action invented a timestamp: {action}");

    let req = test::TestRequest::post()
        .uri(&action)
        .peer_addr(peer())
        .set_form([("roll", "21A1"), ("name", "Asha")])
        .to_request();
    let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(body.contains("Attendance Marked"), "unexpected body: {body}");
    assert_eq!(row_count(&pool).await, 1);
}

#[actix_web::test]
async fn scans_for_different_subjects_both_land() {
    let dir = tempfile::tempdir().unwrap();
    let pool = migrated_pool().await;
    let config = test_config(dir.path().to_str().unwrap());
    let app = spawn_app!(pool, config);

    for subject in ["ML", "DBMS"] {
        let uri = scan_uri(clock().timestamp() + 120, Some(subject), Some("CSE-A"));
        let req = test::TestRequest::post()
            .uri(&uri)
            .peer_addr(peer())
            .set_form([("roll", "21A1"), ("name", "Asha")])
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Attendance Marked"), "unexpected body: {body}");
    }

    assert_eq!(row_count(&pool).await, 2);
}

/// The scenario from the drawing board: generate for ML/CSE-A, scan once,
/// scan again, then come back after the code lapsed.
#[actix_web::test]
async fn ml_cse_a_walkthrough() {
    let dir = tempfile::tempdir().unwrap();
    let pool = migrated_pool().await;
    let config = test_config(dir.path().to_str().unwrap());
    let app = spawn_app!(pool, config);

    let live = scan_uri(clock().timestamp() + 120, Some("ML"), Some("CSE-A"));
    let req = test::TestRequest::post()
        .uri(&live)
        .peer_addr(peer())
        .set_form([("roll", "21A1"), ("name", "Asha")])
        .to_request();
    let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(body.contains("Attendance Marked"));

    let req = test::TestRequest::post()
        .uri(&live)
        .peer_addr(peer())
        .set_form([("roll", "21A1"), ("name", "Asha")])
        .to_request();
    let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(body.contains("Attendance Already Marked"));

    let lapsed = scan_uri(clock().timestamp() - 60, Some("ML"), Some("CSE-A"));
    let req = test::TestRequest::post()
        .uri(&lapsed)
        .peer_addr(peer())
        .set_form([("roll", "21A2"), ("name", "Ravi")])
        .to_request();
    let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(body.contains("QR Expired"));

    assert_eq!(row_count(&pool).await, 1);
}

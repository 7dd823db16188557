use actix_web::error::ErrorInternalServerError;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};
use sqlx::SqlitePool;
use tracing::{error, info, instrument};

use crate::api::{html, text};
use crate::auth::session::{Session, marker_key};
use crate::clock::Clock;
use crate::config::Config;
use crate::model::attendance::AttendanceRecord;
use crate::models::{ScanForm, ScanQuery};
use crate::pages;
use crate::qr::scan_query_string;
use crate::store;

const EXPIRED: &str = "QR Expired ❌";
const ALREADY_MARKED: &str = "Attendance Already Marked ⚠️";
const ALREADY_MARKED_TODAY: &str = "Attendance Already Marked for this Subject/Branch Today ⚠️";

/// Token validity. `exp_ts` carries the real expiry instant and is what the
/// check uses; tokens without it fall back to the HH:MM time-of-day
/// comparison, which only holds within a single day.
fn token_expired(now: DateTime<FixedOffset>, exp: Option<&str>, exp_ts: Option<i64>) -> bool {
    if let Some(ts) = exp_ts {
        return now.timestamp() > ts;
    }
    if let Some(raw) = exp {
        if let Ok(parsed) = NaiveTime::parse_from_str(raw, "%H:%M") {
            // the token has minute precision, so truncate before comparing
            let minute = now
                .time()
                .with_second(0)
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or_else(|| now.time());
            return minute > parsed;
        }
    }
    false
}

fn normalized<'a>(value: &'a Option<String>) -> Option<&'a str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// GET /scan: validate the token and show the roll/name form.
pub async fn scan_form(
    query: web::Query<ScanQuery>,
    clock: web::Data<Clock>,
    session: Session,
) -> impl Responder {
    let subject = normalized(&query.sub);
    let branch = normalized(&query.branch);

    if token_expired(clock.now(), query.exp.as_deref(), query.exp_ts) {
        return text(EXPIRED);
    }

    let key = marker_key(clock.today(), subject, branch);
    if session.has_marker(&key) {
        return text(ALREADY_MARKED_TODAY);
    }

    html(pages::scan_page(&scan_query_string(
        query.exp.as_deref().unwrap_or(""),
        query.exp_ts,
        subject,
        branch,
    )))
}

/// POST /scan: the check-then-insert core. The pre-check and the session
/// marker give the user-facing rejections; the dedup index is the backstop
/// when two scans for the same tuple race.
#[instrument(name = "scan_submit", skip_all, fields(roll = %form.roll, sub = ?query.sub, branch = ?query.branch))]
pub async fn scan_submit(
    query: web::Query<ScanQuery>,
    form: web::Form<ScanForm>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    clock: web::Data<Clock>,
    session: Session,
) -> actix_web::Result<impl Responder> {
    let subject = normalized(&query.sub);
    let branch = normalized(&query.branch);

    if token_expired(clock.now(), query.exp.as_deref(), query.exp_ts) {
        info!("Rejected: token expired");
        return Ok(text(EXPIRED));
    }

    let date = clock.today().to_string();
    let key = marker_key(clock.today(), subject, branch);
    if session.has_marker(&key) {
        info!("Rejected: session already marked");
        return Ok(text(ALREADY_MARKED_TODAY));
    }

    let duplicate = store::find_duplicate(pool.get_ref(), &form.roll, &date, subject, branch)
        .await
        .map_err(|e| {
            error!(error = %e, "Duplicate check failed");
            ErrorInternalServerError("Database error")
        })?;

    if duplicate {
        info!("Rejected: row already present");
        let session = session.with_marker(&key);
        return Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .cookie(session.to_cookie(config.get_ref()))
            .body(ALREADY_MARKED));
    }

    let record = AttendanceRecord {
        roll: form.roll.clone(),
        name: form.name.clone(),
        date,
        time: clock.now_time().format("%H:%M:%S").to_string(),
        subject: subject.map(str::to_string),
        branch: branch.map(str::to_string),
    };

    match store::insert_record(pool.get_ref(), &record).await {
        Ok(()) => {
            info!("Attendance recorded");
            let session = session.with_marker(&key);
            Ok(HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .cookie(session.to_cookie(config.get_ref()))
                .body(pages::success_page()))
        }
        // a concurrent twin won the insert; same outcome as the pre-check
        Err(e) if store::is_unique_violation(&e) => {
            info!("Rejected: lost insert race");
            let session = session.with_marker(&key);
            Ok(HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .cookie(session.to_cookie(config.get_ref()))
                .body(ALREADY_MARKED))
        }
        Err(e) => {
            error!(error = %e, "Insert failed");
            Err(ErrorInternalServerError("Database error"))
        }
    }
}

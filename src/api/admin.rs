use actix_web::error::ErrorInternalServerError;
use actix_web::{Responder, web};
use sqlx::SqlitePool;
use tracing::{error, info, instrument};

use crate::api::{html, redirect};
use crate::auth::session::Session;
use crate::clock::Clock;
use crate::model::attendance::AttendanceRecord;
use crate::models::{AdminQuery, ManualAddForm};
use crate::pages;
use crate::store;

pub async fn dashboard(
    session: Session,
    query: web::Query<AdminQuery>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;
    Ok(html(pages::admin_page(query.added.as_deref(), None)))
}

/// Admin-entered row. Shares the duplicate tuple with the scan path, so a
/// manual entry cannot sneak past what a scan would have been refused.
#[instrument(name = "manual_add", skip(session, form, pool, clock), fields(roll = %form.roll))]
pub async fn manual_add(
    session: Session,
    form: web::Form<ManualAddForm>,
    pool: web::Data<SqlitePool>,
    clock: web::Data<Clock>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let roll = form.roll.trim();
    let name = form.name.trim();
    if roll.is_empty() || name.is_empty() {
        return Ok(redirect("/admin?added=error"));
    }

    let subject = form.subject.as_deref().filter(|s| !s.is_empty());
    let branch = form.branch.as_deref().filter(|s| !s.is_empty());
    let date = form
        .date
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| clock.today().to_string());
    let time = form
        .time
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| clock.now_time().format("%H:%M:%S").to_string());

    let duplicate = store::find_duplicate(pool.get_ref(), roll, &date, subject, branch)
        .await
        .map_err(|e| {
            error!(error = %e, "Duplicate check failed");
            ErrorInternalServerError("Database error")
        })?;
    if duplicate {
        return Ok(redirect("/admin?added=exists"));
    }

    let record = AttendanceRecord {
        roll: roll.to_string(),
        name: name.to_string(),
        date,
        time,
        subject: subject.map(str::to_string),
        branch: branch.map(str::to_string),
    };

    match store::insert_record(pool.get_ref(), &record).await {
        Ok(()) => {
            info!("Manual record added");
            Ok(redirect("/admin?added=1"))
        }
        Err(e) if store::is_unique_violation(&e) => Ok(redirect("/admin?added=exists")),
        Err(e) => {
            error!(error = %e, "Manual insert failed");
            Err(ErrorInternalServerError("Database error"))
        }
    }
}

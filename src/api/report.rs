use std::fs;
use std::path::Path;

use actix_web::error::ErrorInternalServerError;
use actix_web::http::header;
use actix_web::{HttpResponse, Responder, web};
use sqlx::SqlitePool;
use tracing::{error, info, instrument};

use crate::api::{html, redirect};
use crate::auth::session::Session;
use crate::clock::Clock;
use crate::config::Config;
use crate::export;
use crate::models::{ClearForm, DeleteQuery, ViewQuery};
use crate::pages;
use crate::store;

fn normalized(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

pub async fn view(
    session: Session,
    query: web::Query<ViewQuery>,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let subject = normalized(&query.sub);
    let branch = normalized(&query.branch);
    let rows = store::list_records(pool.get_ref(), subject, branch)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list records");
            ErrorInternalServerError("Database error")
        })?;

    Ok(html(pages::view_page(
        &rows,
        subject,
        branch,
        query.cleared.as_deref(),
        query.backup.as_deref(),
        query.added.as_deref(),
    )))
}

/// CSV download of the current listing. Open in this revision; the listing
/// page itself stays admin-gated.
pub async fn export_csv(
    query: web::Query<ViewQuery>,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    let subject = normalized(&query.sub);
    let branch = normalized(&query.branch);
    let rows = store::list_records(pool.get_ref(), subject, branch)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list records for export");
            ErrorInternalServerError("Database error")
        })?;

    let filename = export::export_file_name(subject, branch);
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(export::rows_to_csv(&rows)))
}

/// Bulk delete with a pre-delete CSV snapshot. Nothing matching means no
/// backup file and no delete.
#[instrument(name = "clear_all", skip(session, form, pool, config, clock), fields(subject = ?form.subject, branch = ?form.branch))]
pub async fn clear_all(
    session: Session,
    form: web::Form<ClearForm>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    clock: web::Data<Clock>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let subject = form.subject.as_deref().filter(|s| !s.is_empty());
    let branch = form.branch.as_deref().filter(|s| !s.is_empty());

    let rows = store::list_records(pool.get_ref(), subject, branch)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to read rows for backup");
            ErrorInternalServerError("Database error")
        })?;

    let filter_qs = format!(
        "sub={}&branch={}",
        urlencoding::encode(subject.unwrap_or("")),
        urlencoding::encode(branch.unwrap_or(""))
    );

    if rows.is_empty() {
        return Ok(redirect(&format!("/view?cleared=2&{filter_qs}")));
    }

    let backup_name = export::backup_file_name(subject, branch, clock.now());
    let backup_dir = Path::new(&config.static_dir).join("backups");
    export::write_backup(&backup_dir, &backup_name, &rows).map_err(|e| {
        error!(error = %e, "Backup write failed, aborting clear");
        ErrorInternalServerError("Backup failed")
    })?;

    let deleted = store::delete_matching(pool.get_ref(), subject, branch)
        .await
        .map_err(|e| {
            error!(error = %e, "Bulk delete failed");
            ErrorInternalServerError("Database error")
        })?;
    info!(deleted, backup = %backup_name, "Cleared records");

    Ok(redirect(&format!(
        "/view?cleared=1&backup={}&{filter_qs}",
        urlencoding::encode(&backup_name)
    )))
}

pub async fn delete(
    session: Session,
    query: web::Query<DeleteQuery>,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let (roll, date, time) = match (
        normalized(&query.roll),
        normalized(&query.date),
        normalized(&query.time),
    ) {
        (Some(r), Some(d), Some(t)) => (r, d, t),
        _ => return Ok(redirect("/view")),
    };
    let subject = normalized(&query.subject);

    store::delete_record(pool.get_ref(), roll, date, time, subject)
        .await
        .map_err(|e| {
            error!(error = %e, "Delete failed");
            ErrorInternalServerError("Database error")
        })?;

    // keep the subject filter the admin was looking at
    match subject {
        Some(subject) => Ok(redirect(&format!(
            "/view?sub={}",
            urlencoding::encode(subject)
        ))),
        None => Ok(redirect("/view")),
    }
}

/// Serves one backup CSV as a download. The file name is a single path
/// segment; anything trying to walk out of the backups directory is refused.
pub async fn serve_backup(
    path: web::Path<String>,
    config: web::Data<Config>,
) -> impl Responder {
    let name = path.into_inner();
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return HttpResponse::NotFound().body("Backup not found");
    }

    let full = Path::new(&config.static_dir).join("backups").join(&name);
    match fs::read(&full) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ))
            .body(bytes),
        Err(_) => HttpResponse::NotFound().body("Backup not found"),
    }
}

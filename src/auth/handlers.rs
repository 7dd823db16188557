use actix_web::error::ErrorInternalServerError;
use actix_web::http::header;
use actix_web::{HttpResponse, Responder, web};
use sqlx::SqlitePool;
use tracing::{error, info, instrument};

use crate::auth::session::Session;
use crate::config::Config;
use crate::models::LoginForm;
use crate::pages;

pub async fn login_form() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(pages::login_page(false))
}

/// Credential check against the single seeded admin row. The stored password
/// is plaintext; hardening the credential store is out of scope.
#[instrument(name = "login", skip(form, pool, config, session), fields(username = %form.username))]
pub async fn login(
    form: web::Form<LoginForm>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    session: Session,
) -> actix_web::Result<impl Responder> {
    if form.username.trim().is_empty() || form.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(pages::login_page(true)));
    }

    let matched = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM admin WHERE username = ? AND password = ? LIMIT 1)",
    )
    .bind(&form.username)
    .bind(&form.password)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Database error while checking credentials");
        ErrorInternalServerError("Database error")
    })?;

    if matched != 0 {
        info!("Login successful");
        let session = session.with_admin(true);
        return Ok(HttpResponse::Found()
            .cookie(session.to_cookie(config.get_ref()))
            .insert_header((header::LOCATION, "/admin"))
            .finish());
    }

    info!("Invalid credentials");
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(pages::login_page(true)))
}

/// Drops the admin flag but keeps any scan markers the browser accumulated.
pub async fn logout(session: Session, config: web::Data<Config>) -> impl Responder {
    let session = session.with_admin(false);
    HttpResponse::Found()
        .cookie(session.to_cookie(config.get_ref()))
        .insert_header((header::LOCATION, "/"))
        .finish()
}

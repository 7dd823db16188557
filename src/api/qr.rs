use std::fs;
use std::path::Path;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{error, info, instrument};

use crate::api::html;
use crate::auth::session::Session;
use crate::clock::Clock;
use crate::config::Config;
use crate::models::GenerateQuery;
use crate::pages::{self, QrPanel};
use crate::qr;

/// Issues a fresh QR token and shows it on the dashboard. Encoding or file
/// I/O failures are reported on the page; the request never dies on them.
#[instrument(name = "generate_qr", skip(req, session, query, config, clock), fields(sub = ?query.sub, branch = ?query.branch))]
pub async fn generate(
    req: HttpRequest,
    session: Session,
    query: web::Query<GenerateQuery>,
    config: web::Data<Config>,
    clock: web::Data<Clock>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let subject = query.sub.as_deref().filter(|s| !s.is_empty());
    let branch = query.branch.as_deref().filter(|s| !s.is_empty());
    let base = base_url(&req, &config);

    let panel = match qr::issue(
        &base,
        subject,
        branch,
        clock.get_ref(),
        config.qr_ttl_minutes,
        &config.static_dir,
    ) {
        Ok(token) => {
            info!(expiry = %token.expiry, "QR token issued");
            QrPanel {
                expiry: token.expiry,
                subject: subject.map(str::to_string),
                branch: branch.map(str::to_string),
                error: None,
            }
        }
        Err(e) => {
            error!(error = %e, "QR generation failed");
            QrPanel {
                expiry: String::new(),
                subject: subject.map(str::to_string),
                branch: branch.map(str::to_string),
                error: Some(e.to_string()),
            }
        }
    };

    Ok(html(pages::admin_page(None, Some(&panel))))
}

fn base_url(req: &HttpRequest, config: &Config) -> String {
    if let Some(base) = &config.base_url {
        return base.clone();
    }
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

pub async fn serve_qr(config: web::Data<Config>) -> impl Responder {
    let path = Path::new(&config.static_dir).join(qr::QR_FILE);
    match fs::read(&path) {
        Ok(bytes) => HttpResponse::Ok().content_type("image/png").body(bytes),
        Err(_) => HttpResponse::NotFound().body("QR not found"),
    }
}

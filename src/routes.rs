use crate::{
    api::{admin, qr, report, scan},
    auth::handlers,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let scan_limiter = Arc::new(build_limiter(config.rate_scan_per_min));

    // Public routes
    cfg.service(
        web::resource("/")
            .wrap(login_limiter)
            .route(web::get().to(handlers::login_form))
            .route(web::post().to(handlers::login)),
    )
    .service(web::resource("/logout").route(web::get().to(handlers::logout)))
    .service(
        web::resource("/scan")
            .wrap(scan_limiter)
            .route(web::get().to(scan::scan_form))
            .route(web::post().to(scan::scan_submit)),
    )
    .service(web::resource("/export").route(web::get().to(report::export_csv)))
    .service(web::resource("/static/qr.png").route(web::get().to(qr::serve_qr)))
    .service(web::resource("/static/backups/{file}").route(web::get().to(report::serve_backup)));

    // Admin routes; each handler checks the session and bounces to the login
    // form itself, so no extra middleware layer here.
    cfg.service(web::resource("/admin").route(web::get().to(admin::dashboard)))
        .service(web::resource("/generate").route(web::get().to(qr::generate)))
        .service(web::resource("/view").route(web::get().to(report::view)))
        .service(web::resource("/manual_add").route(web::post().to(admin::manual_add)))
        .service(web::resource("/delete").route(web::get().to(report::delete)))
        .service(web::resource("/clear_all").route(web::post().to(report::clear_all)));
}

use std::collections::HashMap;

use actix_web::cookie::Cookie;
use actix_web::error::ErrorInternalServerError;
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web::Data};
use chrono::NaiveDate;
use futures::future::{Ready, ready};

use crate::auth::token::{issue_session, verify_session};
use crate::config::Config;
use crate::store::WILDCARD;

pub const SESSION_COOKIE: &str = "session";

/// Duplicate-suppression key for one (date, subject, branch) combination.
pub fn marker_key(date: NaiveDate, subject: Option<&str>, branch: Option<&str>) -> String {
    format!(
        "marked_{}_{}_{}",
        date,
        subject.unwrap_or(WILDCARD),
        branch.unwrap_or(WILDCARD)
    )
}

/// Verified state of the caller's session cookie. A missing, tampered or
/// expired cookie degrades to an anonymous session rather than an error.
#[derive(Debug, Default, Clone)]
pub struct Session {
    pub admin: bool,
    pub markers: HashMap<String, bool>,
}

impl Session {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.admin {
            Ok(())
        } else {
            Err(LoginRedirect.into())
        }
    }

    pub fn has_marker(&self, key: &str) -> bool {
        self.markers.get(key).copied().unwrap_or(false)
    }

    pub fn with_marker(mut self, key: &str) -> Self {
        self.markers.insert(key.to_string(), true);
        self
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    /// Re-signs the session into a fresh cookie, restarting its lifetime.
    pub fn to_cookie(&self, config: &Config) -> Cookie<'static> {
        let token = issue_session(
            self.admin,
            self.markers.clone(),
            &config.session_secret,
            config.session_ttl,
        );
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .finish()
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ErrorInternalServerError("Config missing"))),
        };

        let claims = req
            .cookie(SESSION_COOKIE)
            .and_then(|c| verify_session(c.value(), &config.session_secret).ok());

        ready(Ok(match claims {
            Some(claims) => Session {
                admin: claims.admin,
                markers: claims.markers,
            },
            None => Session::default(),
        }))
    }
}

/// Admin-gated pages bounce anonymous callers to the login form instead of
/// returning a bare 401.
#[derive(Debug)]
pub struct LoginRedirect;

impl std::fmt::Display for LoginRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "admin login required")
    }
}

impl ResponseError for LoginRedirect {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, "/"))
            .finish()
    }
}

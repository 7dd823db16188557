use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::models::SessionClaims;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub fn issue_session(
    admin: bool,
    markers: HashMap<String, bool>,
    secret: &str,
    ttl: usize,
) -> String {
    let claims = SessionClaims {
        admin,
        markers,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn verify_session(token: &str, secret: &str) -> Result<SessionClaims, String> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_markers_and_admin_flag() {
        let mut markers = HashMap::new();
        markers.insert("marked_2026-01-05_ML_CSE-A".to_string(), true);

        let token = issue_session(true, markers.clone(), "secret123", 3600);
        let claims = verify_session(&token, "secret123").unwrap();

        assert!(claims.admin);
        assert_eq!(claims.markers, markers);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_session(false, HashMap::new(), "secret123", 3600);
        assert!(verify_session(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // jsonwebtoken applies default leeway, so back-date well past it
        let claims = SessionClaims {
            admin: false,
            markers: HashMap::new(),
            exp: now() - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("secret123".as_bytes()),
        )
        .unwrap();
        assert!(verify_session(&stale, "secret123").is_err());
    }
}

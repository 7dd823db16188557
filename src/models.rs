use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct GenerateQuery {
    pub sub: Option<String>,
    pub branch: Option<String>,
}

#[derive(Deserialize)]
pub struct AdminQuery {
    pub added: Option<String>,
}

/// Token payload carried in the scan URL. `exp` is the human-readable HH:MM
/// shown under the QR code; `exp_ts` is the unix instant the validity check
/// actually uses.
#[derive(Deserialize)]
pub struct ScanQuery {
    pub exp: Option<String>,
    pub exp_ts: Option<i64>,
    pub sub: Option<String>,
    pub branch: Option<String>,
}

#[derive(Deserialize)]
pub struct ScanForm {
    pub roll: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct ViewQuery {
    pub sub: Option<String>,
    pub branch: Option<String>,
    pub cleared: Option<String>,
    pub backup: Option<String>,
    pub added: Option<String>,
}

#[derive(Deserialize)]
pub struct ManualAddForm {
    pub roll: String,
    pub name: String,
    pub subject: Option<String>,
    pub branch: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub roll: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub subject: Option<String>,
}

#[derive(Deserialize)]
pub struct ClearForm {
    pub subject: Option<String>,
    pub branch: Option<String>,
}

/// Signed session cookie payload. `markers` maps marker keys
/// (date + subject + branch) to the already-marked flag; `admin` gates the
/// dashboard routes.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub admin: bool,
    #[serde(default)]
    pub markers: HashMap<String, bool>,
    pub exp: usize,
    pub jti: String,
}

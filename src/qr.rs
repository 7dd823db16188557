use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use image::Luma;
use qrcode::QrCode;

use crate::clock::Clock;

pub const QR_FILE: &str = "qr.png";

/// Everything the dashboard needs to show after generating a code.
pub struct IssuedToken {
    pub url: String,
    pub expiry: String,
    pub expiry_ts: i64,
}

/// Builds the scan URL for a token expiring `ttl_minutes` from now and
/// renders it as a PNG at `<static_dir>/qr.png`, replacing the previous
/// image. Rendering failures bubble up; the caller reports them on the
/// dashboard instead of letting the request die.
pub fn issue(
    base_url: &str,
    subject: Option<&str>,
    branch: Option<&str>,
    clock: &Clock,
    ttl_minutes: i64,
    static_dir: &str,
) -> Result<IssuedToken> {
    let expiry_dt = clock.now() + Duration::minutes(ttl_minutes);
    let expiry = expiry_dt.format("%H:%M").to_string();
    let expiry_ts = expiry_dt.timestamp();

    let url = format!(
        "{}/scan?{}",
        base_url.trim_end_matches('/'),
        scan_query_string(&expiry, Some(expiry_ts), subject, branch)
    );

    render_png(&url, static_dir)?;

    Ok(IssuedToken {
        url,
        expiry,
        expiry_ts,
    })
}

/// Query string shared by the QR link and the scan form action, so a POST
/// lands with exactly the token the student scanned. `expiry_ts` is absent
/// for legacy HH:MM-only tokens and must stay absent in the form action.
pub fn scan_query_string(
    expiry: &str,
    expiry_ts: Option<i64>,
    subject: Option<&str>,
    branch: Option<&str>,
) -> String {
    let mut qs = format!("exp={}", urlencoding::encode(expiry));
    if let Some(ts) = expiry_ts {
        qs.push_str(&format!("&exp_ts={ts}"));
    }
    if let Some(subject) = subject {
        qs.push_str(&format!("&sub={}", urlencoding::encode(subject)));
    }
    if let Some(branch) = branch {
        qs.push_str(&format!("&branch={}", urlencoding::encode(branch)));
    }
    qs
}

fn render_png(url: &str, static_dir: &str) -> Result<()> {
    let code = QrCode::new(url.as_bytes()).context("Failed to encode QR payload")?;
    let img = code.render::<Luma<u8>>().min_dimensions(240, 240).build();

    fs::create_dir_all(static_dir).context("Failed to create static directory")?;
    let path = Path::new(static_dir).join(QR_FILE);
    img.save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

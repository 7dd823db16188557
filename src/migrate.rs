use anyhow::Result;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Name of the uniqueness index that backs duplicate suppression. Missing
/// subject/branch collapse to the same sentinel the marker keys use, so a
/// concurrent check-then-insert pair cannot both land.
const DEDUP_INDEX_SQL: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_dedup \
     ON attendance(roll, date, COALESCE(subject, 'general'), COALESCE(branch, 'general'))";

/// Brings the store up to the current six-column schema. Runs once at process
/// start and is safe to run again on every restart: each step either creates
/// something guarded by IF NOT EXISTS or inspects the live schema first.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE TABLE IF NOT EXISTS admin(username TEXT, password TEXT)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS attendance(\
         roll TEXT, name TEXT, date TEXT, time TEXT, subject TEXT, branch TEXT)",
    )
    .execute(pool)
    .await?;

    let mut cols = table_columns(pool, "attendance").await?;

    // A table created by the oldest revision carries a surrogate id column.
    // Rebuild it without the id, keeping whichever data columns it had.
    if cols.iter().any(|c| c == "id") {
        info!("Rebuilding legacy attendance table without surrogate id");
        rebuild_without_id(pool, &cols).await?;
        cols = table_columns(pool, "attendance").await?;
    }

    // Intermediate revisions lack subject and/or branch. An ALTER failure is
    // logged and swallowed; the service keeps running on the degraded schema.
    for col in ["subject", "branch"] {
        if !cols.iter().any(|c| c == col) {
            let alter = format!("ALTER TABLE attendance ADD COLUMN {col} TEXT");
            if let Err(e) = sqlx::query(&alter).execute(pool).await {
                warn!(error = %e, column = col, "Failed to add attendance column, continuing");
            }
        }
    }

    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin")
        .fetch_one(pool)
        .await?;
    if admins == 0 {
        sqlx::query("INSERT INTO admin(username, password) VALUES('admin', 'admin123')")
            .execute(pool)
            .await?;
        info!("Seeded default admin credential");
    }

    // Legacy data-entry quirk: old rows recorded the subject as 'P&S'.
    if let Err(e) = sqlx::query("UPDATE attendance SET subject = 'P and S' WHERE subject = 'P&S'")
        .execute(pool)
        .await
    {
        warn!(error = %e, "Failed to normalize legacy subject code, continuing");
    }

    // Creation fails when pre-migration duplicates exist; the request-level
    // duplicate checks still apply, so keep going.
    if let Err(e) = sqlx::query(DEDUP_INDEX_SQL).execute(pool).await {
        warn!(error = %e, "Failed to create dedup index, duplicate protection degraded");
    }

    Ok(())
}

async fn rebuild_without_id(pool: &SqlitePool, cols: &[String]) -> Result<()> {
    let mut keep: Vec<&str> = vec!["roll", "name", "date", "time"];
    for extra in ["subject", "branch"] {
        if cols.iter().any(|c| c == extra) {
            keep.push(extra);
        }
    }
    let col_list = keep.join(", ");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS attendance_new(\
         roll TEXT, name TEXT, date TEXT, time TEXT, subject TEXT, branch TEXT)",
    )
    .execute(pool)
    .await?;
    sqlx::query(&format!(
        "INSERT INTO attendance_new({col_list}) SELECT {col_list} FROM attendance"
    ))
    .execute(pool)
    .await?;
    sqlx::query("DROP TABLE attendance").execute(pool).await?;
    sqlx::query("ALTER TABLE attendance_new RENAME TO attendance")
        .execute(pool)
        .await?;
    Ok(())
}

async fn table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|r| r.try_get::<String, _>("name").map_err(Into::into))
        .collect()
}

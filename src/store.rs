use sqlx::SqlitePool;

use crate::model::attendance::AttendanceRecord;

/// Absent subject/branch collapse to this value in every duplicate
/// comparison, matching the marker keys and the dedup index.
pub const WILDCARD: &str = "general";

/// True when a row already exists for the (roll, date, subject, branch)
/// tuple. Callers still treat the subsequent insert as fallible: under
/// concurrent scans the dedup index is what actually enforces the invariant.
pub async fn find_duplicate(
    pool: &SqlitePool,
    roll: &str,
    date: &str,
    subject: Option<&str>,
    branch: Option<&str>,
) -> sqlx::Result<bool> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM attendance \
         WHERE roll = ? AND date = ? \
         AND COALESCE(subject, 'general') = COALESCE(?, 'general') \
         AND COALESCE(branch, 'general') = COALESCE(?, 'general') LIMIT 1)",
    )
    .bind(roll)
    .bind(date)
    .bind(subject)
    .bind(branch)
    .fetch_one(pool)
    .await?;
    Ok(exists != 0)
}

pub async fn insert_record(pool: &SqlitePool, record: &AttendanceRecord) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO attendance(roll, name, date, time, subject, branch) \
         VALUES(?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.roll)
    .bind(&record.name)
    .bind(&record.date)
    .bind(&record.time)
    .bind(record.subject.as_deref())
    .bind(record.branch.as_deref())
    .execute(pool)
    .await?;
    Ok(())
}

/// Rows optionally filtered by subject and/or branch, newest first.
pub async fn list_records(
    pool: &SqlitePool,
    subject: Option<&str>,
    branch: Option<&str>,
) -> sqlx::Result<Vec<AttendanceRecord>> {
    let (where_clause, bindings) = filter_clause(subject, branch);
    let sql = format!(
        "SELECT roll, name, date, time, subject, branch FROM attendance {where_clause} \
         ORDER BY date DESC, time DESC"
    );

    let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql);
    for b in bindings {
        query = query.bind(b);
    }
    query.fetch_all(pool).await
}

pub async fn delete_record(
    pool: &SqlitePool,
    roll: &str,
    date: &str,
    time: &str,
    subject: Option<&str>,
) -> sqlx::Result<u64> {
    let result = if let Some(subject) = subject {
        sqlx::query("DELETE FROM attendance WHERE roll = ? AND date = ? AND time = ? AND subject = ?")
            .bind(roll)
            .bind(date)
            .bind(time)
            .bind(subject)
            .execute(pool)
            .await?
    } else {
        sqlx::query("DELETE FROM attendance WHERE roll = ? AND date = ? AND time = ?")
            .bind(roll)
            .bind(date)
            .bind(time)
            .execute(pool)
            .await?
    };
    Ok(result.rows_affected())
}

/// Bulk delete for the clear-and-backup operation.
pub async fn delete_matching(
    pool: &SqlitePool,
    subject: Option<&str>,
    branch: Option<&str>,
) -> sqlx::Result<u64> {
    let (where_clause, bindings) = filter_clause(subject, branch);
    let sql = format!("DELETE FROM attendance {where_clause}");

    let mut query = sqlx::query(&sql);
    for b in bindings {
        query = query.bind(b);
    }
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

fn filter_clause(subject: Option<&str>, branch: Option<&str>) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut bindings = Vec::new();

    if let Some(subject) = subject {
        conditions.push("subject = ?");
        bindings.push(subject.to_string());
    }
    if let Some(branch) = branch {
        conditions.push("branch = ?");
        bindings.push(branch.to_string());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (where_clause, bindings)
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed"))
}

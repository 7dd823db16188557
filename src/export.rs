use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};

use crate::model::attendance::AttendanceRecord;

pub const CSV_HEADER: &str = "Roll,Name,Date,Time,Subject,Branch";

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Serializes rows in listing order under the fixed six-column header.
pub fn rows_to_csv(rows: &[AttendanceRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for r in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_quote(&r.roll),
            csv_quote(&r.name),
            csv_quote(&r.date),
            csv_quote(&r.time),
            csv_quote(r.subject.as_deref().unwrap_or("")),
            csv_quote(r.branch.as_deref().unwrap_or("")),
        ));
    }
    out
}

/// Download name for /export; the branch filter wins when both are active.
pub fn export_file_name(subject: Option<&str>, branch: Option<&str>) -> String {
    match (subject, branch) {
        (_, Some(branch)) => format!("attendance_{branch}.csv"),
        (Some(subject), None) => format!("attendance_{subject}.csv"),
        (None, None) => "attendance.csv".to_string(),
    }
}

pub fn backup_file_name(
    subject: Option<&str>,
    branch: Option<&str>,
    now: DateTime<FixedOffset>,
) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    match (subject, branch) {
        (Some(subject), Some(branch)) => format!("attendance_{subject}_{branch}_backup_{stamp}.csv"),
        (Some(subject), None) => format!("attendance_{subject}_backup_{stamp}.csv"),
        (None, Some(branch)) => format!("attendance_{branch}_backup_{stamp}.csv"),
        (None, None) => format!("attendance_backup_{stamp}.csv"),
    }
}

/// Writes the pre-delete snapshot. Callers skip this entirely when there is
/// nothing to delete.
pub fn write_backup(backup_dir: &Path, name: &str, rows: &[AttendanceRecord]) -> Result<()> {
    fs::create_dir_all(backup_dir).context("Failed to create backup directory")?;
    let path = backup_dir.join(name);
    fs::write(&path, rows_to_csv(rows))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(roll: &str, name: &str, subject: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            roll: roll.to_string(),
            name: name.to_string(),
            date: "2026-01-05".to_string(),
            time: "09:12:00".to_string(),
            subject: subject.map(str::to_string),
            branch: Some("CSE-A".to_string()),
        }
    }

    #[test]
    fn csv_preserves_row_order_and_blanks_missing_fields() {
        let rows = vec![row("21A1", "Asha", Some("ML")), row("21A2", "Ravi", None)];
        let csv = rows_to_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "21A1,Asha,2026-01-05,09:12:00,ML,CSE-A");
        assert_eq!(lines[2], "21A2,Ravi,2026-01-05,09:12:00,,CSE-A");
    }

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        let rows = vec![row("21A1", "Asha, \"A\"", Some("P and S"))];
        let csv = rows_to_csv(&rows);
        assert!(csv.contains("21A1,\"Asha, \"\"A\"\"\",2026-01-05"));
    }

    #[test]
    fn export_name_prefers_branch_filter() {
        assert_eq!(export_file_name(None, None), "attendance.csv");
        assert_eq!(export_file_name(Some("ML"), None), "attendance_ML.csv");
        assert_eq!(export_file_name(Some("ML"), Some("CSE-A")), "attendance_CSE-A.csv");
    }

    #[test]
    fn backup_name_embeds_filter_and_timestamp() {
        let now = chrono::FixedOffset::east_opt(19800)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 5, 9, 12, 33)
            .unwrap();
        assert_eq!(
            backup_file_name(Some("ML"), Some("CSE-A"), now),
            "attendance_ML_CSE-A_backup_20260105_091233.csv"
        );
        assert_eq!(
            backup_file_name(None, None, now),
            "attendance_backup_20260105_091233.csv"
        );
    }

    #[test]
    fn backup_round_trips_the_deleted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![row("21A1", "Asha", Some("ML"))];
        write_backup(dir.path(), "b.csv", &rows).unwrap();
        let written = fs::read_to_string(dir.path().join("b.csv")).unwrap();
        assert_eq!(written, rows_to_csv(&rows));
    }
}

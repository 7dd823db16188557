use serde::{Deserialize, Serialize};

/// One attendance row. Dates and times are stored as the ISO strings the
/// student submitted them under; subject/branch stay NULL for a general scan.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub roll: String,
    pub name: String,
    pub date: String,
    pub time: String,
    pub subject: Option<String>,
    pub branch: Option<String>,
}

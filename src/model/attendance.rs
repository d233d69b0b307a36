use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum AttendanceStatus {
    Normal,
    Late,
    Absent,
    Incomplete,
}

impl AttendanceStatus {
    /// Counted towards `present_days` in range summaries.
    pub fn is_present(self) -> bool {
        matches!(
            self,
            AttendanceStatus::Normal | AttendanceStatus::Late | AttendanceStatus::Incomplete
        )
    }
}

/// Derived verdict for one employee on one date. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "42",
        "name": "Somchai",
        "position": "Driver",
        "department": "Warehouse",
        "date": "2026-01-05",
        "check_in": "08:10:00",
        "check_out": "17:20:00",
        "status": "Late",
        "late_minutes": 10,
        "early_leave_minutes": 0,
        "remark": "Late 10m. (Time covered)"
    })
)]
pub struct DailyAttendanceRecord {
    pub employee_id: String,
    pub name: String,
    pub position: Option<String>,
    pub department: Option<String>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "08:10:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "17:20:00", value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub late_minutes: u32,
    pub early_leave_minutes: u32,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "42",
        "name": "Somchai",
        "position": "Driver",
        "department": "Warehouse",
        "present_days": 2,
        "late_days": 1,
        "absent_days": 1
    })
)]
pub struct RangeSummaryRecord {
    pub employee_id: String,
    pub name: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub present_days: u32,
    pub late_days: u32,
    pub absent_days: u32,
}

/// Global shift rules, in minutes after midnight.
///
/// One policy applies to everyone. Per-position or per-employee shifts would
/// hang off the roster lookup in `attendance::report` and pass a different
/// policy into `classify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShiftPolicy {
    #[schema(example = 480)]
    pub work_start: u32,
    #[schema(example = 1020)]
    pub work_end: u32,
    #[schema(example = 30)]
    pub early_arrival_credit_cap_minutes: u32,
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        Self {
            work_start: 8 * 60,
            work_end: 17 * 60,
            early_arrival_credit_cap_minutes: 30,
        }
    }
}

/// Parses `HH:MM` into minutes after midnight.
pub fn parse_clock(value: &str) -> Option<u32> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()?;
    Some(minutes_of_day(time))
}

pub fn minutes_of_day(time: NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}

/// Formats minutes after midnight as `HH:MM`.
pub fn format_clock(minutes: i64) -> String {
    let minutes = minutes.rem_euclid(24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

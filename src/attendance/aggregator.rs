use super::report::{PunchIndex, daily_records};
use crate::model::attendance::{AttendanceStatus, DailyAttendanceRecord, RangeSummaryRecord, ShiftPolicy};
use crate::model::employee::EmployeeIdentity;
use crate::utils::natural_sort::natural_cmp;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Folds daily records into per-employee counters. Records are consumed one at a time.
pub fn fold(records: impl IntoIterator<Item = DailyAttendanceRecord>) -> Vec<RangeSummaryRecord> {
    let mut summary: HashMap<String, RangeSummaryRecord> = HashMap::new();

    for record in records {
        let entry = summary
            .entry(record.employee_id.clone())
            .or_insert_with(|| RangeSummaryRecord {
                employee_id: record.employee_id,
                name: record.name,
                position: record.position,
                department: record.department,
                present_days: 0,
                late_days: 0,
                absent_days: 0,
            });

        if record.status.is_present() {
            entry.present_days += 1;
        }
        match record.status {
            AttendanceStatus::Late => entry.late_days += 1,
            AttendanceStatus::Absent => entry.absent_days += 1,
            AttendanceStatus::Normal | AttendanceStatus::Incomplete => {}
        }
    }

    let mut rows: Vec<_> = summary.into_values().collect();
    rows.sort_by(|a, b| natural_cmp(&a.employee_id, &b.employee_id));
    rows
}

/// Every date in `start..=end`, empty when `start > end`.
pub fn dates(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Classifies every employee on every date of `start..=end` and folds the results
/// day by day, so only one day of records is alive at a time.
/// `start > end` yields an empty summary.
pub fn summarize(
    start: NaiveDate,
    end: NaiveDate,
    employees: &[EmployeeIdentity],
    index: &PunchIndex,
    policy: &ShiftPolicy,
    today: NaiveDate,
) -> Vec<RangeSummaryRecord> {
    fold(dates(start, end).flat_map(|date| daily_records(date, employees, index, policy, today)))
}

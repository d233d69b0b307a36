use super::classifier::{Subject, classify};
use crate::model::attendance::{DailyAttendanceRecord, ShiftPolicy};
use crate::model::employee::EmployeeIdentity;
use crate::model::punch::RawPunchEvent;
use crate::utils::natural_sort::natural_cmp;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use utoipa::{IntoParams, ToSchema};

/// Position used for employees that have none.
pub const UNASSIGNED: &str = "Unassigned";
const ANY: &str = "ALL";

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReportFilter {
    /// Exact position; `ALL` or empty means any. Employees without one match `Unassigned`.
    #[schema(example = "Driver")]
    pub position: Option<String>,
    /// Exact department; `ALL` or empty means any.
    #[schema(example = "Warehouse")]
    pub department: Option<String>,
    /// Case-insensitive match on name, substring match on employee id
    #[schema(example = "som")]
    pub search: Option<String>,
}

fn selector(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ANY))
}

impl ReportFilter {
    pub fn matches(
        &self,
        employee_id: &str,
        name: &str,
        position: Option<&str>,
        department: Option<&str>,
    ) -> bool {
        if let Some(wanted) = selector(&self.position) {
            if position.unwrap_or(UNASSIGNED) != wanted {
                return false;
            }
        }
        if let Some(wanted) = selector(&self.department) {
            if department != Some(wanted) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                name.to_lowercase().contains(&term.to_lowercase()) || employee_id.contains(term)
            }
            None => true,
        }
    }
}

/// Punch timestamps grouped by calendar date, then by terminal user id.
#[derive(Debug, Default)]
pub struct PunchIndex {
    by_day: HashMap<NaiveDate, HashMap<String, Vec<NaiveDateTime>>>,
}

impl PunchIndex {
    pub fn build(events: &[RawPunchEvent]) -> Self {
        let mut by_day: HashMap<NaiveDate, HashMap<String, Vec<NaiveDateTime>>> = HashMap::new();
        for event in events {
            by_day
                .entry(event.timestamp.date())
                .or_default()
                .entry(event.device_user_id.clone())
                .or_default()
                .push(event.timestamp);
        }
        Self { by_day }
    }

    fn day(&self, date: NaiveDate) -> Option<&HashMap<String, Vec<NaiveDateTime>>> {
        self.by_day.get(&date)
    }
}

fn unknown_subject(id: &str) -> Subject {
    Subject {
        employee_id: id.to_string(),
        name: format!("Unknown (ID: {id})"),
        position: None,
        department: None,
    }
}

/// One record per known employee, plus one per unknown user id that punched on `date`.
/// Sorted by employee id in natural order.
pub fn daily_records(
    date: NaiveDate,
    employees: &[EmployeeIdentity],
    index: &PunchIndex,
    policy: &ShiftPolicy,
    today: NaiveDate,
) -> Vec<DailyAttendanceRecord> {
    let mut roster: BTreeMap<&str, Subject> = employees
        .iter()
        .map(|e| {
            (
                e.id.as_str(),
                Subject {
                    employee_id: e.id.clone(),
                    name: e.name.clone(),
                    position: e.position.clone(),
                    department: e.department.clone(),
                },
            )
        })
        .collect();

    let day = index.day(date);
    if let Some(day) = day {
        for id in day.keys() {
            roster
                .entry(id.as_str())
                .or_insert_with(|| unknown_subject(id));
        }
    }

    let mut records: Vec<DailyAttendanceRecord> = roster
        .values()
        .map(|subject| {
            let punches = day
                .and_then(|d| d.get(&subject.employee_id))
                .map(Vec::as_slice)
                .unwrap_or_default();
            classify(subject, date, punches, policy, today)
        })
        .collect();

    records.sort_by(|a, b| natural_cmp(&a.employee_id, &b.employee_id));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::Utc;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn employee(id: &str, name: &str, position: Option<&str>) -> EmployeeIdentity {
        EmployeeIdentity {
            id: id.into(),
            name: name.into(),
            department: None,
            position: position.map(str::to_string),
            last_synced_at: Utc::now(),
        }
    }

    fn punch(user: &str, h: u32, m: u32) -> RawPunchEvent {
        RawPunchEvent {
            id: format!("{user}-{h}-{m}"),
            device_id: "gate".into(),
            device_user_id: user.into(),
            timestamp: date().and_hms_opt(h, m, 0).unwrap(),
            received_at: Utc::now(),
            source_payload: json!({}),
        }
    }

    #[test]
    fn roster_includes_absentees_and_unknown_punchers() {
        let employees = vec![
            employee("10", "Ten", Some("Driver")),
            employee("2", "Two", None),
        ];
        let index = PunchIndex::build(&[punch("2", 7, 50), punch("2", 17, 5), punch("99", 8, 30)]);
        let today = date().succ_opt().unwrap();

        let records = daily_records(date(), &employees, &index, &ShiftPolicy::default(), today);
        let ids: Vec<_> = records.iter().map(|r| r.employee_id.as_str()).collect();
        assert_eq!(ids, ["2", "10", "99"]);

        assert_eq!(records[0].status, AttendanceStatus::Normal);
        assert_eq!(records[1].status, AttendanceStatus::Absent);
        assert_eq!(records[2].name, "Unknown (ID: 99)");
        assert_eq!(records[2].status, AttendanceStatus::Incomplete);

        // unknown ids only show up on days they punched
        let next_day = daily_records(today, &employees, &index, &ShiftPolicy::default(), today);
        assert_eq!(next_day.len(), 2);
    }

    #[test]
    fn filter_by_position_and_search() {
        let all = ReportFilter::default();
        assert!(all.matches("1", "Anyone", None, None));

        let drivers = ReportFilter {
            position: Some("Driver".into()),
            ..Default::default()
        };
        assert!(drivers.matches("1", "A", Some("Driver"), None));
        assert!(!drivers.matches("1", "A", None, None));

        let unassigned = ReportFilter {
            position: Some(UNASSIGNED.into()),
            ..Default::default()
        };
        assert!(unassigned.matches("1", "A", None, None));

        let any = ReportFilter {
            position: Some("ALL".into()),
            search: Some("SOM".into()),
            ..Default::default()
        };
        assert!(any.matches("42", "Somchai", Some("Cook"), None));
        assert!(!any.matches("42", "Anan", Some("Cook"), None));

        let by_id = ReportFilter {
            search: Some("4".into()),
            ..Default::default()
        };
        assert!(by_id.matches("142", "Anan", None, None));

        let warehouse = ReportFilter {
            department: Some("Warehouse".into()),
            ..Default::default()
        };
        assert!(warehouse.matches("1", "A", None, Some("Warehouse")));
        assert!(!warehouse.matches("1", "A", None, None));
    }
}

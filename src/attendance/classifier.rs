//! Daily verdict for one employee.
//!
//! ```text
//! no punches ─────────────────────────────► Absent
//! first punch <= work_start ──► Normal ─┐
//! first punch  > work_start ──► Late ───┼─► checkout present: annotate early leave / time covered
//!                                       ├─► no checkout, date == today: "Shift in progress"
//!                                       └─► no checkout, past date: Incomplete
//! ```

use crate::model::attendance::{
    AttendanceStatus, DailyAttendanceRecord, ShiftPolicy, format_clock, minutes_of_day,
};
use chrono::{NaiveDate, NaiveDateTime};

/// Who the record is for; carried through to the output untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub employee_id: String,
    pub name: String,
    pub position: Option<String>,
    pub department: Option<String>,
}

/// Classifies the punches of one employee on `date`.
///
/// `punches` may be in any order and are sorted here. `today` decides whether
/// a missing checkout means "still at work" or "forgot to punch out".
pub fn classify(
    subject: &Subject,
    date: NaiveDate,
    punches: &[NaiveDateTime],
    policy: &ShiftPolicy,
    today: NaiveDate,
) -> DailyAttendanceRecord {
    let mut sorted = punches.to_vec();
    sorted.sort_unstable();

    let mut record = DailyAttendanceRecord {
        employee_id: subject.employee_id.clone(),
        name: subject.name.clone(),
        position: subject.position.clone(),
        department: subject.department.clone(),
        date,
        check_in: None,
        check_out: None,
        status: AttendanceStatus::Absent,
        late_minutes: 0,
        early_leave_minutes: 0,
        remark: String::new(),
    };

    let Some(first) = sorted.first() else {
        return record;
    };
    let last = (sorted.len() > 1).then(|| sorted[sorted.len() - 1]);

    record.check_in = Some(first.time());
    record.check_out = last.map(|l| l.time());

    let work_start = i64::from(policy.work_start);
    let work_end = i64::from(policy.work_end);
    let check_in = i64::from(minutes_of_day(first.time()));

    let mut remarks: Vec<String> = Vec::new();

    let late = (check_in - work_start).max(0);
    if late > 0 {
        record.status = AttendanceStatus::Late;
        record.late_minutes = late as u32;
        remarks.push(format!("Late {late}m."));
    } else {
        record.status = AttendanceStatus::Normal;
    }

    let credit = (work_start - check_in)
        .max(0)
        .min(i64::from(policy.early_arrival_credit_cap_minutes));
    if credit > 0 {
        remarks.push(format!("Early arrival credit -{credit}m."));
    }

    // late arrival pushes the target out by the same amount it was late.
    // credit and lateness never both apply: one needs check_in < work_start, the other check_in > work_start
    let target = work_end - credit + late;

    match last {
        Some(out) => {
            let check_out = i64::from(minutes_of_day(out.time()));
            if check_out < target {
                let early = target - check_out;
                record.early_leave_minutes = early as u32;
                remarks.push(format!(
                    "Left early {early}m (required {}).",
                    format_clock(target)
                ));
            } else if record.status == AttendanceStatus::Late {
                remarks.push("(Time covered)".to_string());
            }
        }
        None if date == today => remarks.push("Shift in progress".to_string()),
        None => {
            remarks.push("No check-out".to_string());
            record.status = AttendanceStatus::Incomplete;
        }
    }

    record.remark = remarks.join(" ");
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        date().and_hms_opt(h, m, 0).unwrap()
    }

    fn subject() -> Subject {
        Subject {
            employee_id: "42".into(),
            name: "Somchai".into(),
            ..Default::default()
        }
    }

    fn past_today() -> NaiveDate {
        date().succ_opt().unwrap()
    }

    #[test]
    fn no_punches_is_absent() {
        let r = classify(&subject(), date(), &[], &ShiftPolicy::default(), past_today());
        assert_eq!(r.status, AttendanceStatus::Absent);
        assert_eq!(r.late_minutes, 0);
        assert_eq!(r.early_leave_minutes, 0);
        assert_eq!(r.check_in, None);
        assert_eq!(r.check_out, None);
        assert!(r.remark.is_empty());
    }

    #[test]
    fn single_late_punch_on_past_date_is_incomplete() {
        let r = classify(&subject(), date(), &[at(8, 10)], &ShiftPolicy::default(), past_today());
        assert_eq!(r.late_minutes, 10);
        assert_eq!(r.status, AttendanceStatus::Incomplete);
        assert_eq!(r.check_out, None);
        assert!(r.remark.contains("No check-out"));
    }

    #[test]
    fn single_late_punch_today_is_in_progress() {
        let r = classify(&subject(), date(), &[at(8, 10)], &ShiftPolicy::default(), date());
        assert_eq!(r.late_minutes, 10);
        assert_eq!(r.status, AttendanceStatus::Late);
        assert!(r.remark.to_lowercase().contains("in progress"));
    }

    #[test]
    fn early_arrival_credit_shortens_the_day() {
        // 07:45 in, credit 15 => target 16:45; out at 16:50
        let r = classify(
            &subject(),
            date(),
            &[at(16, 50), at(7, 45)],
            &ShiftPolicy::default(),
            past_today(),
        );
        assert_eq!(r.status, AttendanceStatus::Normal);
        assert_eq!(r.check_in, NaiveTime::from_hms_opt(7, 45, 0));
        assert_eq!(r.check_out, NaiveTime::from_hms_opt(16, 50, 0));
        assert_eq!(r.early_leave_minutes, 0);
        assert!(r.remark.contains("Early arrival credit -15m."));
        assert!(!r.remark.contains("Left early"));
    }

    #[test]
    fn credit_is_capped() {
        // 07:00 in, credit capped at 30 => target 16:30; out at 16:20
        let r = classify(
            &subject(),
            date(),
            &[at(7, 0), at(16, 20)],
            &ShiftPolicy::default(),
            past_today(),
        );
        assert_eq!(r.early_leave_minutes, 10);
        assert!(r.remark.contains("(required 16:30)"));
        assert_eq!(r.status, AttendanceStatus::Normal);
    }

    #[test]
    fn late_arrival_extends_the_target() {
        // 08:20 in => target 17:20
        let short = classify(
            &subject(),
            date(),
            &[at(8, 20), at(17, 5)],
            &ShiftPolicy::default(),
            past_today(),
        );
        assert_eq!(short.status, AttendanceStatus::Late);
        assert_eq!(short.early_leave_minutes, 15);

        let covered = classify(
            &subject(),
            date(),
            &[at(8, 20), at(17, 30)],
            &ShiftPolicy::default(),
            past_today(),
        );
        assert_eq!(covered.status, AttendanceStatus::Late);
        assert_eq!(covered.early_leave_minutes, 0);
        assert!(covered.remark.ends_with("(Time covered)"));
    }

    #[test]
    fn middle_punches_are_ignored() {
        let r = classify(
            &subject(),
            date(),
            &[at(12, 0), at(7, 55), at(13, 0), at(17, 0)],
            &ShiftPolicy::default(),
            past_today(),
        );
        assert_eq!(r.check_in, NaiveTime::from_hms_opt(7, 55, 0));
        assert_eq!(r.check_out, NaiveTime::from_hms_opt(17, 0, 0));
    }

    #[test]
    fn input_order_does_not_matter() {
        let punches = [at(8, 5), at(12, 30), at(16, 0)];
        let mut reversed = punches;
        reversed.reverse();
        let policy = ShiftPolicy::default();
        assert_eq!(
            classify(&subject(), date(), &punches, &policy, past_today()),
            classify(&subject(), date(), &reversed, &policy, past_today())
        );
    }

    #[test]
    fn custom_policy() {
        let policy = ShiftPolicy {
            work_start: 9 * 60,
            work_end: 18 * 60,
            early_arrival_credit_cap_minutes: 0,
        };
        let r = classify(&subject(), date(), &[at(8, 30), at(17, 45)], &policy, past_today());
        assert_eq!(r.status, AttendanceStatus::Normal);
        assert_eq!(r.early_leave_minutes, 15);
        assert!(!r.remark.contains("credit"));
    }
}

//! Read path: punches + directory + shift policy in, verdicts out. Nothing here is persisted.

pub mod aggregator;
pub mod classifier;
pub mod report;

pub use report::ReportFilter;

use crate::model::attendance::{DailyAttendanceRecord, RangeSummaryRecord, ShiftPolicy};
use crate::store::{DirectoryStore, PunchStore, StoreError, StoreResult};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use report::PunchIndex;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Longest span, in days, a range summary may cover.
pub const MAX_RANGE_DAYS: i64 = 366;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("range of {days} days exceeds the maximum of {max} days")]
    RangeTooLong { days: i64, max: i64 },
}

pub struct AttendanceReports {
    punches: Arc<dyn PunchStore>,
    directory: Arc<dyn DirectoryStore>,
    policy: ShiftPolicy,
}

fn day_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let from = start.and_time(NaiveTime::default());
    let to = (end + Duration::days(1)).and_time(NaiveTime::default());
    (from, to)
}

impl AttendanceReports {
    pub fn new(punches: Arc<dyn PunchStore>, directory: Arc<dyn DirectoryStore>, policy: ShiftPolicy) -> Self {
        Self {
            punches,
            directory,
            policy,
        }
    }

    pub fn policy(&self) -> &ShiftPolicy {
        &self.policy
    }

    pub async fn daily(
        &self,
        date: NaiveDate,
        filter: &ReportFilter,
        today: NaiveDate,
    ) -> StoreResult<Vec<DailyAttendanceRecord>> {
        let (from, to) = day_bounds(date, date);
        let events = self.punches.list_between(from, to).await?;
        let employees = self.directory.list().await?;
        debug!(%date, punches = events.len(), employees = employees.len(), "Building daily report");

        let index = PunchIndex::build(&events);
        Ok(report::daily_records(date, &employees, &index, &self.policy, today)
            .into_iter()
            .filter(|r| {
                filter.matches(
                    &r.employee_id,
                    &r.name,
                    r.position.as_deref(),
                    r.department.as_deref(),
                )
            })
            .collect())
    }

    /// Summary over `start..=end`; `start > end` is an empty result.
    /// Spans longer than [`MAX_RANGE_DAYS`] are refused before any store access.
    pub async fn range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: &ReportFilter,
        today: NaiveDate,
    ) -> Result<Vec<RangeSummaryRecord>, ReportError> {
        if start > end {
            return Ok(Vec::new());
        }
        let days = (end - start).num_days() + 1;
        if days > MAX_RANGE_DAYS {
            return Err(ReportError::RangeTooLong {
                days,
                max: MAX_RANGE_DAYS,
            });
        }

        let (from, to) = day_bounds(start, end);
        let events = self.punches.list_between(from, to).await?;
        let employees = self.directory.list().await?;
        debug!(%start, %end, punches = events.len(), employees = employees.len(), "Building range summary");

        let index = PunchIndex::build(&events);
        Ok(
            aggregator::summarize(start, end, &employees, &index, &self.policy, today)
                .into_iter()
                .filter(|r| {
                    filter.matches(
                        &r.employee_id,
                        &r.name,
                        r.position.as_deref(),
                        r.department.as_deref(),
                    )
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryDirectoryStore, MemoryPunchStore};

    fn reports() -> AttendanceReports {
        AttendanceReports::new(
            Arc::new(MemoryPunchStore::new()),
            Arc::new(MemoryDirectoryStore::new()),
            ShiftPolicy::default(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[actix_web::test]
    async fn range_longer_than_the_maximum_is_refused() {
        let err = reports()
            .range(date(1, 1, 1), date(2100, 12, 31), &ReportFilter::default(), date(2026, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::RangeTooLong { max: MAX_RANGE_DAYS, .. }));

        // 2024-01-01..=2025-01-01 is 367 days
        let err = reports()
            .range(date(2024, 1, 1), date(2025, 1, 1), &ReportFilter::default(), date(2026, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::RangeTooLong { days: 367, .. }));
    }

    #[actix_web::test]
    async fn range_at_the_maximum_is_accepted() {
        // leap year: 366 days
        let summary = reports()
            .range(date(2024, 1, 1), date(2024, 12, 31), &ReportFilter::default(), date(2026, 1, 1))
            .await
            .unwrap();
        assert!(summary.is_empty());
    }
}

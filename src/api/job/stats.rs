use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use tracing::warn;

use crate::db::models::StatusCountRow;
use super::models::JobStatus;

/// Label format of a chart month, e.g. "Apr 25"
const MONTH_LABEL: &str = "%b %y";

/// Number of jobs in each status; every status is present
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub interview: i64,
    pub declined: i64,
}

impl StatusCounts {
    /// Merge `GROUP BY status` buckets onto all-zero counts
    pub fn from_groups(groups: impl IntoIterator<Item = StatusCountRow>) -> Self {
        let mut counts = Self::default();
        for group in groups {
            match group.status.parse::<JobStatus>() {
                Ok(JobStatus::Pending) => counts.pending = group.count,
                Ok(JobStatus::Interview) => counts.interview = group.count,
                Ok(JobStatus::Declined) => counts.declined = group.count,
                Err(e) => warn!("Skipping stats bucket: {}", e),
            }
        }
        counts
    }
}

/// Applications created in one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub date: String,
    pub count: i64,
}

/// Start of the trailing chart window ending at `now`
pub fn window_start(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Fold ascending creation times into per-month counts
///
/// Months appear in first-seen order; months without jobs are not emitted.
pub fn monthly_series(created: impl IntoIterator<Item = DateTime<Utc>>) -> Vec<MonthlyCount> {
    created.into_iter().fold(Vec::new(), |mut series: Vec<MonthlyCount>, at| {
        let date = at.format(MONTH_LABEL).to_string();
        match series.iter_mut().find(|entry| entry.date == date) {
            Some(entry) => entry.count += 1,
            None => series.push(MonthlyCount { date, count: 1 }),
        }
        series
    })
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::api::identity::OwnerId;
use crate::api::job::models::{JobInput, JobStatus};
use crate::api::job::query::JobFilter;
use crate::db::models::{JobRow, StatusCountRow};
use crate::db::store::JobStore;

/// In-process job store with the same scoping rules as the PostgreSQL one
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<Vec<JobRow>>,
    failing: AtomicBool,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the pool were gone
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Insert a row verbatim, for seeding creation times
    pub fn insert(&self, row: JobRow) {
        self.jobs.lock().unwrap().push(row);
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.failing.load(Ordering::SeqCst) {
            Err(sqlx::Error::PoolClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, owner: &OwnerId, input: &JobInput) -> Result<JobRow, sqlx::Error> {
        self.check()?;
        let now = Utc::now();
        let row = JobRow {
            id: Uuid::new_v4(),
            owner_id: owner.as_str().to_string(),
            position: input.position.clone(),
            company: input.company.clone(),
            location: input.location.clone(),
            status: input.status.as_str().to_string(),
            mode: input.mode.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.jobs.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list(&self, filter: &JobFilter, skip: i64, limit: i64) -> Result<Vec<JobRow>, sqlx::Error> {
        self.check()?;
        let mut rows: Vec<JobRow> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: &JobFilter) -> Result<i64, sqlx::Error> {
        self.check()?;
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.iter().filter(|row| filter.matches(row)).count() as i64)
    }

    async fn get(&self, id: Uuid, owner: &OwnerId) -> Result<Option<JobRow>, sqlx::Error> {
        self.check()?;
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter()
            .find(|row| row.id == id && row.owner_id == owner.as_str())
            .cloned())
    }

    async fn update(&self, id: Uuid, owner: &OwnerId, input: &JobInput) -> Result<Option<JobRow>, sqlx::Error> {
        self.check()?;
        let mut jobs = self.jobs.lock().unwrap();
        let Some(row) = jobs
            .iter_mut()
            .find(|row| row.id == id && row.owner_id == owner.as_str())
        else {
            return Ok(None);
        };
        row.position = input.position.clone();
        row.company = input.company.clone();
        row.location = input.location.clone();
        row.status = input.status.as_str().to_string();
        row.mode = input.mode.as_str().to_string();
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid, owner: &OwnerId) -> Result<Option<JobRow>, sqlx::Error> {
        self.check()?;
        let mut jobs = self.jobs.lock().unwrap();
        let position = jobs
            .iter()
            .position(|row| row.id == id && row.owner_id == owner.as_str());
        Ok(position.map(|index| jobs.remove(index)))
    }

    async fn status_counts(&self, owner: &OwnerId) -> Result<Vec<StatusCountRow>, sqlx::Error> {
        self.check()?;
        let jobs = self.jobs.lock().unwrap();
        Ok(JobStatus::ALL
            .iter()
            .map(|status| StatusCountRow {
                status: status.as_str().to_string(),
                count: jobs
                    .iter()
                    .filter(|row| row.owner_id == owner.as_str() && row.status == status.as_str())
                    .count() as i64,
            })
            .filter(|group| group.count > 0)
            .collect())
    }

    async fn created_since(&self, owner: &OwnerId, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
        self.check()?;
        let jobs = self.jobs.lock().unwrap();
        let mut times: Vec<DateTime<Utc>> = jobs
            .iter()
            .filter(|row| row.owner_id == owner.as_str() && row.created_at >= since)
            .map(|row| row.created_at)
            .collect();
        times.sort();
        Ok(times)
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.check()
    }
}

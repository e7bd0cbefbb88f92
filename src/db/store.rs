use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::identity::OwnerId;
use crate::api::job::models::JobInput;
use crate::api::job::query::JobFilter;
use crate::db::models::{JobRow, StatusCountRow};

/// Storage operations for job applications
///
/// Every operation is scoped to one owner, either through the filter (which
/// always carries the owner) or through an explicit `owner` argument. Point
/// operations return `None` both for missing ids and for ids owned by someone
/// else.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, owner: &OwnerId, input: &JobInput) -> Result<JobRow, sqlx::Error>;

    /// One page of matching jobs, newest first
    async fn list(&self, filter: &JobFilter, skip: i64, limit: i64) -> Result<Vec<JobRow>, sqlx::Error>;

    async fn count(&self, filter: &JobFilter) -> Result<i64, sqlx::Error>;

    async fn get(&self, id: Uuid, owner: &OwnerId) -> Result<Option<JobRow>, sqlx::Error>;

    /// Overwrite every mutable field of the job
    async fn update(&self, id: Uuid, owner: &OwnerId, input: &JobInput) -> Result<Option<JobRow>, sqlx::Error>;

    /// Remove the job and hand back what was removed
    async fn delete(&self, id: Uuid, owner: &OwnerId) -> Result<Option<JobRow>, sqlx::Error>;

    /// Number of jobs per status, only for statuses that occur
    async fn status_counts(&self, owner: &OwnerId) -> Result<Vec<StatusCountRow>, sqlx::Error>;

    /// Creation times of jobs created at or after `since`, oldest first
    async fn created_since(&self, owner: &OwnerId, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, sqlx::Error>;

    /// Round trip to the backing store
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::api::identity::OwnerId;
use crate::api::job::models::JobInput;
use crate::api::job::query::JobFilter;
use crate::db::models::{JobRow, StatusCountRow};
use crate::db::store::JobStore;

const JOB_COLUMNS: &str =
    r#"id, owner_id, "position", company, location, status, mode, created_at, updated_at"#;

/// PostgreSQL-backed job repository
#[derive(Clone)]
pub struct JobRepository {
    pool: Pool<Postgres>,
}

impl JobRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    /// Insert a new job owned by `owner` and return the full record
    async fn create(&self, owner: &OwnerId, input: &JobInput) -> Result<JobRow, sqlx::Error> {
        debug!(
            "Creating job: owner={}, position={}, status={}",
            owner,
            input.position,
            input.status
        );

        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            INSERT INTO jobs (owner_id, "position", company, location, status, mode)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(owner.as_str())
        .bind(&input.position)
        .bind(&input.company)
        .bind(&input.location)
        .bind(input.status.as_str())
        .bind(input.mode.as_str())
        .fetch_one(&self.pool)
        .await?;

        debug!("Job created with id={}", row.id);
        Ok(row)
    }

    async fn list(&self, filter: &JobFilter, skip: i64, limit: i64) -> Result<Vec<JobRow>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
        filter.push_where(&mut builder);
        builder.push(" ORDER BY created_at DESC, id DESC OFFSET ");
        builder.push_bind(skip);
        builder.push(" LIMIT ");
        builder.push_bind(limit);

        let rows = builder
            .build_query_as::<JobRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(
            "Listed {} jobs for owner={} (skip={}, limit={})",
            rows.len(),
            filter.owner_id(),
            skip,
            limit
        );
        Ok(rows)
    }

    async fn count(&self, filter: &JobFilter) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs");
        filter.push_where(&mut builder);

        let count = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn get(&self, id: Uuid, owner: &OwnerId) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    async fn update(&self, id: Uuid, owner: &OwnerId, input: &JobInput) -> Result<Option<JobRow>, sqlx::Error> {
        debug!("Updating job: id={}, owner={}", id, owner);

        sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE jobs
            SET "position" = $3, company = $4, location = $5, status = $6, mode = $7,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner.as_str())
        .bind(&input.position)
        .bind(&input.company)
        .bind(&input.location)
        .bind(input.status.as_str())
        .bind(input.mode.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, id: Uuid, owner: &OwnerId) -> Result<Option<JobRow>, sqlx::Error> {
        debug!("Deleting job: id={}, owner={}", id, owner);

        sqlx::query_as::<_, JobRow>(&format!(
            "DELETE FROM jobs WHERE id = $1 AND owner_id = $2 RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    async fn status_counts(&self, owner: &OwnerId) -> Result<Vec<StatusCountRow>, sqlx::Error> {
        sqlx::query_as::<_, StatusCountRow>(
            "SELECT status, COUNT(*) AS count FROM jobs WHERE owner_id = $1 GROUP BY status",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
    }

    async fn created_since(&self, owner: &OwnerId, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
        sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT created_at FROM jobs WHERE owner_id = $1 AND created_at >= $2 ORDER BY created_at ASC",
        )
        .bind(owner.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

use serde::Serialize;

use crate::db::models::JobRow;
use crate::events::CacheKey;

/// Response for a successful create, update or delete
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub message: String,
    pub job: JobRow,
    /// Client caches to refetch after this mutation
    pub invalidate: Vec<CacheKey>,
}

/// One page of the job listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsPage {
    pub jobs: Vec<JobRow>,
    pub count: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl JobsPage {
    /// What the listing shows when the store cannot be read
    pub fn empty() -> Self {
        Self {
            jobs: Vec::new(),
            count: 0,
            page: 1,
            total_pages: 0,
        }
    }
}

use actix_web::{http::{header, StatusCode}, HttpResponse, ResponseError};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api::identity::OwnerId;
use crate::api::validation::{field_errors, ErrorResponse};
use crate::db::models::JobRow;
use crate::db::store::JobStore;
use crate::events::{InvalidationBus, JOB_MUTATION_KEYS};
use super::dto::{JobResponse, JobsPage};
use super::models::JobInput;
use super::query::{JobFilter, ListParams, Pagination};
use super::stats::{monthly_series, window_start, MonthlyCount, StatusCounts};

/// Service-level errors
#[derive(Debug)]
pub enum ServiceError {
    /// Database operation failed
    DatabaseError(sqlx::Error),

    /// Input failed validation; per-field messages
    ValidationError(serde_json::Value),

    /// Job missing or owned by someone else
    NotFound(String),

    /// Abandon the request and send the caller elsewhere
    Redirect(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::DatabaseError(e) => write!(f, "Database error: {}", e),
            ServiceError::ValidationError(fields) => write!(f, "Validation error: {}", fields),
            ServiceError::NotFound(id) => write!(f, "Job not found: {}", id),
            ServiceError::Redirect(location) => write!(f, "Redirect to {}", location),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Redirect(_) => StatusCode::SEE_OTHER,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::DatabaseError(e) => {
                error!("Database error: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Database error occurred"}),
                })
            }
            ServiceError::ValidationError(fields) => {
                warn!("Validation error: {}", fields);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: fields.clone(),
                })
            }
            ServiceError::NotFound(id) => {
                warn!("Job not found: {}", id);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": format!("Job with id {} not found", id)}),
                })
            }
            ServiceError::Redirect(location) => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, location.clone()))
                .finish(),
        }
    }
}

/// Listing and chart limits
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub page_size: i64,
    pub max_page_size: i64,
    pub chart_window_months: u32,
    /// Where failed lookups and aggregate views send the caller
    pub fallback_redirect: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_page_size: 100,
            chart_window_months: 6,
            fallback_redirect: "/jobs".to_string(),
        }
    }
}

/// Job service containing business logic
///
/// Every method takes the caller's [`OwnerId`]; nothing here can reach
/// another owner's jobs.
pub struct JobService {
    store: Arc<dyn JobStore>,
    bus: InvalidationBus,
    settings: ServiceSettings,
}

fn validate(input: &JobInput) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(field_errors(&e)))
}

/// Ids arrive as raw path segments; anything that is not a UUID cannot match a job
fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

impl JobService {
    /// Create a new JobService instance
    pub fn new(store: Arc<dyn JobStore>, bus: InvalidationBus, settings: ServiceSettings) -> Self {
        Self { store, bus, settings }
    }

    fn redirect_to_fallback(&self) -> ServiceError {
        ServiceError::Redirect(self.settings.fallback_redirect.clone())
    }

    /// Create a job owned by the caller
    ///
    /// # Returns
    /// - `Ok(JobResponse)` - Job created, caches invalidated
    /// - `Err(ServiceError::ValidationError)` - Nothing persisted
    /// - `Err(ServiceError::DatabaseError)` - Creation failed
    pub async fn create_job(&self, owner: &OwnerId, input: &JobInput) -> Result<JobResponse, ServiceError> {
        info!("Service: Creating job for owner={} position={}", owner, input.position);
        validate(input)?;

        let job = self
            .store
            .create(owner, input)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!("Service: Job created successfully with id={}", job.id);
        Ok(self.mutated(owner, "Job created successfully", job))
    }

    /// One page of the caller's jobs, newest first
    ///
    /// # Business Logic
    /// - Builds the owner-scoped filter from search and status
    /// - Clamps page to >= 1 and limit to the configured range
    /// - Runs the page query and the count query with the same filter
    /// - A storage failure yields an empty page rather than an error
    pub async fn list_jobs(&self, owner: &OwnerId, params: &ListParams) -> Result<JobsPage, ServiceError> {
        let filter = JobFilter::build(owner, params.search.as_deref(), params.status_filter())
            .map_err(|msg| ServiceError::ValidationError(serde_json::json!({"status": {"errors": [msg]}})))?;

        let pagination = Pagination::resolve(
            params.page,
            params.limit,
            self.settings.page_size,
            self.settings.max_page_size,
        );

        let page = async {
            let jobs = self
                .store
                .list(&filter, pagination.skip(), pagination.limit)
                .await?;
            let count = self.store.count(&filter).await?;
            Ok::<_, sqlx::Error>(JobsPage {
                jobs,
                count,
                page: pagination.page,
                total_pages: pagination.total_pages(count),
            })
        }
        .await;

        match page {
            Ok(page) => {
                info!(
                    "Service: Listed page {}/{} ({} of {} jobs) for owner={}",
                    page.page,
                    page.total_pages,
                    page.jobs.len(),
                    page.count,
                    owner
                );
                Ok(page)
            }
            Err(e) => {
                error!("Service: Failed to list jobs for owner={}: {}", owner, e);
                Ok(JobsPage::empty())
            }
        }
    }

    /// A single job of the caller; anything else redirects to the listing
    pub async fn get_job(&self, owner: &OwnerId, id: &str) -> Result<JobRow, ServiceError> {
        let Some(id) = parse_id(id) else {
            warn!("Service: Malformed job id {:?}", id);
            return Err(self.redirect_to_fallback());
        };

        match self.store.get(id, owner).await {
            Ok(Some(job)) => Ok(job),
            Ok(None) => {
                warn!("Service: Job {} not found for owner={}", id, owner);
                Err(self.redirect_to_fallback())
            }
            Err(e) => {
                error!("Service: Failed to load job {}: {}", id, e);
                Err(self.redirect_to_fallback())
            }
        }
    }

    /// Overwrite all mutable fields of one of the caller's jobs
    pub async fn update_job(&self, owner: &OwnerId, id: &str, input: &JobInput) -> Result<JobResponse, ServiceError> {
        validate(input)?;
        let job_id = parse_id(id).ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        let job = self
            .store
            .update(job_id, owner, input)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        info!("Service: Job {} updated", job.id);
        Ok(self.mutated(owner, "Job updated successfully", job))
    }

    /// Permanently remove one of the caller's jobs
    pub async fn delete_job(&self, owner: &OwnerId, id: &str) -> Result<JobResponse, ServiceError> {
        let job_id = parse_id(id).ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        let job = self
            .store
            .delete(job_id, owner)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        info!("Service: Job {} deleted", job.id);
        Ok(self.mutated(owner, "Job deleted successfully", job))
    }

    /// Count of the caller's jobs per status
    pub async fn status_stats(&self, owner: &OwnerId) -> Result<StatusCounts, ServiceError> {
        let groups = self.store.status_counts(owner).await.map_err(|e| {
            error!("Service: Failed to compute stats for owner={}: {}", owner, e);
            self.redirect_to_fallback()
        })?;
        Ok(StatusCounts::from_groups(groups))
    }

    /// Applications per month over the trailing chart window
    pub async fn monthly_series(&self, owner: &OwnerId) -> Result<Vec<MonthlyCount>, ServiceError> {
        let since = window_start(Utc::now(), self.settings.chart_window_months);
        let created = self.store.created_since(owner, since).await.map_err(|e| {
            error!("Service: Failed to compute chart for owner={}: {}", owner, e);
            self.redirect_to_fallback()
        })?;
        Ok(monthly_series(created))
    }

    fn mutated(&self, owner: &OwnerId, message: &str, job: JobRow) -> JobResponse {
        self.bus.publish(owner, &JOB_MUTATION_KEYS);
        JobResponse {
            message: message.to_string(),
            job,
            invalidate: JOB_MUTATION_KEYS.to_vec(),
        }
    }
}

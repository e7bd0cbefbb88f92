use actix_web::{
    HttpResponse, delete, get, post, put,
    web::{Data, Path, Query, ServiceConfig, scope},
};
use actix_web_validator::Json;

use crate::api::identity::OwnerId;
use super::models::JobInput;
use super::query::ListParams;
use super::service::{JobService, ServiceError};

#[post("")]
async fn create_job(
    service: Data<JobService>,
    owner: OwnerId,
    job: Json<JobInput>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.create_job(&owner, &job).await?;
    Ok(HttpResponse::Created().json(response))
}

#[get("")]
async fn list_jobs(
    service: Data<JobService>,
    owner: OwnerId,
    params: Query<ListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = service.list_jobs(&owner, &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/{id}")]
async fn get_job(
    service: Data<JobService>,
    owner: OwnerId,
    id: Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let job = service.get_job(&owner, &id).await?;
    Ok(HttpResponse::Ok().json(job))
}

#[put("/{id}")]
async fn update_job(
    service: Data<JobService>,
    owner: OwnerId,
    id: Path<String>,
    job: Json<JobInput>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.update_job(&owner, &id, &job).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[delete("/{id}")]
async fn delete_job(
    service: Data<JobService>,
    owner: OwnerId,
    id: Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.delete_job(&owner, &id).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/stats")]
async fn status_stats(
    service: Data<JobService>,
    owner: OwnerId,
) -> Result<HttpResponse, ServiceError> {
    let stats = service.status_stats(&owner).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/charts")]
async fn monthly_chart(
    service: Data<JobService>,
    owner: OwnerId,
) -> Result<HttpResponse, ServiceError> {
    let series = service.monthly_series(&owner).await?;
    Ok(HttpResponse::Ok().json(series))
}

pub fn job_config(config: &mut ServiceConfig) {
    config
        .service(
            scope("jobs")
                .service(create_job)
                .service(list_jobs)
                .service(get_job)
                .service(update_job)
                .service(delete_job),
        )
        .service(status_stats)
        .service(monthly_chart);
}

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::queue::{CrawlMessage, QueueStore};
use crate::registry::{CrawlJobStatus, RegistryStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CrawlRequest {
    cities: Vec<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    #[serde(default)]
    #[allow(dead_code)]
    scope_filter: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CrawlResponse {
    success: bool,
    tasks_enqueued: usize,
    cities: Vec<String>,
    crawl_job_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `POST /crawl` — enqueues one crawl job per requested territory
/// (spec.md §4.2). Default window is the last 30 days; an empty `cities`
/// list is a 400; unknown territories reduce the job to a 207 partial
/// success rather than failing the whole request.
pub(crate) async fn trigger(State(state): State<AppState>, Json(request): Json<CrawlRequest>) -> impl IntoResponse {
    if request.cities.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(CrawlResponse {
                success: false,
                tasks_enqueued: 0,
                cities: Vec::new(),
                crawl_job_id: None,
                error: Some("cities must not be empty".to_string()),
            }),
        )
            .into_response();
    }

    let end_date = request.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start_date = request.start_date.unwrap_or(end_date - ChronoDuration::days(30));

    let registry = state.registry_store();
    let spiders = state.spiders();
    let crawl_queue = state.crawl_queue();
    let batch_size = state.config().crawl_batch_size();

    let crawl_job = match registry.create_crawl_job(request.cities.len() as i32, start_date, end_date).await {
        Ok(job) => job,
        Err(error) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CrawlResponse {
                    success: false,
                    tasks_enqueued: 0,
                    cities: Vec::new(),
                    crawl_job_id: None,
                    error: Some(error.to_string()),
                }),
            )
                .into_response();
        }
    };

    let mut enqueued_cities = Vec::new();
    let mut failed = 0usize;

    for batch in request.cities.chunks(batch_size) {
        for territory_id in batch {
            let Some(config) = spiders.by_territory(territory_id) else {
                failed += 1;
                continue;
            };

            let message = CrawlMessage {
                spider_id: config.id.clone(),
                territory_id: config.territory_id.clone(),
                spider_type: config.spider_type.clone(),
                gazette_scope: config.gazette_scope.clone(),
                start_date,
                end_date,
                crawl_job_id: crawl_job.job_id,
            };

            match crawl_queue.enqueue(message, 3).await {
                Ok(_) => enqueued_cities.push(territory_id.clone()),
                Err(_) => failed += 1,
            }
        }
    }

    let _ = registry.set_crawl_job_status(crawl_job.job_id, CrawlJobStatus::Running).await;

    let status = if failed == 0 {
        StatusCode::OK
    } else if enqueued_cities.is_empty() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::MULTI_STATUS
    };

    (
        status,
        Json(CrawlResponse {
            success: failed == 0,
            tasks_enqueued: enqueued_cities.len(),
            cities: enqueued_cities,
            crawl_job_id: Some(crawl_job.job_id),
            error: None,
        }),
    )
        .into_response()
}

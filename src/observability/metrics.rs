//! Prometheus metric definitions.
use prometheus::{
    Counter, Gauge, Histogram, Registry, register_counter_with_registry,
    register_gauge_with_registry, register_histogram_with_registry,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Metrics {
    pub gazettes_discovered: Counter,
    pub crawls_completed: Counter,
    pub crawls_failed: Counter,
    pub ocr_jobs_completed: Counter,
    pub ocr_jobs_failed: Counter,
    pub ocr_cache_hits: Counter,
    pub analysis_jobs_completed: Counter,
    pub analysis_jobs_failed: Counter,
    pub concurso_detections: Counter,
    pub webhook_deliveries_succeeded: Counter,
    pub webhook_deliveries_failed: Counter,
    pub retries_total: Counter,

    pub crawl_duration: Histogram,
    pub ocr_duration: Histogram,
    pub analysis_duration: Histogram,
    pub webhook_delivery_duration: Histogram,
    pub url_resolution_duration: Histogram,

    pub crawl_queue_depth: Gauge,
    pub ocr_queue_depth: Gauge,
    pub analysis_queue_depth: Gauge,
    pub webhook_queue_depth: Gauge,
}

impl Metrics {
    #[allow(clippy::too_many_lines)]
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            gazettes_discovered: register_counter_with_registry!(
                "ingest_gazettes_discovered_total",
                "Total number of gazette editions discovered by crawlers",
                registry
            )?,
            crawls_completed: register_counter_with_registry!(
                "ingest_crawls_completed_total",
                "Total number of crawl jobs completed",
                registry
            )?,
            crawls_failed: register_counter_with_registry!(
                "ingest_crawls_failed_total",
                "Total number of crawl jobs that exhausted retries",
                registry
            )?,
            ocr_jobs_completed: register_counter_with_registry!(
                "ingest_ocr_jobs_completed_total",
                "Total number of OCR jobs completed",
                registry
            )?,
            ocr_jobs_failed: register_counter_with_registry!(
                "ingest_ocr_jobs_failed_total",
                "Total number of OCR jobs that exhausted retries",
                registry
            )?,
            ocr_cache_hits: register_counter_with_registry!(
                "ingest_ocr_cache_hits_total",
                "Total number of OCR requests served from cache",
                registry
            )?,
            analysis_jobs_completed: register_counter_with_registry!(
                "ingest_analysis_jobs_completed_total",
                "Total number of analysis jobs completed",
                registry
            )?,
            analysis_jobs_failed: register_counter_with_registry!(
                "ingest_analysis_jobs_failed_total",
                "Total number of analysis jobs that exhausted retries",
                registry
            )?,
            concurso_detections: register_counter_with_registry!(
                "ingest_concurso_detections_total",
                "Total number of gazettes flagged as containing a concurso notice",
                registry
            )?,
            webhook_deliveries_succeeded: register_counter_with_registry!(
                "ingest_webhook_deliveries_succeeded_total",
                "Total number of webhook deliveries that succeeded",
                registry
            )?,
            webhook_deliveries_failed: register_counter_with_registry!(
                "ingest_webhook_deliveries_failed_total",
                "Total number of webhook deliveries that exhausted retries",
                registry
            )?,
            retries_total: register_counter_with_registry!(
                "ingest_retries_total",
                "Total number of stage retries across all queues",
                registry
            )?,
            crawl_duration: register_histogram_with_registry!(
                "ingest_crawl_duration_seconds",
                "Duration of crawl job processing",
                registry
            )?,
            ocr_duration: register_histogram_with_registry!(
                "ingest_ocr_duration_seconds",
                "Duration of OCR job processing",
                registry
            )?,
            analysis_duration: register_histogram_with_registry!(
                "ingest_analysis_duration_seconds",
                "Duration of analysis job processing",
                registry
            )?,
            webhook_delivery_duration: register_histogram_with_registry!(
                "ingest_webhook_delivery_duration_seconds",
                "Duration of webhook delivery attempts",
                registry
            )?,
            url_resolution_duration: register_histogram_with_registry!(
                "ingest_url_resolution_duration_seconds",
                "Duration of URL canonicalization/redirect resolution",
                registry
            )?,
            crawl_queue_depth: register_gauge_with_registry!(
                "ingest_crawl_queue_depth",
                "Number of pending crawl jobs",
                registry
            )?,
            ocr_queue_depth: register_gauge_with_registry!(
                "ingest_ocr_queue_depth",
                "Number of pending OCR jobs",
                registry
            )?,
            analysis_queue_depth: register_gauge_with_registry!(
                "ingest_analysis_queue_depth",
                "Number of pending analysis jobs",
                registry
            )?,
            webhook_queue_depth: register_gauge_with_registry!(
                "ingest_webhook_queue_depth",
                "Number of pending webhook deliveries",
                registry
            )?,
        })
    }
}

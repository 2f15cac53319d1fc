use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::json;

use crate::util::retry::RetryConfig;

use super::models::{
    AnalysisCallback, Auth, AuthKind, DeliveryOutcome, DeliveryStatus, MaxDeliveries, Subscription,
    WebhookEvent,
};
use super::store::WebhookStore;

/// True when the callback matches every configured filter on the subscription.
pub fn matches(subscription: &Subscription, callback: &AnalysisCallback) -> bool {
    let filters = &subscription.filters;

    if !filters.categories.is_empty()
        && !callback.categories.iter().any(|c| filters.categories.contains(c))
    {
        return false;
    }

    if !filters.keywords.is_empty()
        && !callback.keywords.iter().any(|k| filters.keywords.contains(k))
    {
        return false;
    }

    if !filters.territory_ids.is_empty() && !filters.territory_ids.contains(&callback.territory_id) {
        return false;
    }

    if filters.require_concurso && !callback.has_concurso {
        return false;
    }

    let confidence_ratio = if callback.findings_count == 0 {
        0.0
    } else {
        callback.high_confidence_findings as f64 / callback.findings_count as f64
    };
    if confidence_ratio < filters.min_confidence {
        return false;
    }

    true
}

/// Picks the most specific event for this callback (spec.md §6).
pub fn event_for(callback: &AnalysisCallback) -> WebhookEvent {
    if callback.has_concurso {
        WebhookEvent::ConcursoDetected
    } else if callback.has_licitacao {
        WebhookEvent::LicitacaoDetected
    } else {
        WebhookEvent::GazetteAnalyzed
    }
}

fn render_payload(event: WebhookEvent, callback: &AnalysisCallback) -> serde_json::Value {
    json!({
        "event": event.as_str(),
        "payload": {
            "analysisResultId": callback.analysis_result_id,
            "gazetteCrawlId": callback.gazette_crawl_id,
            "territoryId": callback.territory_id,
            "findingsCount": callback.findings_count,
            "categories": callback.categories,
            "highConfidenceFindings": callback.high_confidence_findings,
            "keywords": callback.keywords,
            "jobId": callback.job_id,
            "gazetteId": callback.gazette_id,
            "publicationDate": callback.publication_date,
            "analyzedAt": callback.analyzed_at,
        },
        "timestamp": chrono::Utc::now(),
    })
}

fn apply_auth(request: reqwest::RequestBuilder, auth: &Auth) -> reqwest::RequestBuilder {
    match auth.kind {
        AuthKind::None => request,
        AuthKind::Bearer => {
            if let Some(token) = &auth.token {
                request.bearer_auth(token)
            } else {
                request
            }
        }
        AuthKind::Basic => request.basic_auth(auth.username.clone().unwrap_or_default(), auth.password.clone()),
        AuthKind::Custom => auth.headers.iter().fold(request, |req, (k, v)| req.header(k, v)),
    }
}

/// Delivers a single callback to a subscription, honouring `max_deliveries`
/// (spec.md §8 invariant 6) and retrying with full-jitter backoff.
pub async fn deliver(
    client: &Client,
    store: &dyn WebhookStore,
    timeout: Duration,
    subscription: &Subscription,
    callback: &AnalysisCallback,
) -> anyhow::Result<DeliveryOutcome> {
    if let MaxDeliveries::Bounded(limit) = subscription.max_deliveries {
        let already = store.delivered_count(subscription.id, callback.analysis_result_id).await?;
        if already >= limit {
            return Ok(DeliveryOutcome {
                subscription_id: subscription.id,
                analysis_result_id: callback.analysis_result_id,
                status: DeliveryStatus::Pending,
                status_code: None,
                response_body: None,
                delivery_time_ms: 0,
                attempt: 0,
            });
        }
    }

    let event = event_for(callback);
    let body = render_payload(event, callback);
    let retry = RetryConfig::new(subscription.max_attempts, subscription.backoff_ms, subscription.backoff_ms * 16);

    let mut last_error: Option<String> = None;
    let mut last_status: Option<u16> = None;

    for attempt in 0..retry.max_attempts {
        if attempt > 0 {
            tokio::time::sleep(retry.delay_for_attempt(attempt)).await;
        }

        let started = Instant::now();
        let request = apply_auth(client.post(&subscription.webhook_url).timeout(timeout).json(&body), &subscription.auth);

        match request.send().await {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let elapsed = started.elapsed().as_millis() as u64;
                if response.status().is_success() {
                    let response_body = response.text().await.ok();
                    let outcome = DeliveryOutcome {
                        subscription_id: subscription.id,
                        analysis_result_id: callback.analysis_result_id,
                        status: DeliveryStatus::Sent,
                        status_code: Some(status_code),
                        response_body,
                        delivery_time_ms: elapsed,
                        attempt: attempt + 1,
                    };
                    store.record_delivery(outcome.clone()).await?;
                    return Ok(outcome);
                }
                last_status = Some(status_code);
                last_error = Some(format!("non-success status {status_code}"));
            }
            Err(error) => {
                last_error = Some(error.to_string());
            }
        }
    }

    let outcome = DeliveryOutcome {
        subscription_id: subscription.id,
        analysis_result_id: callback.analysis_result_id,
        status: DeliveryStatus::Failed,
        status_code: last_status,
        response_body: last_error,
        delivery_time_ms: 0,
        attempt: retry.max_attempts,
    };
    store.record_delivery(outcome.clone()).await?;
    Ok(outcome)
}

pub mod delivery;
pub mod models;
pub mod pg_store;
pub mod store;

pub use delivery::{deliver, event_for, matches};
pub use models::{
    AnalysisCallback, Auth, AuthKind, DeliveryOutcome, DeliveryStatus, MaxDeliveries, Subscription,
    SubscriptionFilters, WebhookEvent,
};
pub use pg_store::PgWebhookStore;
pub use store::{MockWebhookStore, WebhookStore};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_subscription(max_deliveries: MaxDeliveries) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            client_id: "client-a".to_string(),
            webhook_url: "https://example.com/hook".to_string(),
            filters: SubscriptionFilters {
                require_concurso: true,
                ..SubscriptionFilters::default()
            },
            auth: Auth { kind: AuthKind::None, token: None, username: None, password: None, headers: Vec::new() },
            max_attempts: 3,
            backoff_ms: 100,
            max_deliveries,
            active: true,
            created_at: Utc::now(),
        }
    }

    fn sample_callback(has_concurso: bool) -> AnalysisCallback {
        AnalysisCallback {
            analysis_result_id: Uuid::new_v4(),
            gazette_crawl_id: Uuid::new_v4(),
            territory_id: "2927408".to_string(),
            findings_count: 2,
            categories: vec!["concurso".to_string()],
            high_confidence_findings: 2,
            keywords: vec!["convocação".to_string()],
            job_id: Uuid::new_v4(),
            gazette_id: Uuid::new_v4(),
            publication_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            analyzed_at: Utc::now(),
            has_concurso,
            has_licitacao: false,
        }
    }

    #[test]
    fn filter_requiring_concurso_rejects_non_concurso_callback() {
        let subscription = sample_subscription(MaxDeliveries::Always);
        assert!(matches(&subscription, &sample_callback(true)));
        assert!(!matches(&subscription, &sample_callback(false)));
    }

    #[test]
    fn event_for_prioritizes_concurso_over_licitacao() {
        let mut callback = sample_callback(true);
        callback.has_licitacao = true;
        assert_eq!(event_for(&callback), WebhookEvent::ConcursoDetected);
    }
}

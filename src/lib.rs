pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use reqwest::Client;

use crate::services::ai_client::AiScoringClient;
use crate::services::calendar_service::CalendarService;
use crate::services::mail_service::MailService;
use crate::services::pending_service::PendingService;
use crate::services::scheduler_service::SchedulerService;
use crate::services::scoring_service::ScoringService;
use crate::services::threshold_service::ThresholdService;
use crate::services::transition_service::TransitionService;
use crate::store::WorkflowStore;
use crate::utils::lock::LockRegistry;

/// Connector endpoints and tuning knobs the engine is wired with.
/// Defaults run fully self-contained: no AI, no mail, no calendar.
#[derive(Debug, Clone)]
pub struct StateSettings {
    pub ai_scoring_url: Option<String>,
    pub ai_api_key: Option<String>,
    pub mail_connector_url: Option<String>,
    pub calendar_connector_url: Option<String>,
    pub external_timeout_secs: u64,
    pub scheduler_lookahead_days: i64,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            ai_scoring_url: None,
            ai_api_key: None,
            mail_connector_url: None,
            calendar_connector_url: None,
            external_timeout_secs: 10,
            scheduler_lookahead_days: 30,
        }
    }
}

impl StateSettings {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            ai_scoring_url: config.ai_scoring_url.clone(),
            ai_api_key: config.ai_api_key.clone(),
            mail_connector_url: config.mail_connector_url.clone(),
            calendar_connector_url: config.calendar_connector_url.clone(),
            external_timeout_secs: config.external_timeout_secs,
            scheduler_lookahead_days: config.scheduler_lookahead_days,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WorkflowStore>,
    pub transition_service: TransitionService,
    pub scheduler_service: SchedulerService,
    pub pending_service: PendingService,
    pub threshold_service: ThresholdService,
}

impl AppState {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        let config = crate::config::get_config();
        Self::with_settings(store, StateSettings::from_config(config))
    }

    pub fn with_settings(store: Arc<dyn WorkflowStore>, settings: StateSettings) -> Self {
        let timeout = Duration::from_secs(settings.external_timeout_secs);
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let ai_client = AiScoringClient::new(
            http_client.clone(),
            settings.ai_scoring_url,
            settings.ai_api_key,
            timeout,
        );
        let scoring_service = ScoringService::new(ai_client);
        let threshold_service = ThresholdService::new(store.clone());
        let mail_service = MailService::new(http_client.clone(), settings.mail_connector_url);
        let calendar_service =
            CalendarService::new(http_client, settings.calendar_connector_url);

        let transition_service = TransitionService::new(
            store.clone(),
            scoring_service,
            threshold_service.clone(),
            mail_service,
            LockRegistry::new(),
        );
        let scheduler_service = SchedulerService::new(
            store.clone(),
            calendar_service,
            transition_service.clone(),
            settings.scheduler_lookahead_days,
        );
        let pending_service = PendingService::new(store.clone());

        Self {
            store,
            transition_service,
            scheduler_service,
            pending_service,
            threshold_service,
        }
    }
}

/// Full HTTP surface of the engine. Shared between the binary and the
/// API tests.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/workflow/candidates",
            get(routes::candidate_routes::list_candidates)
                .post(routes::candidate_routes::register_candidate),
        )
        .route(
            "/api/workflow/candidates/:id",
            get(routes::candidate_routes::get_candidate),
        )
        .route(
            "/api/workflow/candidates/:id/advance",
            post(routes::candidate_routes::advance_candidate),
        )
        .route(
            "/api/workflow/candidates/:id/pause",
            post(routes::candidate_routes::pause_candidate),
        )
        .route(
            "/api/workflow/candidates/:id/resume",
            post(routes::candidate_routes::resume_candidate),
        )
        .route(
            "/api/workflow/evaluate/:id",
            post(routes::candidate_routes::evaluate_candidate),
        )
        .route(
            "/api/workflow/status",
            get(routes::workflow_routes::workflow_status),
        )
        .route(
            "/api/workflow/pending-actions",
            get(routes::workflow_routes::list_pending_actions),
        )
        .route(
            "/api/workflow/pending-actions/:id/resolve",
            post(routes::workflow_routes::resolve_pending_action),
        )
        .route(
            "/api/workflow/interviews/schedule",
            post(routes::workflow_routes::schedule_interviews),
        )
        .route(
            "/api/workflow/interviews/:id/score",
            post(routes::workflow_routes::record_interview_score),
        )
        .route(
            "/api/workflow/interviews/:id/cancel",
            post(routes::workflow_routes::cancel_interview),
        )
        .route(
            "/api/thresholds",
            get(routes::threshold_routes::list_thresholds)
                .post(routes::threshold_routes::upsert_threshold),
        )
        .route(
            "/api/requisitions",
            get(routes::requisition_routes::list_requisitions)
                .post(routes::requisition_routes::create_requisition),
        )
        .route(
            "/api/requisitions/:id",
            get(routes::requisition_routes::get_requisition),
        )
        .with_state(state)
}

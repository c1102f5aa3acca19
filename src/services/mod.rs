pub mod ai_client;
pub mod calendar_service;
pub mod mail_service;
pub mod pending_service;
pub mod scheduler_service;
pub mod scoring_service;
pub mod threshold_service;
pub mod transition_service;

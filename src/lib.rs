pub mod config;
pub mod database;
pub mod dto;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::engine::registry::SessionRegistry;
use crate::services::{
    exam_service::ExamService, import_service::ImportService, payment_service::PaymentService,
    progress_service::ProgressService, question_service::QuestionService,
    subscription_service::SubscriptionService, user_service::UserService,
};
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub sessions: Arc<SessionRegistry>,
    pub exam_service: ExamService,
    pub question_service: QuestionService,
    pub progress_service: ProgressService,
    pub user_service: UserService,
    pub subscription_service: SubscriptionService,
    pub payment_service: PaymentService,
    pub import_service: ImportService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        let sessions = Arc::new(SessionRegistry::new());
        let question_service = QuestionService::new(pool.clone());
        let exam_service = ExamService::new(pool.clone(), sessions.clone());
        let progress_service = ProgressService::new(pool.clone());
        let user_service = UserService::new(pool.clone());
        let subscription_service = SubscriptionService::new(pool.clone());
        let payment_service = PaymentService::new(http_client, config.payment_api_url.clone());
        let import_service = ImportService::new(question_service.clone());

        Self {
            pool,
            sessions,
            exam_service,
            question_service,
            progress_service,
            user_service,
            subscription_service,
            payment_service,
            import_service,
        }
    }
}

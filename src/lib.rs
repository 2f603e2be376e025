pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::{
    ai_service::TextGenerator, analytics_service::AnalyticsService,
    explanation_service::ExplanationService, question_service::QuestionService,
    quiz_service::QuizService, user_service::UserService,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub quiz_service: QuizService,
    pub explanation_service: ExplanationService,
    pub question_service: QuestionService,
    pub analytics_service: AnalyticsService,
    pub user_service: UserService,
}

impl AppState {
    /// Both quiz generation and explanations go through `generator`.
    pub fn new(pool: PgPool, config: Arc<Config>, generator: Arc<dyn TextGenerator>) -> Self {
        let quiz_service = QuizService::new(generator.clone(), config.max_quiz_questions);
        let explanation_service = ExplanationService::new(generator);
        let question_service = QuestionService::new(pool.clone(), config.max_quiz_questions);
        let analytics_service = AnalyticsService::new(pool.clone());
        let user_service = UserService::new(pool.clone(), config.pepper_bytes());

        Self {
            pool,
            config,
            quiz_service,
            explanation_service,
            question_service,
            analytics_service,
            user_service,
        }
    }
}

pub mod ai_service;
pub mod analytics_service;
pub mod explanation_service;
pub mod json_repair;
pub mod normalizer;
pub mod question_service;
pub mod question_validator;
pub mod quiz_service;
pub mod user_service;

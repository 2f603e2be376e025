pub mod analytics_dto;
pub mod auth_dto;
pub mod quiz_dto;

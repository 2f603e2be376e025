pub mod analytics;
pub mod question;
pub mod user;

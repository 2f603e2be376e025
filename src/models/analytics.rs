use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionAnalytics {
    pub id: i64,
    pub question_id: i64,
    pub question_text: String,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub timeout_count: i32,
    pub avg_time_taken: f64,
    pub total_score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

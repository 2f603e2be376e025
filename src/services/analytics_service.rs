use crate::dto::analytics_dto::{AnswerEvent, QuestionAnalyticsSummary};
use crate::error::{Error, Result};
use crate::models::analytics::QuestionAnalytics;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AnalyticsService {
    pool: PgPool,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends the raw answer and folds it into the per-question aggregate.
    /// A timed out answer counts as wrong.
    pub async fn log_answer(&self, event: &AnswerEvent) -> Result<QuestionAnalytics> {
        let is_correct = event.is_correct && !event.timed_out;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO answer_logs (question_id, is_correct, time_taken, score, timed_out, selected_option)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.question_id)
        .bind(is_correct)
        .bind(event.time_taken)
        .bind(event.score)
        .bind(event.timed_out)
        .bind(&event.selected_option)
        .execute(&mut *tx)
        .await
        .map_err(|e| unknown_question(e, event.question_id))?;

        // Existing counts in the SET clause are the pre-update values.
        let analytics = sqlx::query_as::<_, QuestionAnalytics>(
            r#"
            INSERT INTO question_analytics
                (question_id, question_text, correct_count, wrong_count, timeout_count, avg_time_taken, total_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (question_id) DO UPDATE SET
                correct_count = question_analytics.correct_count + EXCLUDED.correct_count,
                wrong_count = question_analytics.wrong_count + EXCLUDED.wrong_count,
                timeout_count = question_analytics.timeout_count + EXCLUDED.timeout_count,
                avg_time_taken = (question_analytics.avg_time_taken
                        * (question_analytics.correct_count + question_analytics.wrong_count)
                        + EXCLUDED.avg_time_taken)
                    / (question_analytics.correct_count + question_analytics.wrong_count + 1),
                total_score = question_analytics.total_score + EXCLUDED.total_score,
                updated_at = NOW()
            RETURNING id, question_id, question_text, correct_count, wrong_count, timeout_count,
                      avg_time_taken, total_score, created_at, updated_at
            "#,
        )
        .bind(event.question_id)
        .bind(event.question_text.trim())
        .bind(i32::from(is_correct))
        .bind(i32::from(!is_correct))
        .bind(i32::from(event.timed_out))
        .bind(event.time_taken)
        .bind(i64::from(event.score))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unknown_question(e, event.question_id))?;

        tx.commit().await?;

        tracing::debug!(
            question_id = event.question_id,
            is_correct,
            timed_out = event.timed_out,
            "answer logged"
        );
        Ok(analytics)
    }

    pub async fn all_analytics(&self) -> Result<Vec<QuestionAnalyticsSummary>> {
        let rows = sqlx::query_as::<_, QuestionAnalytics>(
            r#"
            SELECT id, question_id, question_text, correct_count, wrong_count, timeout_count,
                   avg_time_taken, total_score, created_at, updated_at
            FROM question_analytics
            ORDER BY question_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuestionAnalyticsSummary::from).collect())
    }
}

fn unknown_question(err: sqlx::Error, question_id: i64) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return Error::NotFound(format!("Question {} not found", question_id));
        }
    }
    err.into()
}

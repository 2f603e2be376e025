use crate::error::Result;
use crate::models::question::{Difficulty, PersistedQuestion, ValidatedQuestion};
use crate::services::quiz_service::clamp_question_count;
use sqlx::PgPool;

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
    max_questions: usize,
}

impl QuestionService {
    pub fn new(pool: PgPool, max_questions: usize) -> Self {
        Self {
            pool,
            max_questions,
        }
    }

    /// Stores a generated batch in one transaction. Ids and timestamps come
    /// from the database.
    pub async fn store_questions(
        &self,
        questions: &[ValidatedQuestion],
        topic: &str,
    ) -> Result<Vec<PersistedQuestion>> {
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(questions.len());

        for q in questions {
            let row = sqlx::query_as::<_, PersistedQuestion>(
                r#"
                INSERT INTO questions (topic, question, options, correct_answer, difficulty)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, topic, question, options, correct_answer, difficulty, created_at
                "#,
            )
            .bind(topic)
            .bind(&q.question)
            .bind(&q.options)
            .bind(&q.correct_answer)
            .bind(q.difficulty.as_str())
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        tracing::info!(topic, count = stored.len(), "stored generated questions");
        Ok(stored)
    }

    pub async fn random_questions(
        &self,
        topic: &str,
        difficulty: Option<Difficulty>,
        count: i64,
    ) -> Result<Vec<PersistedQuestion>> {
        let limit = clamp_question_count(count, self.max_questions) as i64;

        let questions = sqlx::query_as::<_, PersistedQuestion>(
            r#"
            SELECT id, topic, question, options, correct_answer, difficulty, created_at
            FROM questions
            WHERE LOWER(topic) = LOWER($1)
              AND ($2::TEXT IS NULL OR difficulty = $2)
            ORDER BY RANDOM()
            LIMIT $3
            "#,
        )
        .bind(topic.trim())
        .bind(difficulty.map(|d| d.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }
}

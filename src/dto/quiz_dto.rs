use crate::models::question::{PersistedQuestion, QuestionType, ValidatedQuestion};
use crate::services::{ai_service::Reference, explanation_service::ExplainedQuestion};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const GENERATION_FAILED: &str = "Failed to generate quiz. Please try again.";

fn default_num_questions() -> i64 {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizPayload {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    /// Clamped by the orchestrator, never rejected.
    #[serde(default = "default_num_questions")]
    pub num_questions: i64,
    #[serde(default)]
    pub question_types: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default = "default_true")]
    pub persist: bool,
    /// Adds an explanation with references to every question.
    #[serde(default)]
    pub explain: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizQuestionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub question: ValidatedQuestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
}

impl From<ValidatedQuestion> for QuizQuestionResponse {
    fn from(question: ValidatedQuestion) -> Self {
        Self {
            id: None,
            question,
            explanation: None,
            references: None,
        }
    }
}

impl From<ExplainedQuestion> for QuizQuestionResponse {
    fn from(explained: ExplainedQuestion) -> Self {
        Self {
            id: None,
            question: explained.question,
            explanation: Some(explained.explanation),
            references: Some(explained.references),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerateQuizResponse {
    Success {
        topic: String,
        quiz: Vec<QuizQuestionResponse>,
    },
    Error {
        error: String,
    },
}

impl GenerateQuizResponse {
    pub fn failed() -> Self {
        GenerateQuizResponse::Error {
            error: GENERATION_FAILED.to_string(),
        }
    }

    /// Pairs each generated question with its stored id when the batch was
    /// persisted. Both lists are in generation order.
    pub fn success(
        topic: &str,
        quiz: Vec<QuizQuestionResponse>,
        stored: &[PersistedQuestion],
    ) -> Self {
        let quiz = quiz
            .into_iter()
            .enumerate()
            .map(|(i, item)| QuizQuestionResponse {
                id: stored.get(i).map(|p| p.id),
                ..item
            })
            .collect();
        GenerateQuizResponse::Success {
            topic: topic.to_string(),
            quiz,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionTypeInfo {
    pub id: &'static str,
    pub value: &'static str,
    pub label: &'static str,
}

impl From<QuestionType> for QuestionTypeInfo {
    fn from(ty: QuestionType) -> Self {
        Self {
            id: ty.ui_id(),
            value: ty.as_str(),
            label: ty.label(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RandomQuestionsQuery {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    pub difficulty: Option<String>,
    #[serde(default = "default_num_questions")]
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExplainPayload {
    #[validate(length(min = 1))]
    pub question: String,
    #[validate(length(min = 1))]
    pub correct_answer: String,
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
}

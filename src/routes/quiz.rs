use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::quiz_dto::{
        ExplainPayload, GenerateQuizPayload, GenerateQuizResponse, QuestionTypeInfo,
        QuizQuestionResponse, RandomQuestionsQuery,
    },
    error::{Error, Result},
    models::question::{Difficulty, QuestionType},
    AppState,
};

#[axum::debug_handler]
pub async fn question_types() -> impl IntoResponse {
    let types: Vec<QuestionTypeInfo> = QuestionType::ALL
        .into_iter()
        .map(QuestionTypeInfo::from)
        .collect();
    Json(types)
}

/// A failed generation is still a 200, with `status: error` in the body.
/// Storage failures are logged and the quiz is returned without ids. With
/// `explain` set, each question also gets an explanation call.
#[axum::debug_handler]
pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(payload): Json<GenerateQuizPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let topic = payload.topic.trim();
    if topic.is_empty() {
        return Err(Error::BadRequest("topic must not be blank".to_string()));
    }

    let questions = state
        .quiz_service
        .generate_quiz(
            topic,
            payload.num_questions,
            &payload.question_types,
            payload.difficulty.as_deref().unwrap_or_default(),
        )
        .await;

    if questions.is_empty() {
        return Ok(Json(GenerateQuizResponse::failed()));
    }

    let stored = if payload.persist {
        match state.question_service.store_questions(&questions, topic).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(error = ?e, topic, "failed to store generated quiz");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let quiz: Vec<QuizQuestionResponse> = if payload.explain {
        state
            .explanation_service
            .explain_quiz(&questions, topic)
            .await
            .into_iter()
            .map(QuizQuestionResponse::from)
            .collect()
    } else {
        questions.into_iter().map(QuizQuestionResponse::from).collect()
    };

    Ok(Json(GenerateQuizResponse::success(topic, quiz, &stored)))
}

#[axum::debug_handler]
pub async fn random_questions(
    State(state): State<AppState>,
    Query(query): Query<RandomQuestionsQuery>,
) -> Result<impl IntoResponse> {
    query.validate()?;
    let difficulty = query
        .difficulty
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<Difficulty>().map_err(Error::BadRequest))
        .transpose()?;

    let questions = state
        .question_service
        .random_questions(&query.topic, difficulty, query.count)
        .await?;
    Ok(Json(questions))
}

#[axum::debug_handler]
pub async fn explain(
    State(state): State<AppState>,
    Json(payload): Json<ExplainPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let explanation = state
        .explanation_service
        .explain(&payload.question, &payload.correct_answer, payload.topic.trim())
        .await;
    Ok(Json(explanation))
}

use crate::models::question::{Difficulty, QuestionType, ValidatedQuestion};
use crate::services::ai_service::{GatewayResponse, TextGenerator};
use crate::services::json_repair::{parse_with_repair, RepairError};
use crate::services::normalizer::normalize;
use crate::services::question_validator::sanitize;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub topic: String,
    pub num_questions: usize,
    pub question_types: Vec<QuestionType>,
    pub difficulty: Difficulty,
}

impl QuizRequest {
    pub fn new(
        topic: &str,
        num_questions: i64,
        question_types: &[String],
        difficulty: &str,
        max_questions: usize,
    ) -> Result<Self, PipelineError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PipelineError::EmptyTopic);
        }

        Ok(Self {
            topic: topic.to_string(),
            num_questions: clamp_question_count(num_questions, max_questions),
            question_types: parse_question_types(question_types),
            difficulty: Difficulty::parse_or_default(difficulty),
        })
    }
}

pub fn clamp_question_count(requested: i64, max_questions: usize) -> usize {
    let max = i64::try_from(max_questions.max(1)).unwrap_or(i64::MAX);
    requested.clamp(1, max) as usize
}

/// Unknown tags are dropped; an empty result means multiple choice.
pub fn parse_question_types(tags: &[String]) -> Vec<QuestionType> {
    let mut types = Vec::new();
    for ty in tags.iter().filter_map(|t| QuestionType::from_tag(t)) {
        if !types.contains(&ty) {
            types.push(ty);
        }
    }
    if types.is_empty() {
        types.push(QuestionType::MultipleChoice);
    }
    types
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Idle,
    Prompting,
    AwaitingResponse,
    Normalizing,
    Repairing,
    Validating,
    Done,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationStage::Idle => "idle",
            GenerationStage::Prompting => "prompting",
            GenerationStage::AwaitingResponse => "awaiting_response",
            GenerationStage::Normalizing => "normalizing",
            GenerationStage::Repairing => "repairing",
            GenerationStage::Validating => "validating",
            GenerationStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("no JSON found in model response")]
    NoJson,

    #[error("model response could not be repaired: {0}")]
    Unparseable(#[from] RepairError),
}

#[derive(Clone)]
pub struct QuizService {
    generator: Arc<dyn TextGenerator>,
    max_questions: usize,
}

impl QuizService {
    pub fn new(generator: Arc<dyn TextGenerator>, max_questions: usize) -> Self {
        Self {
            generator,
            max_questions: max_questions.max(1),
        }
    }

    pub fn max_questions(&self) -> usize {
        self.max_questions
    }

    /// Never fails. A short or empty result is the only failure signal.
    pub async fn generate_quiz(
        &self,
        topic: &str,
        num_questions: i64,
        question_types: &[String],
        difficulty: &str,
    ) -> Vec<ValidatedQuestion> {
        match QuizRequest::new(
            topic,
            num_questions,
            question_types,
            difficulty,
            self.max_questions,
        ) {
            Ok(request) => self.generate(&request).await,
            Err(e) => {
                tracing::warn!(error = %e, "rejected quiz request");
                Vec::new()
            }
        }
    }

    /// Runs the pipeline once inside a span carrying a fresh run id.
    pub async fn generate(&self, request: &QuizRequest) -> Vec<ValidatedQuestion> {
        let span = tracing::info_span!(
            "quiz_generation",
            run_id = %Uuid::new_v4(),
            topic = %request.topic,
            count = request.num_questions,
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &QuizRequest) -> Vec<ValidatedQuestion> {
        trace_stage(GenerationStage::Idle, request);

        trace_stage(GenerationStage::Prompting, request);
        let prompt = build_prompt(request);

        trace_stage(GenerationStage::AwaitingResponse, request);
        let raw = match self.generator.generate(&prompt, &request.topic).await {
            GatewayResponse::Text(text) => text,
            GatewayResponse::Empty => {
                tracing::warn!(topic = %request.topic, "AI service returned no content");
                return Vec::new();
            }
            GatewayResponse::Fault(reason) => {
                tracing::warn!(topic = %request.topic, %reason, "AI service call failed");
                return Vec::new();
            }
        };

        match process_response(&raw, request) {
            Ok(questions) => {
                trace_stage(GenerationStage::Done, request);
                tracing::info!(
                    topic = %request.topic,
                    requested = request.num_questions,
                    produced = questions.len(),
                    "quiz generated"
                );
                questions
            }
            Err(e) => {
                tracing::warn!(
                    topic = %request.topic,
                    error = %e,
                    preview = %preview(&raw),
                    "quiz generation produced no questions"
                );
                Vec::new()
            }
        }
    }
}

/// Normalize, repair and validate one raw response.
pub fn process_response(
    raw: &str,
    request: &QuizRequest,
) -> Result<Vec<ValidatedQuestion>, PipelineError> {
    trace_stage(GenerationStage::Normalizing, request);
    let candidate = normalize(raw);
    if candidate.is_empty() {
        return Err(PipelineError::NoJson);
    }

    trace_stage(GenerationStage::Repairing, request);
    let repaired = parse_with_repair(&candidate)?;

    trace_stage(GenerationStage::Validating, request);
    Ok(sanitize(&repaired.value))
}

fn trace_stage(stage: GenerationStage, request: &QuizRequest) {
    tracing::debug!(%stage, topic = %request.topic, "quiz pipeline stage");
}

fn preview(raw: &str) -> String {
    raw.chars().take(PREVIEW_CHARS).collect()
}

pub fn build_prompt(request: &QuizRequest) -> String {
    let types = request
        .question_types
        .iter()
        .map(QuestionType::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let noun = if request.num_questions == 1 {
        "question"
    } else {
        "questions"
    };

    format!(
        r#"Generate a quiz about {topic} containing exactly {count} {noun}.
Requested question types: {types}.

{guidance}

Strictly follow these rules:
- Challenge users with critical thinking, reading comprehension, and problem-solving
- Balance the questions to progressively challenge learners while being fair
- Every question is answered by picking one option, even for code or short answer types
- Each question must have exactly 4 options
- One and only one option must be correct
- The correct_answer must be copied exactly from one of the options
- All options must be plausible and related to the topic
- Don't use options like "All of the above" or "None of the above"
- Set "difficulty" to "{difficulty}" for every question

Return a valid JSON object with the following structure and nothing else:
{{"questions": [
    {{
        "type": "multiple_choice",
        "question": "question_text",
        "options": ["option1", "option2", "option3", "option4"],
        "correct_answer": "correct_option",
        "difficulty": "{difficulty}"
    }}
]}}"#,
        topic = request.topic,
        count = request.num_questions,
        noun = noun,
        types = types,
        guidance = request.difficulty.guidance(),
        difficulty = request.difficulty,
    )
}

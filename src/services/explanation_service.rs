use crate::models::question::ValidatedQuestion;
use crate::services::ai_service::{GatewayResponse, Reference, TextGenerator};
use serde::Serialize;
use std::sync::Arc;

const MAX_EXPLANATION_WORDS: usize = 100;
const SECTION_SEPARATOR: &str = "\n--- ";
const SOURCES_SECTION: &str = "Sources ---";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub explanation: String,
    pub references: Vec<Reference>,
}

impl Explanation {
    pub fn fallback(topic: &str) -> Self {
        Self {
            explanation: format!("The correct answer relates to key concepts in {}.", topic),
            references: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplainedQuestion {
    #[serde(flatten)]
    pub question: ValidatedQuestion,
    pub explanation: String,
    pub references: Vec<Reference>,
}

#[derive(Clone)]
pub struct ExplanationService {
    generator: Arc<dyn TextGenerator>,
}

impl ExplanationService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn explain(&self, question: &str, correct_answer: &str, topic: &str) -> Explanation {
        let prompt = explanation_prompt(question, correct_answer, topic);

        match self.generator.generate(&prompt, topic).await {
            GatewayResponse::Text(text) => parse_explanation(&text, topic),
            GatewayResponse::Empty => {
                tracing::warn!(topic, "empty explanation from AI service");
                Explanation::fallback(topic)
            }
            GatewayResponse::Fault(reason) => {
                tracing::error!(topic, %reason, "Error generating explanation");
                Explanation::fallback(topic)
            }
        }
    }

    /// Explains each question in order; one slow or failed call only costs
    /// that question its explanation.
    pub async fn explain_quiz(
        &self,
        questions: &[ValidatedQuestion],
        topic: &str,
    ) -> Vec<ExplainedQuestion> {
        let mut explained = Vec::with_capacity(questions.len());
        for question in questions {
            let Explanation {
                explanation,
                references,
            } = self
                .explain(&question.question, &question.correct_answer, topic)
                .await;
            explained.push(ExplainedQuestion {
                question: question.clone(),
                explanation,
                references,
            });
        }
        explained
    }
}

pub fn explanation_prompt(question: &str, correct_answer: &str, topic: &str) -> String {
    format!(
        "Based on accurate information from web search, generate a clear, evidence-based explanation for this question:

Question: {question}
Correct Answer: {correct_answer}
Topic: {topic}

Requirements:
- Search for and cite reliable sources
- Provide a clear, concise explanation (3-4 sentences)
- Reference specific sources when possible
- Focus on why the answer is correct
- Explain core concepts clearly"
    )
}

/// Splits gateway text into the explanation body and any sources section.
pub fn parse_explanation(text: &str, topic: &str) -> Explanation {
    let mut sections = text.split(SECTION_SEPARATOR);
    let body = sections.next().unwrap_or_default();

    let references = sections
        .filter(|section| section.starts_with(SOURCES_SECTION))
        .flat_map(|section| section.lines().filter_map(parse_reference))
        .collect();

    let explanation = body
        .split_whitespace()
        .take(MAX_EXPLANATION_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    if explanation.is_empty() {
        return Explanation {
            references,
            ..Explanation::fallback(topic)
        };
    }

    Explanation {
        explanation,
        references,
    }
}

/// `- [title](url)`; malformed lines are skipped.
fn parse_reference(line: &str) -> Option<Reference> {
    let rest = line.strip_prefix("- [")?;
    let title_end = rest.find(']')?;
    let after_title = &rest[title_end + 1..];
    let url_start = after_title.find('(')? + 1;
    let url_len = after_title[url_start..].find(')')?;

    Some(Reference {
        title: rest[..title_end].to_string(),
        url: after_title[url_start..url_start + url_len].to_string(),
    })
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Case-insensitive; anything unrecognised falls back to medium.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            Difficulty::Easy => {
                "Difficulty: EASY. Focus on fundamental facts and definitions a beginner would know. \
                 Keep wording simple and make the correct answer clearly distinguishable \
                 from the distractors."
            }
            Difficulty::Medium => {
                "Difficulty: MEDIUM. Mix recall with application of concepts. Distractors should be \
                 plausible and require a working understanding of the topic to rule out."
            }
            Difficulty::Hard => {
                "Difficulty: HARD. Require analysis, multi-step reasoning or knowledge of specific \
                 details and edge cases. Distractors should be closely related and only \
                 distinguishable with expert understanding."
            }
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Code,
    ShortAnswer,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::MultipleChoice,
        QuestionType::Code,
        QuestionType::ShortAnswer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Code => "code",
            QuestionType::ShortAnswer => "short_answer",
        }
    }

    /// Identifier used by the browser form.
    pub fn ui_id(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multipleChoice",
            QuestionType::Code => "code",
            QuestionType::ShortAnswer => "shortAnswer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Multiple Choice",
            QuestionType::Code => "Code",
            QuestionType::ShortAnswer => "Short Answer",
        }
    }

    /// Accepts both `multiple_choice` and the camelCase `multipleChoice` form.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let normalized: String = tag
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "multiplechoice" | "mcq" => Some(QuestionType::MultipleChoice),
            "code" => Some(QuestionType::Code),
            "shortanswer" => Some(QuestionType::ShortAnswer),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question that passed schema and semantic checks. `correct_answer` is
/// always one of `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedQuestion {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersistedQuestion {
    pub id: i64,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
}

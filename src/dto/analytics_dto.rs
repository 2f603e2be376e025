use crate::models::analytics::QuestionAnalytics;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One answered (or timed out) question as reported by the quiz client.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnswerEvent {
    #[validate(range(min = 1))]
    pub question_id: i64,
    #[validate(length(min = 1, max = 500))]
    pub question_text: String,
    pub is_correct: bool,
    #[validate(range(min = 0.0))]
    pub time_taken: f64,
    /// Delta added to the running total; penalties are negative.
    pub score: i32,
    #[serde(default)]
    pub timed_out: bool,
    pub selected_option: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionAnalyticsSummary {
    pub question_id: i64,
    pub question: String,
    pub correct_answers: i32,
    pub wrong_answers: i32,
    pub timeouts: i32,
    pub avg_time_taken: f64,
    pub total_score: i64,
    pub accuracy: f64,
}

impl From<QuestionAnalytics> for QuestionAnalyticsSummary {
    fn from(a: QuestionAnalytics) -> Self {
        Self {
            accuracy: accuracy(a.correct_count, a.wrong_count),
            avg_time_taken: round_to(a.avg_time_taken, 2),
            question_id: a.question_id,
            question: a.question_text,
            correct_answers: a.correct_count,
            wrong_answers: a.wrong_count,
            timeouts: a.timeout_count,
            total_score: a.total_score,
        }
    }
}

/// Percentage of correct answers to one decimal; 0 without attempts.
pub fn accuracy(correct: i32, wrong: i32) -> f64 {
    let attempts = correct + wrong;
    if attempts <= 0 {
        return 0.0;
    }
    round_to(f64::from(correct) / f64::from(attempts) * 100.0, 1)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(correct: i32, wrong: i32, avg: f64) -> QuestionAnalytics {
        QuestionAnalytics {
            id: 1,
            question_id: 42,
            question_text: "Who was the first Roman Emperor?".into(),
            correct_count: correct,
            wrong_count: wrong,
            timeout_count: 1,
            avg_time_taken: avg,
            total_score: 300,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn accuracy_is_rounded_to_one_decimal() {
        assert_eq!(accuracy(2, 1), 66.7);
        assert_eq!(accuracy(1, 0), 100.0);
        assert_eq!(accuracy(0, 0), 0.0);
    }

    #[test]
    fn summary_rounds_average_time() {
        let summary = QuestionAnalyticsSummary::from(row(1, 2, 12.34567));
        assert_eq!(summary.avg_time_taken, 12.35);
        assert_eq!(summary.accuracy, 33.3);
        assert_eq!(summary.question, "Who was the first Roman Emperor?");
        assert_eq!(summary.timeouts, 1);
    }

    #[test]
    fn answer_event_validation() {
        let event: AnswerEvent = serde_json::from_value(serde_json::json!({
            "question_id": 3,
            "question_text": "Q",
            "is_correct": false,
            "time_taken": 4.5,
            "score": 0
        }))
        .unwrap();
        assert!(event.validate().is_ok());
        assert!(!event.timed_out);

        let penalty = AnswerEvent {
            score: -5,
            ..event.clone()
        };
        assert!(penalty.validate().is_ok());

        let bad = AnswerEvent {
            time_taken: -1.0,
            ..event
        };
        assert!(bad.validate().is_err());
    }
}

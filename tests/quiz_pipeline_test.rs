mod common;

use common::{StubGenerator, ROMAN_RESPONSE};
use quizforge_backend::models::question::Difficulty;
use quizforge_backend::services::ai_service::GatewayResponse;
use quizforge_backend::services::json_repair::parse_with_repair;
use quizforge_backend::services::normalizer::normalize;
use quizforge_backend::services::question_validator::sanitize;
use quizforge_backend::services::quiz_service::QuizService;

fn mc() -> Vec<String> {
    vec!["multiple_choice".to_string()]
}

#[tokio::test]
async fn roman_history_end_to_end() {
    let stub = StubGenerator::text(ROMAN_RESPONSE);
    let service = QuizService::new(stub.clone(), 20);

    let quiz = service
        .generate_quiz("Roman History", 2, &mc(), "medium")
        .await;

    assert_eq!(quiz.len(), 1);
    assert_eq!(quiz[0].question, "Who was the first Roman Emperor?");
    assert_eq!(quiz[0].correct_answer, "Augustus");
    assert_eq!(quiz[0].difficulty, Difficulty::Medium);

    let prompts = stub.prompts();
    assert_eq!(prompts.len(), 1, "exactly one gateway call, no retries");
    assert!(prompts[0].contains("Roman History"));
    assert!(prompts[0].contains("exactly 2 questions"));
}

#[tokio::test]
async fn empty_and_prose_responses_give_empty_quizzes() {
    for response in [
        GatewayResponse::Empty,
        GatewayResponse::Text(String::new()),
        GatewayResponse::Text("I'm sorry, I can't help with that.".into()),
        GatewayResponse::Fault("deadline exceeded".into()),
    ] {
        let service = QuizService::new(StubGenerator::new(response.clone()), 20);
        let quiz = service.generate_quiz("Roman History", 3, &mc(), "easy").await;
        assert!(quiz.is_empty(), "expected no questions for {:?}", response);
    }
}

#[tokio::test]
async fn request_count_is_clamped_before_prompting() {
    let stub = StubGenerator::new(GatewayResponse::Empty);
    let service = QuizService::new(stub.clone(), 20);

    service.generate_quiz("Rust", 0, &mc(), "easy").await;
    service.generate_quiz("Rust", 999, &mc(), "easy").await;

    let prompts = stub.prompts();
    assert!(prompts[0].contains("exactly 1 question."));
    assert!(prompts[1].contains("exactly 20 questions"));
}

#[tokio::test]
async fn validated_subset_keeps_model_order() {
    let body = r#"{"questions": [
        {"question": "one", "options": ["a","b","c","d"], "correct_answer": "a"},
        {"question": "bad", "options": ["a","b","c","d"], "correct_answer": "z"},
        {"question": "two", "options": ["a","b","c","d"], "correct_answer": "d", "difficulty": "HARD"}
    ]}"#;
    let service = QuizService::new(StubGenerator::text(body), 20);

    let quiz = service.generate_quiz("Letters", 3, &mc(), "medium").await;
    let texts: Vec<&str> = quiz.iter().map(|q| q.question.as_str()).collect();
    assert_eq!(texts, vec!["one", "two"]);
    assert_eq!(quiz[1].difficulty, Difficulty::Hard);
}

#[test]
fn every_validated_question_satisfies_the_schema() {
    let samples = [
        ROMAN_RESPONSE,
        "```json\n[{\"question\": \"Q\", \"options\": [1, 2, 3, 4], \"correct_answer\": 4},]\n```",
        "{\"questions\": [{\"question\": \"Q\", \"options\": [\"a\", \"\", \"c\", \"d\"], \"correct_answer\": \"a\"}]}",
        "{\"questions\": [\n{\"question\": \"Q\"\n\"options\": [\"w\", \"x\", \"y\", \"z\"],\n\"correct_answer\": \"y\"}\n]}",
    ];

    for raw in samples {
        let candidate = normalize(raw);
        let Ok(repaired) = parse_with_repair(&candidate) else {
            continue;
        };
        for q in sanitize(&repaired.value) {
            assert!(!q.question.trim().is_empty());
            assert_eq!(q.options.len(), 4);
            assert!(q.options.iter().all(|o| !o.trim().is_empty()));
            assert!(q.options.contains(&q.correct_answer));
        }
    }
}

#[test]
fn missing_comma_between_fields_is_recovered() {
    let raw = "{\"questions\": [\n{\"question\": \"Q\"\n\"options\": [\"w\", \"x\", \"y\", \"z\"],\n\"correct_answer\": \"y\"}\n]}";
    let repaired = parse_with_repair(&normalize(raw)).expect("repairable");
    let questions = sanitize(&repaired.value);
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].correct_answer, "y");
}

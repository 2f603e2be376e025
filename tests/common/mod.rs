#![allow(dead_code)]

use async_trait::async_trait;
use quizforge_backend::{
    config::Config,
    services::ai_service::{GatewayResponse, TextGenerator},
    AppState,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::{Arc, Mutex};

/// Replays one canned gateway response and records every prompt it sees.
pub struct StubGenerator {
    response: GatewayResponse,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn new(response: GatewayResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn text(body: &str) -> Arc<Self> {
        Self::new(GatewayResponse::Text(body.to_string()))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str, _topic: &str) -> GatewayResponse {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response.clone()
    }
}

pub const ROMAN_RESPONSE: &str = r#"Here is your quiz:
```json
{"questions":[
  {"question":"Who was the first Roman Emperor?","options":["Augustus","Nero","Caesar","Trajan"],"correct_answer":"Augustus","difficulty":"medium"},
  {"question":"Bad Q","options":["a","b"],"correct_answer":"a"}
]}
```"#;

/// State over a pool that never connects; only routes that stay off the
/// database can be exercised with it.
pub fn state_with(generator: Arc<dyn TextGenerator>, config: Config) -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    AppState::new(pool, Arc::new(config), generator)
}

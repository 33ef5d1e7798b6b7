//! Delegated plan generation through an OpenAI-compatible chat completion API.
//!
//! One request per plan: no retries and no streaming. The completion text must
//! be a JSON object keyed by day number; anything else fails the whole call.

use std::fmt::Write;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::AiConfig;
use crate::meals::repo_types::Meal;
use crate::plans::repo_types::DayMap;

pub const SYSTEM_PROMPT: &str = "You are a nutritionist and meal planning expert. \
Generate meal plans that are balanced and follow user preferences.";

pub const PLAN_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("no response within {0}s")]
    Timeout(u64),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion has no content")]
    MissingContent,
    #[error("completion is not a day-keyed meal plan: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "status",
            Self::MissingContent => "missing_content",
            Self::Decode(_) => "decode",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub preference: &'a str,
    pub meals: &'a [Meal],
    pub day_count: u8,
}

#[async_trait]
pub trait PlanProvider: Send + Sync {
    async fn request_plan(&self, request: PlanRequest<'_>) -> Result<DayMap, ProviderError>;
}

pub struct OpenAiPlanProvider {
    client: reqwest::Client,
    config: AiConfig,
}

impl OpenAiPlanProvider {
    pub fn new(config: AiConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl PlanProvider for OpenAiPlanProvider {
    async fn request_plan(&self, request: PlanRequest<'_>) -> Result<DayMap, ProviderError> {
        let prompt = build_prompt(&request);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: PLAN_TEMPERATURE,
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
                .map_err(|e| ProviderError::Transport(e.to_string()))?,
        );

        debug!(
            model = %self.config.model,
            meals = request.meals.len(),
            day_count = request.day_count,
            "requesting plan"
        );
        let response = self
            .client
            .post(&self.config.api_url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let content = completion_content(&text)?;
        let days = parse_plan_content(&content)?;
        info!(days = days.len(), "provider plan received");
        Ok(days)
    }
}

impl OpenAiPlanProvider {
    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.config.timeout_secs)
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

pub fn build_prompt(request: &PlanRequest<'_>) -> String {
    format!(
        r#"Given the following meals and user preference ({preference}), generate a balanced meal plan for {days} days.
Available meals:
{meals}
Rules:
1. Only use meals from the provided list
2. Ensure variety across days
3. Match user's nutrition preference
4. Balance caloric intake across meals
5. Consider prep time distribution

Return the meal plan as a JSON object with days as keys and meal names as values, following this structure:
{{
    "1": {{"breakfast": "meal_name", "lunch": "meal_name", "dinner": "meal_name", "dessert": "meal_name"}},
    ...
}}"#,
        preference = request.preference,
        days = request.day_count,
        meals = format_meals(request.meals),
    )
}

pub fn format_meals(meals: &[Meal]) -> String {
    let mut out = String::new();
    for meal in meals {
        let _ = writeln!(
            out,
            "-{} (Category: {}, Calories: {}, Tags: [{}])",
            meal.name,
            meal.category,
            meal.calories,
            meal.tags.join(" ")
        );
    }
    out
}

/// Text of the first choice in a chat completion body.
pub fn completion_content(body: &str) -> Result<String, ProviderError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(ProviderError::MissingContent)
}

pub fn parse_plan_content(content: &str) -> Result<DayMap, ProviderError> {
    serde_json::from_str::<DayMap>(content.trim()).map_err(|e| ProviderError::Decode(e.to_string()))
}

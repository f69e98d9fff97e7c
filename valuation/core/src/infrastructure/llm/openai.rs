// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI Valuation Estimator Adapter
//
// Anti-Corruption Layer for the OpenAI chat-completions API.
// Also works with OpenAI-compatible APIs (Azure OpenAI proxies, vLLM, etc.)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::config::{resolve_secret, ValuationAiConfig};
use crate::domain::estimator::{EstimatorError, ValuationEstimator, VehicleFacts};

const SYSTEM_PROMPT: &str = "You are a vehicle-valuation assistant for the Indian market. \
Given vehicle details, return EXACTLY three INR price ranges labelled Low, Mid and High, \
each formatted like \"Low: ₹7.5 L – ₹8 L\", plus a 1–2 sentence rationale for each.";

pub struct OpenAiValuationEstimator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiValuationEstimator {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            temperature: 0.2,
            max_tokens: 200,
        }
    }

    pub fn from_config(config: &ValuationAiConfig) -> anyhow::Result<Self> {
        let api_key = resolve_secret(&config.api_key)
            .ok_or_else(|| anyhow::anyhow!("valuation_ai.api_key references an unset variable"))?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn user_prompt(facts: &VehicleFacts) -> String {
        format!("Here are the vehicle details:\n{}\nPlease deliver:", facts.describe())
    }
}

#[async_trait]
impl ValuationEstimator for OpenAiValuationEstimator {
    async fn estimate(&self, facts: &VehicleFacts) -> Result<String, EstimatorError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::user_prompt(facts),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| EstimatorError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status == 401 || status == 403 {
                EstimatorError::Authentication(error_text)
            } else if status == 429 {
                EstimatorError::RateLimit
            } else {
                EstimatorError::Api {
                    status: status.as_u16(),
                    message: error_text,
                }
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| EstimatorError::Api {
            status: 200,
            message: format!("Failed to parse response: {}", e),
        })?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(EstimatorError::EmptyResponse)?;

        Ok(text)
    }
}

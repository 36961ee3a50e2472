//! OpenAI-compatible chat completions backend.
//!
//! Sends the rendered prompt as a system + user message pair in JSON mode
//! and parses the first choice's content as the structured answer.

use async_trait::async_trait;
use mindloop_application::{BackendError, PromptContext, ReasoningBackend};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

pub struct HttpReasoningBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorBody {
    error: ChatErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: String,
}

impl HttpReasoningBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            temperature: 0.2,
            timeout,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn request_body(&self, prompt: &PromptContext) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.full_user_prompt()},
            ],
        })
    }
}

/// Parse model output as JSON, tolerating a surrounding markdown fence.
fn parse_content(content: &str) -> Result<Value, BackendError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim()).map_err(|e| {
        BackendError::MalformedOutput(format!(
            "{}: {}",
            e,
            &unfenced[..unfenced.len().min(200)]
        ))
    })
}

#[async_trait]
impl ReasoningBackend for HttpReasoningBackend {
    async fn invoke(&self, prompt: &PromptContext) -> Result<Value, BackendError> {
        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&self.request_body(prompt));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout)
            } else {
                BackendError::Unavailable(format!("Failed to send request: {}", e))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Unavailable(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ChatErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| text.chars().take(200).collect());
            return Err(BackendError::Unavailable(format!("API error {}: {}", status, message)));
        }

        debug!(purpose = prompt.purpose.as_str(), "Chat completion received");

        let response: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| BackendError::Unavailable(format!("Unexpected response shape: {}", e)))?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::MalformedOutput("response has no content".to_string()))?;
        parse_content(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindloop_application::PromptPurpose;

    #[test]
    fn test_parse_content_accepts_fenced_json() {
        let value = parse_content("```json\n{\"action\": \"observe\"}\n```").unwrap();
        assert_eq!(value["action"], "observe");
        assert!(parse_content("{\"a\": 1}").is_ok());
        assert!(matches!(parse_content("not json"), Err(BackendError::MalformedOutput(_))));
    }

    #[test]
    fn test_request_body_carries_corrections() {
        let backend =
            HttpReasoningBackend::new("http://localhost:9/v1/", "m", None, Duration::from_secs(1)).unwrap();
        let mut prompt = PromptContext::new(PromptPurpose::ActionSelection, "sys", "pick");
        prompt.push_correction("add a rationale");
        let body = backend.request_body(&prompt);
        assert_eq!(body["messages"][1]["content"], "pick\n\nadd a rationale");
        assert_eq!(backend.base_url, "http://localhost:9/v1");
    }
}

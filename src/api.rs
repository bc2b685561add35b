use anyhow::{anyhow, Result};
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Base URL of the Generative Language API.
pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The model every request is sent to.
pub const MODEL_ID: &str = "gemini-1.5-flash";

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Harm categories blocked at medium probability and above.
const BLOCKED_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];
const BLOCK_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    safety_settings: Vec<SafetySetting>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    role: String,
    // May be empty when the model stops before producing text.
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,

    // Ex: 'STOP' | 'MAX_TOKENS' | 'SAFETY' | 'RECITATION'
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    // Set when the prompt itself was refused by moderation.
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: i32,
    message: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseContainer {
    error: ErrorResponse,
}

/// `ApiClient` sends a single prompt to the Gemini text-generation endpoint
/// and returns the generated text.
///
/// Generation settings are fixed: temperature 0.7, a 1000-token output cap,
/// and medium-and-above blocking for the four harm categories. Any failure
/// along the way, whether transport, quota, moderation, or a response shape
/// the client cannot decode, comes back as a single error value.
pub struct ApiClient {
    api_key: String,
}

impl ApiClient {
    pub fn new(api_key: String) -> Self {
        ApiClient { api_key }
    }

    /// Performs the one request/response exchange with the API.
    ///
    /// # Returns
    /// - `Result<String>`: the generated text on success, or an error carrying
    ///   a human-readable description of whatever went wrong.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", API_BASE, MODEL_ID);
        let body = build_request_body(prompt);
        debug!("POST {} (prompt: {} bytes)", url, prompt.len());

        let client = Client::new();
        let response = client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        debug!("response status {} ({} bytes)", status, response_text.len());

        if !status.is_success() {
            return Err(decode_error(status, &response_text));
        }
        extract_text(&response_text)
    }
}

/// Builds the request body from the prompt and the fixed generation settings.
fn build_request_body(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: Some(prompt.to_string()),
            }],
        }],
        safety_settings: BLOCKED_CATEGORIES
            .into_iter()
            .map(|category| SafetySetting {
                category,
                threshold: BLOCK_THRESHOLD,
            })
            .collect(),
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        },
    }
}

/// Turns a non-2xx response into an error, preferring the API's structured
/// error envelope over the raw body when it parses.
fn decode_error(status: StatusCode, body: &str) -> anyhow::Error {
    match serde_json::from_str::<ErrorResponseContainer>(body) {
        Ok(container) => anyhow!(
            "API request failed with code {} ({}): {}",
            container.error.code,
            container.error.status.as_deref().unwrap_or("UNKNOWN"),
            container.error.message,
        ),
        Err(_) => anyhow!("API request failed with status {}: {}", status, body),
    }
}

/// Decodes a successful response body and pulls out the generated text.
///
/// A blocked prompt, an empty candidate list, and a candidate that stopped
/// without producing text are all reported as errors naming the reason.
fn extract_text(response_text: &str) -> Result<String> {
    let parsed: GenerateContentResponse = serde_json::from_str(response_text)
        .map_err(|e| anyhow!("Failed to parse JSON: {}\nRaw JSON: {}", e, response_text))?;

    if let Some(feedback) = &parsed.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            return Err(anyhow!("prompt was blocked by the API: {}", reason));
        }
    }

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("the API returned no candidates"))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(anyhow!(
            "the response contained no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown"),
        ));
    }
    Ok(text)
}

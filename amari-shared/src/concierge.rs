/// AI wedding concierge backed by the Gemini `generateContent` API
///
/// The concierge is a single-turn chat: each question is sent with a fixed
/// system instruction describing "Amari", plus optional free-text context
/// from the client (for example the couple's date and guest count).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Public Gemini API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Reply sent to the client when the upstream call fails
pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting to the wedding planning servers right now. Please try again later.";

/// Reply sent when the model answers with no text
pub const EMPTY_REPLY: &str = "I apologize, I couldn't generate a response at the moment.";

const SYSTEM_INSTRUCTION: &str = r#"You are "Amari", a luxury wedding concierge for Diani, Kenya.
Your goal is to assist couples in planning their dream wedding on the Kenyan coast.
You are knowledgeable about:
- Diani Beach venues and local customs (Swahili culture).
- Weather patterns (best time: Dec-Mar, Jul-Oct).
- Legal requirements for weddings in Kenya.
- Vendor types (Photographers, Caterers, etc.).
- Creating romantic itineraries.

Tone: Warm, sophisticated, helpful, and celebratory.
Keep responses concise and easy to read."#;

/// Error type for concierge requests
#[derive(Debug, thiserror::Error)]
pub enum ConciergeError {
    /// No API key configured
    #[error("Concierge is not configured")]
    NotConfigured,

    /// HTTP transport failure
    #[error("Request to Gemini failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from Gemini
    #[error("Gemini returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// Gemini client with the concierge persona
#[derive(Clone)]
pub struct ConciergeClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for ConciergeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConciergeClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ConciergeClient {
    /// Creates a client for `model`
    ///
    /// # Errors
    ///
    /// Returns `ConciergeError::NotConfigured` for an empty key, or an HTTP
    /// error if the client cannot be built
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ConciergeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConciergeError::NotConfigured);
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Overrides the API base URL (for tests or proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }

    /// Sends one question and returns the model's text reply
    ///
    /// An answer with no text parts yields [`EMPTY_REPLY`].
    pub async fn ask(&self, message: &str, context: Option<&str>) -> Result<String, ConciergeError> {
        let request = build_request(message, context);

        debug!(model = %self.model, "Sending concierge request to Gemini");

        let response = self
            .client
            .post(self.build_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| ConciergeError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Gemini API error");
            return Err(ConciergeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        // the request URL carries the API key, keep it out of errors
        let response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ConciergeError::Http(e.without_url()))?;
        Ok(extract_reply(response).unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }
}

/// Joins the question with the optional context line
fn build_prompt(message: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{}\nContext: {}", message, context),
        None => message.to_string(),
    }
}

fn build_request(message: &str, context: Option<&str>) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: build_prompt(message, context),
            }],
        }],
        system_instruction: GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: SYSTEM_INSTRUCTION.to_string(),
            }],
        },
    }
}

fn extract_reply(response: GeminiResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let text: String = candidate
        .content?
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    system_instruction: GeminiContent,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

//! Generative text client.
//!
//! Handlers talk to a [`TextGenerator`]; [`GeminiClient`] is the production
//! implementation over the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("request to Gemini failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Gemini returned no text")]
    EmptyResponse,
}

/// An image attached to a prompt, already base64 encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data_base64: String,
}

impl InlineImage {
    /// Accepts raw base64 or a `data:<mime>;base64,` URL. Raw data is
    /// assumed to be JPEG, which is what the web client uploads.
    pub fn from_client(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let (mime_type, data) = match value.strip_prefix("data:") {
            Some(rest) => {
                let (header, data) = rest.split_once(',')?;
                let mime = header.split(';').next().filter(|m| !m.is_empty());
                (mime.unwrap_or("image/jpeg"), data)
            }
            None => ("image/jpeg", value),
        };
        let data: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        if data.is_empty() {
            return None;
        }
        Some(Self {
            mime_type: mime_type.to_string(),
            data_base64: data,
        })
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
    ) -> Result<String, GenerationError>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

fn request_body(prompt: &str, image: Option<&InlineImage>) -> Value {
    let mut parts = vec![json!({ "text": prompt })];
    if let Some(image) = image {
        parts.push(json!({
            "inlineData": { "mimeType": image.mime_type, "data": image.data_base64 }
        }));
    }
    json!({ "contents": [{ "parts": parts }] })
}

/// Join the text parts of the first candidate.
fn response_text(json: &Value) -> Option<String> {
    let parts = json["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
    ) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;
        log::info!(
            "Gemini request: model={}, prompt={} chars, image={}",
            self.model,
            prompt.len(),
            image.is_some()
        );

        let resp = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request_body(prompt, image))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = resp.json().await?;
        response_text(&json).ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_image_from_data_url() {
        let image = InlineImage::from_client("data:image/png;base64,iVBO\nRw0K").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data_base64, "iVBORw0K");

        let raw = InlineImage::from_client("/9j/4AAQ").unwrap();
        assert_eq!(raw.mime_type, "image/jpeg");

        assert!(InlineImage::from_client("  ").is_none());
        assert!(InlineImage::from_client("data:image/png;base64,").is_none());
    }

    #[test]
    fn test_request_body_parts() {
        let body = request_body("hello", None);
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);

        let image = InlineImage {
            mime_type: "image/jpeg".into(),
            data_base64: "AAAA".into(),
        };
        let body = request_body("hello", Some(&image));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "AAAA");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Dear " }, { "text": "Sir" }] } }]
        });
        assert_eq!(response_text(&json).as_deref(), Some("Dear Sir"));
        assert_eq!(response_text(&json!({ "candidates": [] })), None);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = GeminiClient::new(
            Some("  ".into()),
            "gemini-2.0-flash",
            "http://127.0.0.1:9/",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!client.has_api_key());
        let err = client.generate("hi", None).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey));
    }
}

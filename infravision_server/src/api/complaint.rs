//! Complaint generation and the chat assistant.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use complaint_pdf_rust::Language;

use crate::error::{ApiError, ApiResult};
use crate::gemini::InlineImage;
use crate::prompts::{self, ChatContext, ChatMessage, ComplaintPrompt};
use crate::state::AppState;

/// A coordinate as the client sends it: a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn as_text(&self) -> Option<String> {
        match self {
            Coordinate::Number(value) if value.is_finite() => Some(value.to_string()),
            Coordinate::Number(_) => None,
            Coordinate::Text(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub latitude: Option<Coordinate>,
    #[serde(default)]
    pub longitude: Option<Coordinate>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_details: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub local_lang: Option<String>,
    #[serde(default)]
    pub place_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub english_complaint: String,
    pub local_complaint: String,
    pub label: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Handler for `POST /api/generate-complaint`
pub async fn generate_complaint(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let required = (
        non_empty(req.label.as_deref()),
        req.latitude.as_ref().and_then(Coordinate::as_text),
        req.longitude.as_ref().and_then(Coordinate::as_text),
        non_empty(req.user_name.as_deref()),
    );
    let (Some(label), Some(latitude), Some(longitude), Some(user_name)) = required else {
        return Err(ApiError::bad_request(
            "label, latitude, longitude, and userName are required",
        ));
    };
    let language = Language::from_tag_opt(req.local_lang.as_deref());
    log::info!(
        "complaint generation: label={}, location={}, {}, language={}",
        label,
        latitude,
        longitude,
        language
    );

    let prompt = prompts::complaint_prompt(&ComplaintPrompt {
        label,
        latitude: &latitude,
        longitude: &longitude,
        user_name,
        user_details: non_empty(req.user_details.as_deref()),
        place_name: non_empty(req.place_name.as_deref()),
    });
    let image = req.image_base64.as_deref().and_then(InlineImage::from_client);

    let english = state
        .generator
        .generate(&prompt, image.as_ref())
        .await
        .map_err(|e| {
            log::error!("complaint generation failed: {}", e);
            ApiError::internal_with("Failed to generate complaint", e)
        })?;

    let local = if language == Language::English {
        english.clone()
    } else {
        let prompt = prompts::translation_prompt(&english, language);
        state.generator.generate(&prompt, None).await.map_err(|e| {
            log::error!("complaint translation to {} failed: {}", language, e);
            ApiError::internal_with("Failed to generate complaint", e)
        })?
    };

    Ok(Json(GenerateResponse {
        english_complaint: english,
        local_complaint: local,
        label: label.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub prediction: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub complaint_prompt: Option<String>,
    #[serde(default)]
    pub local_lang: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub place_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub ai_text: String,
}

/// Free-form client values (a label string, a prediction object, a
/// `{lat, lng}` pair) as prompt text.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => non_empty(Some(s.as_str())).map(str::to_string),
        Value::Object(map) => match map.get("label").and_then(Value::as_str) {
            Some(label) => Some(label.to_string()),
            None if map.is_empty() => None,
            None => Some(value.to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// Handler for `POST /api/chat-help`
pub async fn chat_help(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let messages = match req.messages.as_ref().and_then(Value::as_array) {
        Some(messages) if !messages.is_empty() => messages,
        _ => return Err(ApiError::bad_request("messages array is required")),
    };
    let transcript: Vec<ChatMessage<'_>> = messages
        .iter()
        .map(|message| ChatMessage {
            from_user: message["role"].as_str() == Some("user"),
            content: message["content"].as_str().unwrap_or_default(),
        })
        .collect();

    let prediction = req.prediction.as_ref().and_then(value_text);
    let location = req.location.as_ref().and_then(value_text);
    let context = ChatContext {
        user_name: non_empty(req.user_name.as_deref()),
        place_name: non_empty(req.place_name.as_deref()),
        prediction: prediction.as_deref(),
        location: location.as_deref(),
        complaint: non_empty(req.complaint_prompt.as_deref()),
        language: req.local_lang.as_deref().map(Language::from_tag),
    };
    let prompt = prompts::chat_prompt(&context, &transcript);
    let image = req.image_base64.as_deref().and_then(InlineImage::from_client);
    log::info!(
        "chat help: {} message(s), image={}",
        transcript.len(),
        image.is_some()
    );

    let ai_text = state
        .generator
        .generate(&prompt, image.as_ref())
        .await
        .map_err(|e| {
            log::error!("chat help failed: {}", e);
            ApiError::internal_with("Failed to get AI help response", e)
        })?;

    Ok(Json(ChatResponse { ai_text }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coordinates_accept_numbers_and_strings() {
        let req: GenerateRequest =
            serde_json::from_value(json!({ "latitude": 17.5, "longitude": " 78.4 " })).unwrap();
        assert_eq!(req.latitude.unwrap().as_text().as_deref(), Some("17.5"));
        assert_eq!(req.longitude.unwrap().as_text().as_deref(), Some("78.4"));
        assert_eq!(Coordinate::Text("".into()).as_text(), None);
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("pothole")).as_deref(), Some("pothole"));
        assert_eq!(
            value_text(&json!({ "label": "garbage", "confidence": 0.9 })).as_deref(),
            Some("garbage")
        );
        assert_eq!(value_text(&json!({})), None);
        assert_eq!(value_text(&json!("  ")), None);
        assert!(value_text(&json!({ "lat": 1, "lng": 2 })).unwrap().contains("lat"));
    }
}

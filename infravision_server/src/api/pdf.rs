//! `POST /api/complaint-pdf`: render a complaint letter to PDF.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

use complaint_pdf_rust::Language;

use crate::error::{ApiError, ApiResult};
use crate::gemini::InlineImage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfRequest {
    #[serde(default)]
    pub complaint_text: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

/// Decode the client's photo. Undecodable data is dropped like an
/// undecodable image.
fn decode_photo(value: &str) -> Option<Vec<u8>> {
    let image = InlineImage::from_client(value)?;
    match STANDARD.decode(image.data_base64.as_bytes()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("ignoring complaint image: invalid base64: {}", e);
            None
        }
    }
}

pub async fn complaint_pdf(
    State(state): State<AppState>,
    payload: Result<Json<PdfRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let text = req
        .complaint_text
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::bad_request("complaintText is required"))?;
    let image = req.image_base64.as_deref().and_then(decode_photo);
    let language = req.language.unwrap_or_default();

    log::info!(
        "complaint PDF requested: language={}, {} chars, image={}",
        language,
        text.len(),
        image.is_some()
    );

    let renderer = state.renderer.clone();
    let rendered =
        tokio::task::spawn_blocking(move || renderer.render(&text, image.as_deref(), language))
            .await;

    let bytes = match rendered {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) if e.is_validation() => {
            return Err(ApiError::bad_request("complaintText is required"));
        }
        Ok(Err(e)) => {
            log::error!("PDF generation failed: {}", e);
            return Err(ApiError::internal("Failed to generate PDF"));
        }
        Err(e) => {
            log::error!("PDF render task failed: {}", e);
            return Err(ApiError::internal("Failed to generate PDF"));
        }
    };

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"complaint.pdf\"".to_string(),
        ),
        (header::CONTENT_LENGTH, bytes.len().to_string()),
    ];
    Ok((headers, bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_photo_variants() {
        assert_eq!(decode_photo("aGVsbG8="), Some(b"hello".to_vec()));
        assert_eq!(
            decode_photo("data:image/png;base64,aGVs\nbG8="),
            Some(b"hello".to_vec())
        );
        assert_eq!(decode_photo("not base64!!"), None);
        assert_eq!(decode_photo(""), None);
    }

    #[test]
    fn test_language_defaults_and_is_lenient() {
        let req: PdfRequest = serde_json::from_str(r#"{"complaintText":"x"}"#).unwrap();
        assert_eq!(req.language, None);
        let req: PdfRequest =
            serde_json::from_str(r#"{"complaintText":"x","language":"fr"}"#).unwrap();
        assert_eq!(req.language, Some(Language::English));
    }
}

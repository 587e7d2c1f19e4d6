//! OCR upload endpoints.
//!
//! All three handlers accept the same multipart form — a `file` image field
//! and a natural-language `operation` field — run it through the OCR model,
//! and differ only in how the response text is post-processed.

use std::io::Cursor;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use tracing::{info, warn};

use refscope_annotate::{parse, render, strip_tags};
use refscope_core::{Detection, RefscopeError};

use crate::server::GatewayState;

struct OcrUpload {
    image: DynamicImage,
    operation: String,
}

/// Pull the `file` and `operation` fields out of the multipart form and
/// decode the image. Unknown fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<OcrUpload, RefscopeError> {
    let mut file: Option<Vec<u8>> = None;
    let mut operation: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RefscopeError::InvalidUpload(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let content_type = field.content_type().unwrap_or("").to_string();
                if !content_type.starts_with("image/") {
                    return Err(RefscopeError::InvalidUpload("file must be an image".into()));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| RefscopeError::InvalidUpload(e.to_string()))?;
                file = Some(data.to_vec());
            }
            Some("operation") => {
                operation = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| RefscopeError::InvalidUpload(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let data = file.ok_or_else(|| RefscopeError::InvalidUpload("file field is required".into()))?;
    let operation = operation
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .ok_or_else(|| RefscopeError::InvalidUpload("operation is required".into()))?;
    let image =
        image::load_from_memory(&data).map_err(|e| RefscopeError::ImageDecode(e.to_string()))?;

    Ok(OcrUpload { image, operation })
}

/// Re-encode the upload as PNG and run the instruction against the model,
/// returning the raw response text with grounding tags intact.
async fn model_response(state: &GatewayState, upload: &OcrUpload) -> Result<String, RefscopeError> {
    let png = encode_png(&upload.image)?;
    state
        .model
        .transcribe(&png, &upload.operation)
        .await
        .map_err(|e| RefscopeError::ModelError {
            model: state.model.name().to_string(),
            message: e.to_string(),
        })
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, RefscopeError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| RefscopeError::Other(anyhow::anyhow!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

fn error_response(err: RefscopeError) -> Response {
    let status = match &err {
        RefscopeError::InvalidUpload(_) | RefscopeError::ImageDecode(_) => StatusCode::BAD_REQUEST,
        RefscopeError::ModelError { .. } => StatusCode::BAD_GATEWAY,
        RefscopeError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(%err, "OCR request failed");
    (status, err.to_string()).into_response()
}

/// Handler for `POST /api/ocr` — plain transcription, tags stripped.
pub async fn run_ocr(State(state): State<GatewayState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return error_response(e),
    };
    match model_response(&state, &upload).await {
        Ok(text) => strip_tags(&text).into_response(),
        Err(e) => error_response(e),
    }
}

/// Handler for `POST /api/ocr/annotate` — annotated PNG when the response
/// carries detections, plain text otherwise. Clients tell the two outcomes
/// apart by Content-Type.
pub async fn run_annotate(State(state): State<GatewayState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return error_response(e),
    };
    let text = match model_response(&state, &upload).await {
        Ok(text) => text,
        Err(e) => return error_response(e),
    };

    let detections = parse(&text);
    if detections.is_empty() {
        info!("no detections in model response");
        return strip_tags(&text).into_response();
    }

    info!(count = detections.len(), "annotating upload");
    let annotated = render(&upload.image, &detections);
    match encode_png(&annotated) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Serialize)]
pub struct DetectionsResponse {
    pub text: String,
    pub detections: Vec<Detection>,
}

/// Handler for `POST /api/ocr/detections` — stripped text plus the parsed
/// detections as JSON, for clients that render boxes themselves.
pub async fn run_detections(State(state): State<GatewayState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return error_response(e),
    };
    match model_response(&state, &upload).await {
        Ok(text) => {
            let detections = parse(&text);
            Json(DetectionsResponse {
                text: strip_tags(&text),
                detections,
            })
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_errors_map_to_bad_request() {
        let response = error_response(RefscopeError::InvalidUpload("file must be an image".into()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = error_response(RefscopeError::ImageDecode("truncated".into()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn model_errors_map_to_bad_gateway() {
        let response = error_response(RefscopeError::ModelError {
            model: "ollama".into(),
            message: "connection refused".into(),
        });
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn png_round_trips_through_the_image_crate() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));
        let png = encode_png(&image).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn detections_response_serializes_flat_coordinates() {
        let body = DetectionsResponse {
            text: "cat".into(),
            detections: vec![Detection::new("cat", 100, 100, 300, 300)],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["detections"][0]["name"], "cat");
        assert_eq!(json["detections"][0]["x2"], 300);
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use refscope_core::OcrModel;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "deepseek-ocr";

/// Ollama-hosted vision OCR model.
pub struct OllamaOcr {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaOcr {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for OllamaOcr {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
    /// Base64-encoded image payloads; Ollama's multimodal message shape.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[async_trait]
impl OcrModel for OllamaOcr {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn transcribe(&self, image_png: &[u8], instruction: &str) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: instruction.to_string(),
                images: vec![STANDARD.encode(image_png)],
            }],
            stream: false,
        };

        debug!(model = %self.model, image_bytes = image_png.len(), "sending OCR request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("failed to parse Ollama response")?;

        Ok(chat_response.message.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let ocr = OllamaOcr::new()
            .with_base_url("http://ollama.internal:11434")
            .with_model("deepseek-ocr:latest");
        assert_eq!(ocr.base_url, "http://ollama.internal:11434");
        assert_eq!(ocr.model, "deepseek-ocr:latest");
    }

    #[test]
    fn request_body_carries_the_image_inline() {
        let body = ChatRequest {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Find all text".to_string(),
                images: vec![STANDARD.encode(b"png-bytes")],
            }],
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "deepseek-ocr");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["images"][0], STANDARD.encode(b"png-bytes"));
    }

    #[test]
    fn text_only_message_omits_the_images_field() {
        let message = ChatMessage {
            role: "assistant".to_string(),
            content: "done".to_string(),
            images: Vec::new(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("images").is_none());
    }
}

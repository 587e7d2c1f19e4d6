use anyhow::Result;
use async_trait::async_trait;

/// Trait for vision-language OCR backends.
///
/// The gateway hands the backend a PNG-encoded image and a natural-language
/// instruction and gets back the model's complete response text, grounding
/// tags included. The response is treated as an opaque string; extracting
/// detections from it is the annotate crate's job.
#[async_trait]
pub trait OcrModel: Send + Sync {
    /// Backend name for logs and error messages (e.g. "ollama").
    fn name(&self) -> &str;

    /// Run the instruction against the image and return the raw response text.
    async fn transcribe(&self, image_png: &[u8], instruction: &str) -> Result<String>;
}

//! Vision-language OCR backends.
//!
//! Currently a single backend: DeepSeek-OCR served by a local Ollama
//! instance, reached through its multimodal `/api/chat` endpoint.

pub mod ollama;

pub use ollama::OllamaOcr;

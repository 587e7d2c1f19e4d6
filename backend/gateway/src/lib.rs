//! HTTP gateway for the RefScope service.
//!
//! Thin axum layer over the annotate engine and the OCR backend: one upload
//! endpoint in three flavors (plain text, annotated PNG, JSON detections)
//! plus a small embedded upload UI.

pub mod ocr_api;
pub mod server;
pub mod web_ui;

pub use server::{router, start_server, GatewayState};

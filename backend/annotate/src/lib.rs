//! Detection-annotation engine.
//!
//! Turns the grounding tags embedded in a vision model's free-form response
//! into typed [`Detection`]s (`parser`) and draws them back onto the source
//! image as labeled bounding boxes (`render`). Both halves are pure
//! synchronous functions with no shared state, so concurrent requests need
//! no coordination.
//!
//! [`Detection`]: refscope_core::Detection

pub mod font;
pub mod parser;
pub mod render;

pub use font::LabelFont;
pub use parser::{parse, strip_tags};
pub use render::render;

use serde::{Deserialize, Serialize};

/// A labeled rectangle extracted from vision-model output, identifying a
/// region of interest in the source image.
///
/// Coordinates are kept exactly as the model reported them: non-negative
/// integers in an unknown coordinate system (absolute pixels or a 0–999
/// normalized grid), with no guarantee that `x1 <= x2` or `y1 <= y2`.
/// Disambiguation and ordering happen at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Free-form label from the model. Not unique; may be empty.
    pub name: String,
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Detection {
    pub fn new(name: impl Into<String>, x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            name: name.into(),
            x1,
            y1,
            x2,
            y2,
        }
    }
}

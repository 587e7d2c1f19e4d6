use thiserror::Error;

/// Top-level error type for the RefScope service.
///
/// Detection parsing and annotation rendering never fail and so contribute
/// no variants here; everything below originates in the HTTP layer or the
/// upstream model call.
#[derive(Debug, Error)]
pub enum RefscopeError {
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("could not decode image: {0}")]
    ImageDecode(String),

    #[error("OCR model error ({model}): {message}")]
    ModelError { model: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

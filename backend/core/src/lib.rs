pub mod error;
pub mod traits;
pub mod types;

pub use error::RefscopeError;
pub use traits::OcrModel;
pub use types::Detection;

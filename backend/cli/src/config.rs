use serde::Deserialize;

/// RefScope runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Ollama base URL
    pub ollama_base_url: String,
    /// OCR model name as known to Ollama
    pub model: String,
    /// Log level
    pub log_level: String,
    /// Directory for NDJSON log files; console-only when unset
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            ollama_base_url: refscope_vision::ollama::DEFAULT_BASE_URL.to_string(),
            model: refscope_vision::ollama::DEFAULT_MODEL.to_string(),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: std::env::var("REFSCOPE_BIND").unwrap_or(defaults.bind_address),
            port: std::env::var("REFSCOPE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            model: std::env::var("REFSCOPE_MODEL").unwrap_or(defaults.model),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_dir: std::env::var("REFSCOPE_LOG_DIR").ok(),
        }
    }
}

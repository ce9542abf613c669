use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error on page {page}: {message}")]
    Network { page: u32, message: String },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("State store error: {0}")]
    Store(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl ScraperError {
    pub fn network(page: u32, message: impl Into<String>) -> Self {
        ScraperError::Network {
            page,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;

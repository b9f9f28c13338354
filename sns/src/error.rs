use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to encode query: {0}")]
    Build(#[source] serde_json::Error),

    #[error("Search transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed search response: {0}")]
    Envelope(String),

    #[error("Search engine rejected query (status {status})")]
    Engine { status: u16 },

    #[error("Failed to decode {record}: field '{field}' missing or not {expected}")]
    Decode {
        record: &'static str,
        field: String,
        expected: &'static str,
    },

    #[error("Failed to decode {record}: unparseable timestamp '{value}'")]
    Timestamp { record: &'static str, value: String },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Transport(_) | Self::Envelope(_) => "transport",
            Self::Engine { .. } => "engine",
            Self::Decode { .. } | Self::Timestamp { .. } => "decode",
            Self::InvalidDateRange { .. } => "invalid_range",
            Self::Database(_) => "database",
            Self::Url(_) | Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

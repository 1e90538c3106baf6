pub mod config;
pub mod messages;
pub mod responder;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ChatterError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Speech error: {0}")]
    SpeechError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ChatterError {
    fn from(e: std::io::Error) -> Self {
        ChatterError::IOError(e.to_string())
    }
}

impl ChatterError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Bad config needs the user to edit the file
            ChatterError::ConfigError(_) => false,
            // Speech falls back to text-only display
            ChatterError::SpeechError(_) => true,
            ChatterError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ChatterError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ChatterError::SpeechError(_) => {
                "Speech playback is unavailable. Replies will be shown as text.".to_string()
            }
            ChatterError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatterError>;

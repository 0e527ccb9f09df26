pub mod audio;
pub mod catalog;
pub mod integration;
pub mod notice;
pub mod practice;
pub mod recordings;
pub mod speech;
pub mod storage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod ui;
pub mod utils;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MockerviewError {
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("The question catalog is empty")]
    EmptyCatalog,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unsupported on this system: {0}")]
    Unsupported(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("TTS error: {0}")]
    TTSError(String),

    #[error("Encode error: {0}")]
    EncodeError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for MockerviewError {
    fn from(e: std::io::Error) -> Self {
        MockerviewError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for MockerviewError {
    fn from(e: serde_json::Error) -> Self {
        MockerviewError::StorageError(e.to_string())
    }
}

impl From<hound::Error> for MockerviewError {
    fn from(e: hound::Error) -> Self {
        MockerviewError::EncodeError(e.to_string())
    }
}

impl From<base64::DecodeError> for MockerviewError {
    fn from(e: base64::DecodeError) -> Self {
        MockerviewError::EncodeError(e.to_string())
    }
}

impl MockerviewError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Validation problems are fixed by the user on the spot
            MockerviewError::EmptyInput(_) => true,
            MockerviewError::EmptyCatalog => true,
            // The user may grant access and try again
            MockerviewError::PermissionDenied(_) => true,
            // The feature stays off, the rest of the app keeps working
            MockerviewError::Unsupported(_) => true,
            MockerviewError::AudioDeviceError(_) => true,
            MockerviewError::TTSError(_) => true,
            MockerviewError::EncodeError(_) => true,
            MockerviewError::StorageError(_) => true,
            MockerviewError::IOError(_) => true,
            // Bad configuration is only detected at startup
            MockerviewError::ConfigError(_) => false,
            MockerviewError::ChannelError(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            MockerviewError::EmptyInput(_) => "Please enter some text first.".to_string(),
            MockerviewError::EmptyCatalog => {
                "There are no questions yet. Add a question first.".to_string()
            }
            MockerviewError::PermissionDenied(_) => {
                "Microphone access failed. Please check your permissions.".to_string()
            }
            MockerviewError::Unsupported(what) => {
                format!("{} is not supported on this system.", what)
            }
            MockerviewError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            MockerviewError::TTSError(_) => {
                "The question could not be read aloud.".to_string()
            }
            MockerviewError::EncodeError(_) => {
                "The recording could not be encoded.".to_string()
            }
            MockerviewError::StorageError(_) => {
                "Saved data could not be read or written.".to_string()
            }
            MockerviewError::IOError(_) => "File system error occurred.".to_string(),
            MockerviewError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            MockerviewError::ChannelError(_) => {
                "Internal communication error. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MockerviewError>;

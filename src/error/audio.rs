// Audio file error types and constants

use crate::error::ErrorCode;
use std::fmt;
use tracing::error;

/// Audio error code constants
///
/// Error code range: 1001-1004
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Audio file could not be opened or created
    pub const FILE_OPEN_FAILED: i32 = 1001;

    /// Sample format, bit depth or channel layout is not supported
    pub const UNSUPPORTED_FORMAT: i32 = 1002;

    /// Reading samples failed part way through the file
    pub const DECODE_FAILED: i32 = 1003;

    /// Writing samples failed
    pub const ENCODE_FAILED: i32 = 1004;
}

/// Log an audio error with structured context
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioIo, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio file I/O errors
///
/// Error code range: 1001-1004
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Failed to open or create an audio file
    FileOpen { path: String, reason: String },

    /// Format not supported by the loader
    UnsupportedFormat { reason: String },

    /// Failed while reading samples
    Decode { reason: String },

    /// Failed while writing samples
    Encode { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::FileOpen { .. } => AudioErrorCodes::FILE_OPEN_FAILED,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::Decode { .. } => AudioErrorCodes::DECODE_FAILED,
            AudioError::Encode { .. } => AudioErrorCodes::ENCODE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::FileOpen { path, reason } => {
                format!("Failed to open {}: {}", path, reason)
            }
            AudioError::UnsupportedFormat { reason } => {
                format!("Unsupported audio format: {}", reason)
            }
            AudioError::Decode { reason } => format!("Failed to decode audio: {}", reason),
            AudioError::Encode { reason } => format!("Failed to encode audio: {}", reason),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::FileOpen {
                path: "a.wav".to_string(),
                reason: "missing".to_string()
            }
            .code(),
            1001
        );
        assert_eq!(
            AudioError::UnsupportedFormat {
                reason: "8-bit".to_string()
            }
            .code(),
            1002
        );
        assert_eq!(
            AudioError::Decode {
                reason: "eof".to_string()
            }
            .code(),
            1003
        );
        assert_eq!(
            AudioError::Encode {
                reason: "disk full".to_string()
            }
            .code(),
            1004
        );
    }

    #[test]
    fn test_audio_error_messages() {
        let err = AudioError::FileOpen {
            path: "take1.wav".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.message(), "Failed to open take1.wav: not found");

        let display = format!("{}", err);
        assert!(display.contains("AudioError"));
        assert!(display.contains("1001"));
    }
}

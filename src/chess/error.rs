use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of the reader, the writer and the input layer.
///
/// Benign degradations (an unparseable header absorbed into movetext) are not
/// errors; they surface as `RecordOutcome::Recovered` and in
/// `GameRecord::parse_notes`.
#[derive(Debug, Error)]
pub enum PgnError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Line {line} is {len} bytes long (maximum {max}); input is malformed")]
    LineTooLong { line: u64, len: usize, max: usize },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid compression value '{0}'. Supported values: 'zstd' or omitted.")]
    InvalidCompression(String),

    #[error("Invalid path pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to replace '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PgnError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorAccumulator, PgnError};

    #[test]
    fn test_push_single_message() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first error");

        assert_eq!(accumulator.take().as_deref(), Some("first error"));
    }

    #[test]
    fn test_push_multiple_messages_uses_separator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first");
        accumulator.push("second");

        assert_eq!(accumulator.take().as_deref(), Some("first; second"));
    }

    #[test]
    fn test_take_consumes_accumulator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("error");

        assert_eq!(accumulator.take().as_deref(), Some("error"));
        assert!(accumulator.is_empty());
        assert!(accumulator.take().is_none());
    }

    #[test]
    fn test_line_too_long_message_names_line_and_limit() {
        let err = PgnError::LineTooLong {
            line: 7,
            len: 2048,
            max: 1024,
        };
        let message = err.to_string();
        assert!(message.contains("Line 7"));
        assert!(message.contains("maximum 1024"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_is_reported() {
        assert!(PgnError::Cancelled.is_cancelled());
    }
}

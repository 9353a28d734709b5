//! Chunk-Load Error Detection
//!
//! Window errors and unhandled rejections are matched against a list of
//! message patterns. Matching is case-insensitive and unanchored: a pattern
//! matches when it occurs anywhere in the message. `*` stands for any run of
//! characters, so `loading chunk * failed` matches
//! `ChunkLoadError: Loading chunk 3 failed.`

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::RecoveryConfig;

/// An error the page reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSignal {
    /// Uncaught error event
    WindowError { message: String },
    /// Promise rejected with no handler
    UnhandledRejection { reason: String },
}

impl ErrorSignal {
    /// Window error with `message`
    pub fn window_error(message: impl Into<String>) -> Self {
        Self::WindowError {
            message: message.into(),
        }
    }

    /// Unhandled rejection with `reason`
    pub fn rejection(reason: impl Into<String>) -> Self {
        Self::UnhandledRejection {
            reason: reason.into(),
        }
    }

    /// Text the patterns are matched against
    pub fn text(&self) -> &str {
        match self {
            Self::WindowError { message } => message,
            Self::UnhandledRejection { reason } => reason,
        }
    }
}

/// Recognises chunk-load failures
#[derive(Debug, Clone)]
pub struct ChunkErrorDetector {
    /// Lowercased patterns, each split on `*`
    patterns: Vec<Vec<String>>,
}

impl ChunkErrorDetector {
    /// Build from a pattern list
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| {
                    p.as_ref()
                        .to_lowercase()
                        .split('*')
                        .filter(|piece| !piece.is_empty())
                        .map(String::from)
                        .collect()
                })
                .filter(|pieces: &Vec<String>| !pieces.is_empty())
                .collect(),
        }
    }

    /// Build from the configured patterns
    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self::new(&config.chunk_error_patterns)
    }

    /// Whether `message` looks like a chunk-load failure
    pub fn is_chunk_error(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.patterns
            .iter()
            .any(|pieces| matches_in_order(&message, pieces))
    }

    /// Whether the signal should trigger recovery
    pub fn matches(&self, signal: &ErrorSignal) -> bool {
        self.is_chunk_error(signal.text())
    }
}

/// Every piece occurs in `text`, in order, without overlapping.
fn matches_in_order(text: &str, pieces: &[String]) -> bool {
    let mut rest = text;
    for piece in pieces {
        match rest.find(piece.as_str()) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }
    true
}

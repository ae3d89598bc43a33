//! Sandbox wire protocol
//!
//! The worker writes exactly one JSON object to stdout:
//! `{"success":true,"text":"..."}` on success or `{"error":"message"}` on
//! failure. The parent scans captured output from the last line backwards
//! for the first line that parses, which keeps the protocol robust against
//! residual noise a third-party dependency may have slipped past the
//! worker's suppression.

use serde::{Deserialize, Serialize};

/// The single reply a worker process emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerReply {
    /// Extraction succeeded
    Success {
        /// Always `true` in a success reply
        success: bool,
        /// Concatenated visible text, page breaks preserved as newlines
        text: String,
    },

    /// Extraction failed
    Failure {
        /// The underlying parser's message
        error: String,
    },
}

impl WorkerReply {
    /// Build a success reply
    pub fn success(text: String) -> Self {
        WorkerReply::Success {
            success: true,
            text,
        }
    }

    /// Build a failure reply
    pub fn failure(message: impl Into<String>) -> Self {
        WorkerReply::Failure {
            error: message.into(),
        }
    }

    /// Serialize to the single protocol line (no trailing newline)
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"serialization failed"}"#.into())
    }
}

/// Find the protocol reply in captured worker output
///
/// Scans lines from the end; returns the first line that parses as a
/// reply, or `None` when no line does.
pub fn find_reply(output: &str) -> Option<WorkerReply> {
    output
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find_map(|line| serde_json::from_str(line).ok())
}

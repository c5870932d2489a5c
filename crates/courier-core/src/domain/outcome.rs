//! Outcome model: the result of one external action attempt.
//!
//! The core only cares whether an attempt succeeded. Everything else
//! (status code, response excerpt, transport error) is diagnostic detail for
//! logs and the status page.

use serde::{Deserialize, Serialize};

/// Maximum number of characters kept from a response body or error text.
pub const DETAIL_LIMIT: usize = 120;

/// Success / failure classification of an attempt.
///
/// Serialized as SUCCESS / FAILURE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// Result of one external action invocation.
///
/// A failure here is never an error of the task itself; the worker counts it
/// and moves on to the next credential/payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub kind: OutcomeKind,

    /// Protocol-level status reported by the destination, if one was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Short diagnostic (response excerpt or transport error).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl AttemptOutcome {
    pub fn success(status_code: Option<u16>) -> Self {
        Self {
            kind: OutcomeKind::Success,
            status_code,
            detail: String::new(),
        }
    }

    pub fn failure(status_code: Option<u16>, detail: impl AsRef<str>) -> Self {
        Self {
            kind: OutcomeKind::Failure,
            status_code,
            detail: truncate(detail.as_ref(), DETAIL_LIMIT),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }

    /// One-line summary, e.g. `FAILURE (401): invalid token`.
    pub fn summary(&self) -> String {
        let kind = match self.kind {
            OutcomeKind::Success => "SUCCESS",
            OutcomeKind::Failure => "FAILURE",
        };
        let mut out = kind.to_string();
        if let Some(code) = self.status_code {
            out.push_str(&format!(" ({code})"));
        }
        if !self.detail.is_empty() {
            out.push_str(": ");
            out.push_str(&self.detail);
        }
        out
    }
}

/// Truncate on a char boundary, appending `...` when something was cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_kind_serializes_as_required_names() {
        let s = serde_json::to_string(&OutcomeKind::Success).unwrap();
        assert_eq!(s, "\"SUCCESS\"");

        let s = serde_json::to_string(&OutcomeKind::Failure).unwrap();
        assert_eq!(s, "\"FAILURE\"");
    }

    #[test]
    fn failure_detail_is_truncated() {
        let long = "x".repeat(DETAIL_LIMIT + 50);
        let o = AttemptOutcome::failure(Some(500), &long);
        assert_eq!(o.detail.chars().count(), DETAIL_LIMIT + 3);
        assert!(o.detail.ends_with("..."));
        assert!(!o.is_success());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn summary_includes_code_and_detail() {
        assert_eq!(AttemptOutcome::success(Some(200)).summary(), "SUCCESS (200)");
        assert_eq!(
            AttemptOutcome::failure(None, "connection refused").summary(),
            "FAILURE: connection refused"
        );
    }
}

//! Input specs: the raw start request and the validated `TaskSpec`.
//!
//! `StartRequest` carries what the caller typed (everything optional, strings
//! unparsed). `StartRequest::validate` is the only way to obtain a `TaskSpec`,
//! so a spec always has at least one credential and one payload.

use std::fmt;
use std::time::Duration;

use super::errors::{FieldError, ValidationError};

/// Separator placed between the display label and each payload.
pub const LABEL_SEPARATOR: &str = " | ";

/// How credentials were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// One credential typed directly.
    Single,
    /// A newline-delimited list (usually an uploaded file).
    Multiple,
}

impl CredentialMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "single" => Some(CredentialMode::Single),
            "multiple" => Some(CredentialMode::Multiple),
            _ => None,
        }
    }
}

/// Unvalidated start request.
#[derive(Clone, Default)]
pub struct StartRequest {
    pub credential_mode: Option<String>,
    pub single_credential: Option<String>,
    pub credential_list: Option<String>,
    pub target: Option<String>,
    pub label: Option<String>,
    pub interval_secs: Option<String>,
    pub payload_list: Option<String>,
    pub max_cycles: Option<String>,
}

impl fmt::Debug for StartRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartRequest")
            .field("credential_mode", &self.credential_mode)
            .field("single_credential", &self.single_credential.as_ref().map(|_| "<redacted>"))
            .field("credential_list", &self.credential_list.as_ref().map(|_| "<redacted>"))
            .field("target", &self.target)
            .field("label", &self.label)
            .field("interval_secs", &self.interval_secs)
            .field("payload_list", &self.payload_list.as_ref().map(|p| p.len()))
            .field("max_cycles", &self.max_cycles)
            .finish()
    }
}

impl StartRequest {
    /// Check every field and build a `TaskSpec`, or report all problems at once.
    pub fn validate(&self) -> Result<TaskSpec, ValidationError> {
        let mut errors = Vec::new();

        let credentials = self.validate_credentials(&mut errors);

        let target = non_blank(self.target.as_deref());
        if target.is_none() {
            errors.push(FieldError::new("target", "target identifier is required"));
        }

        let label = non_blank(self.label.as_deref());
        if label.is_none() {
            errors.push(FieldError::new("label", "display label is required"));
        }

        let interval = match self.interval_secs.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::new("interval", "interval is required"));
                None
            }
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(secs),
                _ => {
                    errors.push(FieldError::new(
                        "interval",
                        format!("interval must be a positive whole number of seconds, got '{raw}'"),
                    ));
                    None
                }
            },
        };

        let payloads = match self.payload_list.as_deref() {
            None => {
                errors.push(FieldError::new("payloads", "payload list is required"));
                None
            }
            Some(text) => {
                let lines = split_lines(text);
                if lines.is_empty() {
                    errors.push(FieldError::new("payloads", "payload list is empty"));
                    None
                } else {
                    Some(lines)
                }
            }
        };

        let max_cycles = match self.max_cycles.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    errors.push(FieldError::new(
                        "cycles",
                        format!("cycles must be a positive whole number, got '{raw}'"),
                    ));
                    None
                }
            },
        };

        if let Some(err) = ValidationError::from_fields(errors) {
            return Err(err);
        }

        // errors が空なら全フィールドが Some
        match (credentials, target, label, interval, payloads) {
            (Some(credentials), Some(target), Some(label), Some(interval), Some(payloads)) => {
                Ok(TaskSpec {
                    target,
                    label,
                    credentials,
                    payloads,
                    interval: Duration::from_secs(interval),
                    max_cycles,
                })
            }
            _ => Err(ValidationError::single("request", "incomplete start request")),
        }
    }

    fn validate_credentials(&self, errors: &mut Vec<FieldError>) -> Option<Vec<String>> {
        let mode = match self.credential_mode.as_deref() {
            None => {
                errors.push(FieldError::new(
                    "credential_mode",
                    "credential mode is required ('single' or 'multiple')",
                ));
                return None;
            }
            Some(raw) => match CredentialMode::parse(raw) {
                Some(mode) => mode,
                None => {
                    errors.push(FieldError::new(
                        "credential_mode",
                        format!("unknown credential mode '{}'", raw.trim()),
                    ));
                    return None;
                }
            },
        };

        let credentials = match mode {
            CredentialMode::Single => match non_blank(self.single_credential.as_deref()) {
                Some(token) => vec![token],
                None => {
                    errors.push(FieldError::new("credentials", "a single credential is required"));
                    return None;
                }
            },
            CredentialMode::Multiple => match self.credential_list.as_deref() {
                Some(text) => split_lines(text),
                None => {
                    errors.push(FieldError::new("credentials", "credential list is required"));
                    return None;
                }
            },
        };

        if credentials.is_empty() {
            errors.push(FieldError::new("credentials", "no usable credentials provided"));
            return None;
        }
        Some(credentials)
    }
}

/// A validated, immutable task configuration.
///
/// Shared with the worker behind an `Arc`; never mutated after start.
#[derive(Clone, PartialEq, Eq)]
pub struct TaskSpec {
    /// Destination of the external action.
    pub target: String,

    /// Prefixed onto every payload.
    pub label: String,

    /// Ordered, non-empty.
    pub credentials: Vec<String>,

    /// Ordered, non-empty.
    pub payloads: Vec<String>,

    /// Wait after every attempt.
    pub interval: Duration,

    /// Stop naturally after this many full passes (`None` = until cancelled).
    pub max_cycles: Option<u64>,
}

impl TaskSpec {
    /// `label | payload`
    pub fn compose(&self, payload: &str) -> String {
        format!("{}{}{}", self.label, LABEL_SEPARATOR, payload)
    }

    /// Number of attempts in one full pass.
    pub fn attempts_per_cycle(&self) -> u64 {
        (self.payloads.len() as u64) * (self.credentials.len() as u64)
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("target", &self.target)
            .field("label", &self.label)
            .field("credentials", &format_args!("<{} redacted>", self.credentials.len()))
            .field("payloads", &self.payloads.len())
            .field("interval", &self.interval)
            .field("max_cycles", &self.max_cycles)
            .finish()
    }
}

/// Split newline-delimited text, trimming entries and dropping blank lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

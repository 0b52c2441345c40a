//! Unified error type for the lumen ecosystem
//!
//! Every failure surfaced by a codec, validator or the conversion manager is a
//! [`LumenError`]. The error carries a [`ErrorKind`] tag so callers can tell a
//! malformed file apart from a capability mismatch, plus a machine-readable
//! code, optional key/value context, warnings accumulated before the failure
//! and an optional wrapped cause.
//!
//! # Example
//!
//! ```
//! use lumen_core::{ErrorKind, LumenError, LumenResult};
//!
//! fn parse_count(token: &str) -> LumenResult<usize> {
//!     token.parse::<usize>().map_err(|err| {
//!         LumenError::syntax("ies.count", "expected an integer count")
//!             .with_context("token", token)
//!             .with_cause(err)
//!     })
//! }
//!
//! let err = parse_count("x").unwrap_err();
//! assert_eq!(err.kind, ErrorKind::Syntax);
//! assert!(err.to_string().starts_with("syntax:ies.count"));
//! ```

use serde::Serialize;
use thiserror::Error;

/// Boxed cause carried by a [`LumenError`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Malformed or unparseable file structure
    Syntax,
    /// Structurally valid but physically invalid values
    Semantic,
    /// Record cannot be expressed in the target format, or writing failed
    Conversion,
    /// Environment-level failure; always wraps a cause
    System,
    /// The validation pipeline itself failed
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::Semantic => "semantic",
            ErrorKind::Conversion => "conversion",
            ErrorKind::System => "system",
            ErrorKind::Validation => "validation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorized error raised anywhere in parsing, validation or writing.
#[derive(Error, Debug)]
#[error("{}", render(.kind, .code, .message, .context, .warnings, .cause))]
pub struct LumenError {
    pub kind: ErrorKind,
    /// Machine-readable code, e.g. `ies.candela_count`
    pub code: String,
    pub message: String,
    /// Ordered key/value pairs describing where the failure happened
    pub context: Vec<(String, String)>,
    /// Warnings collected before the failure
    pub warnings: Vec<String>,
    #[source]
    pub cause: Option<BoxedCause>,
}

/// Convenience type alias for Results using LumenError.
pub type LumenResult<T> = Result<T, LumenError>;

impl LumenError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            context: Vec::new(),
            warnings: Vec::new(),
            cause: None,
        }
    }

    pub fn syntax(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, code, message)
    }

    pub fn semantic(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Semantic, code, message)
    }

    pub fn conversion(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conversion, code, message)
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message)
    }

    /// System errors always wrap the underlying cause.
    pub fn system(
        code: impl Into<String>,
        message: impl Into<String>,
        cause: impl Into<BoxedCause>,
    ) -> Self {
        Self::new(ErrorKind::System, code, message).with_cause(cause)
    }

    /// Wrap another error under a new category, keeping it as the cause.
    pub fn wrap(
        kind: ErrorKind,
        code: impl Into<String>,
        message: impl Into<String>,
        cause: impl Into<BoxedCause>,
    ) -> Self {
        Self::new(kind, code, message).with_cause(cause)
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.push((key.into(), value.to_string()));
        self
    }

    pub fn with_warnings<I, S>(mut self, warnings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warnings.extend(warnings.into_iter().map(Into::into));
        self
    }

    pub fn with_cause(mut self, cause: impl Into<BoxedCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Look up a context value by key.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn render(
    kind: &ErrorKind,
    code: &str,
    message: &str,
    context: &[(String, String)],
    warnings: &[String],
    cause: &Option<BoxedCause>,
) -> String {
    let mut out = format!("{}:{} | {}", kind, code, message);
    if !context.is_empty() {
        let pairs: Vec<String> = context.iter().map(|(k, v)| format!("{k}={v}")).collect();
        out.push_str(" | ");
        out.push_str(&pairs.join(", "));
    }
    if !warnings.is_empty() {
        out.push_str(" | warnings: ");
        out.push_str(&warnings.join("; "));
    }
    if let Some(cause) = cause {
        out.push_str(&format!(" | cause: {}", cause));
    }
    out
}

impl From<std::io::Error> for LumenError {
    fn from(err: std::io::Error) -> Self {
        LumenError::system("io", "I/O failure", err)
    }
}

impl From<anyhow::Error> for LumenError {
    fn from(err: anyhow::Error) -> Self {
        let cause: BoxedCause = err.into();
        LumenError::system("external", "external failure", cause)
    }
}

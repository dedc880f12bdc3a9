use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::validate::ValidationError;

/// Failure classes produced while driving the external `ia` CLI.
#[derive(Debug)]
pub enum CliError {
    /// The CLI is missing or did not answer the version probe.
    Unavailable { reason: String },
    Validation(ValidationError),
    Timeout { timeout: Duration, command: String },
    /// Non-zero exit or spawn failure.
    Execution { message: String },
    OutputTooLarge { limit: usize, command: String },
    NotFound { what: String },
    InvalidOutput { message: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(
                f,
                "the Internet Archive CLI (`ia`) is not available ({reason}). \
                 Install it with `pip install internetarchive`, run `ia configure` \
                 to set up credentials, or point IA_MCP_IA_PATH at the `ia` executable"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Timeout { timeout, command } => write!(
                f,
                "command timed out after {}s: {command}",
                timeout.as_secs_f64()
            ),
            Self::Execution { message } => write!(f, "command failed: {message}"),
            Self::OutputTooLarge { limit, command } => {
                write!(f, "output exceeded {limit} bytes: {command}")
            }
            Self::NotFound { what } => write!(f, "not found: {what}"),
            Self::InvalidOutput { message } => write!(f, "unexpected CLI output: {message}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

pub type CliResult<T> = Result<T, CliError>;

/// A failed tool operation, tagged with the operation name.
#[derive(Debug)]
pub struct OperationError {
    pub operation: &'static str,
    pub source: CliError,
}

impl OperationError {
    #[must_use]
    pub const fn new(operation: &'static str, source: CliError) -> Self {
        Self { operation, source }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in {}: {}", self.operation, self.source)
    }
}

impl Error for OperationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_carries_seconds_and_command() {
        let err = CliError::Timeout {
            timeout: Duration::from_secs(30),
            command: "ia search apollo".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("30s"));
        assert!(message.contains("search"));
    }

    #[test]
    fn operation_error_names_operation() {
        let err = OperationError::new(
            "metadata",
            CliError::NotFound {
                what: "item 'x'".to_string(),
            },
        );
        assert_eq!(err.to_string(), "Error in metadata: not found: item 'x'");
    }
}

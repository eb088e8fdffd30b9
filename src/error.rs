//! Error handling and custom error types
//!
//! Provides unified error handling across the cartoonizer using thiserror.

use thiserror::Error;

/// Reason reported when the service answers without any inline image.
pub const NO_IMAGE_REASON: &str = "service returned no image - it might be an unsupported input or content. Please try a different photo.";

/// Reason reported when a failure carries no message of its own.
pub const GENERIC_FAILURE_REASON: &str = "An unexpected error occurred. Please try again.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {}", error_chain(.0))]
    Http(#[from] reqwest::Error),

    /// Malformed image input or transport string, detected locally.
    #[error("{0}")]
    Format(String),

    /// The remote call failed at the transport or service level.
    #[error("{0}")]
    Service(String),

    #[error("{}", NO_IMAGE_REASON)]
    NoImageProduced,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl Error {
    /// User-facing reason for a failed transformation.
    pub fn reason(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE_REASON.to_string()
        } else {
            message
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Message of `err` followed by each distinct cause in its `source()` chain.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = err.to_string();
    let mut last = chain.clone();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !message.is_empty() && message != last {
            chain.push_str(": ");
            chain.push_str(&message);
            last = message;
        }
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_reason_is_message_verbatim() {
        let err = Error::Format("Invalid image data URL format.".to_string());
        assert_eq!(err.reason(), "Invalid image data URL format.");
    }

    #[test]
    fn test_empty_message_falls_back_to_generic_reason() {
        let err = Error::Service(String::new());
        assert_eq!(err.reason(), GENERIC_FAILURE_REASON);
    }

    #[derive(Error, Debug)]
    #[error("error sending request")]
    struct SendFailure(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_causes() {
        let err = SendFailure(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        assert_eq!(error_chain(&err), "error sending request: Connection refused");
    }

    #[test]
    fn test_error_chain_without_source_is_message() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(error_chain(&err), "disk full");
    }

    #[test]
    fn test_no_image_reason() {
        assert!(Error::NoImageProduced
            .reason()
            .starts_with("service returned no image"));
    }
}

//! Error taxonomy shared by the external data clients.

use thiserror::Error;

/// Failure of an external data fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Credential for the service is missing. Raised before any network I/O.
    #[error("{service} API key not provided")]
    Config {
        /// Service whose key is missing.
        service: &'static str,
    },

    /// Network failure or non-2xx HTTP status.
    #[error("{}", transport_message(.status, .reason))]
    Transport {
        /// HTTP status, absent when no response was received.
        status: Option<u16>,
        /// Underlying reason.
        reason: String,
    },

    /// The request was valid but the resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The response body could not be decoded.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The response was well formed but carried no usable content.
    #[error("{0}")]
    DomainEmpty(String),
}

fn transport_message(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("HTTP error status: {code}"),
        None => format!("network error: {reason}"),
    }
}

impl FetchError {
    /// Transport failure for a non-2xx response.
    #[must_use]
    pub fn status(code: u16) -> Self {
        Self::Transport {
            status: Some(code),
            reason: String::new(),
        }
    }

    /// Message suitable for a widget's inline error line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { service } => {
                format!("{service} is not configured. Add an API key to enable it.")
            }
            Self::Transport { .. } => format!("Failed to fetch data ({self}). Please try again."),
            Self::NotFound(msg) | Self::DomainEmpty(msg) => msg.clone(),
            Self::Parse(_) => "Received an unexpected response. Please try again.".to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Transport {
                status: e.status().map(|s| s.as_u16()),
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display() {
        assert_eq!(FetchError::status(503).to_string(), "HTTP error status: 503");
        let offline = FetchError::Transport {
            status: None,
            reason: "connection refused".into(),
        };
        assert_eq!(offline.to_string(), "network error: connection refused");
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let not_found = FetchError::NotFound("City not found.".into()).user_message();
        let transport = FetchError::status(500).user_message();
        assert_eq!(not_found, "City not found.");
        assert_ne!(not_found, transport);
        assert!(transport.contains("500"));
    }
}

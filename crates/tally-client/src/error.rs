//! Typed billing errors.
//!
//! Every remote operation collapses into "payload or `BillingError`" at the
//! envelope-unwrapping step, so call sites never have to inspect the raw
//! success/error envelope themselves.

use std::fmt;

/// Error code reported when an envelope carries neither a payload nor an
/// error.
pub const NO_DATA_CODE: &str = "NO_DATA";

/// Errors that can occur when calling the billing service.
///
/// Three kinds are distinguished:
/// - [`BillingError::Transport`] — the action invoker itself failed
///   (connection, DNS, timeout). Business-level failures never take this
///   form; they arrive in the envelope's error arm.
/// - [`BillingError::Api`] — the envelope's error arm was populated. Carries
///   the provider's error code, message, and optional HTTP status.
/// - [`BillingError::NoData`] — the envelope had neither payload nor error.
#[derive(Debug, Clone)]
pub enum BillingError {
    /// Network-level failure from the action invoker.
    Transport(String),

    /// Business error reported by the billing service.
    Api {
        code: String,
        message: String,
        status: Option<u16>,
    },

    /// The envelope carried neither a payload nor an error.
    NoData,

    /// The payload did not match the expected response shape.
    Deserialization(String),
}

impl BillingError {
    /// Create a transport error from any displayable source.
    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Get the provider error code, if available.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            Self::NoData => Some(NO_DATA_CODE),
            _ => None,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(msg) => msg,
            Self::Api { message, .. } => message,
            Self::NoData => "The operation returned no data",
            Self::Deserialization(msg) => msg,
        }
    }

    /// Get the HTTP status code, if the provider reported one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` if this is a network-level error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is a business error from the provider.
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Returns `true` if this is the empty-envelope error.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "Transport error: {}", msg),
            Self::Api {
                code,
                message,
                status: Some(status),
            } => write!(f, "Billing error [{}] ({}): {}", code, status, message),
            Self::Api { code, message, .. } => {
                write!(f, "Billing error [{}]: {}", code, message)
            }
            Self::NoData => write!(f, "Billing error [{}]: no data returned", NO_DATA_CODE),
            Self::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
        }
    }
}

impl std::error::Error for BillingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_accessors() {
        let err = BillingError::Api {
            code: "FEATURE_NOT_FOUND".into(),
            message: "Feature messages not found".into(),
            status: Some(404),
        };
        assert_eq!(err.code(), Some("FEATURE_NOT_FOUND"));
        assert_eq!(err.status(), Some(404));
        assert!(err.is_api());
        assert!(!err.is_transport());
    }

    #[test]
    fn no_data_code() {
        let err = BillingError::NoData;
        assert_eq!(err.code(), Some(NO_DATA_CODE));
        assert!(err.is_no_data());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn transport_has_no_code() {
        let err = BillingError::transport("connection refused");
        assert_eq!(err.code(), None);
        assert!(err.is_transport());
        assert_eq!(err.message(), "connection refused");
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = BillingError::Api {
            code: "INVALID_PRODUCT".into(),
            message: "Unknown product".into(),
            status: None,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("INVALID_PRODUCT"));
        assert!(msg.contains("Unknown product"));
    }
}

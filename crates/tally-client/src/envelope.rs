//! The wire-level operation envelope and its unwrapping.
//!
//! Every remote billing operation resolves to an [`OperationEnvelope`]:
//! exactly one of a success payload or an error body. [`OperationEnvelope::into_result`]
//! is the single point where that discriminated union collapses into
//! "value or typed failure" for the rest of the SDK.

use serde::{Deserialize, Serialize};

use crate::error::BillingError;

/// Error body carried in the envelope's error arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "statusCode")]
    pub status_code: Option<u16>,
}

/// The canonical remote-call result shape.
///
/// Success payload and error are mutually exclusive; an envelope with
/// neither is itself an error condition and unwraps to
/// [`BillingError::NoData`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationEnvelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> OperationEnvelope<T> {
    /// Build a success envelope.
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// Build an error envelope.
    pub fn failure(error: ApiErrorBody) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    /// Collapse the envelope into a payload or a typed billing error.
    ///
    /// Total and side-effect-free. The error arm wins if both arms are
    /// somehow populated, so a malformed envelope never silently yields a
    /// payload alongside an error.
    pub fn into_result(self) -> Result<T, BillingError> {
        if let Some(err) = self.error {
            return Err(BillingError::Api {
                code: err.code,
                message: err.message,
                status: err.status_code,
            });
        }
        match self.data {
            Some(data) => Ok(data),
            None => Err(BillingError::NoData),
        }
    }
}

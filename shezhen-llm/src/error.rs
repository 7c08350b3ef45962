//! Analysis failure taxonomy.

use shezhen_core::InvalidInput;
use thiserror::Error;

/// Transport or service-level failure underneath a `ServiceFailure`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No API credential was available when the call started.
    #[error("No API credential configured")]
    MissingCredential,

    /// The service answered with a non-success status.
    #[error("Inference service returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// HTTP client failure (connect, TLS, body decode).
    #[error("Inference request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Socket-level failure from a custom [`InferenceTransport`]. The
    /// reqwest-backed `HttpTransport` reports connect errors as `Http`.
    ///
    /// [`InferenceTransport`]: crate::transport::InferenceTransport
    #[error("Inference connection failed: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Authentication rejection: missing key, or 401/403 from the service.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            Self::MissingCredential => true,
            Self::Status { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    /// Quota or rate-limit rejection (429).
    #[must_use]
    pub fn is_quota_rejection(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }
}

/// What exactly was wrong with a textual response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseProblem {
    /// The text was not JSON at all.
    InvalidJson,
    /// JSON, but not the expected shape. `missing` lists absent or null
    /// required fields as dotted paths; it is empty when the problem is a
    /// wrong leaf type instead.
    ShapeMismatch {
        /// Dotted paths such as `diagnosis.explanation`.
        missing: Vec<String>,
    },
}

/// Every way an analysis can fail. Callers always receive one of these four.
#[derive(Debug, Error)]
pub enum AnalysisFailure {
    /// The supplied file is not an image, or is empty. Raised before any
    /// network activity.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The call succeeded at the transport level but carried no text.
    #[error("Inference service returned no text")]
    EmptyResponse,

    /// Text came back but it is not a valid analysis.
    #[error("Malformed analysis response: {detail}")]
    MalformedResponse {
        /// Diagnostic classification.
        problem: ResponseProblem,
        /// Parser or validator message.
        detail: String,
    },

    /// Network failure, non-success status, auth/quota rejection.
    #[error("Inference service failure: {0}")]
    ServiceFailure(#[source] TransportError),
}

/// Fieldless discriminant of [`AnalysisFailure`], for UI state mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    InvalidInput,
    EmptyResponse,
    MalformedResponse,
    ServiceFailure,
}

impl AnalysisFailure {
    /// Which of the four kinds this is.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::EmptyResponse => FailureKind::EmptyResponse,
            Self::MalformedResponse { .. } => FailureKind::MalformedResponse,
            Self::ServiceFailure(_) => FailureKind::ServiceFailure,
        }
    }
}

impl From<TransportError> for AnalysisFailure {
    fn from(err: TransportError) -> Self {
        Self::ServiceFailure(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn auth_rejections_are_classified() {
        assert!(TransportError::MissingCredential.is_auth_rejection());
        assert!(TransportError::Status { status: 403, body: String::new() }.is_auth_rejection());
        assert!(!TransportError::Status { status: 500, body: String::new() }.is_auth_rejection());
        assert!(TransportError::Status { status: 429, body: String::new() }.is_quota_rejection());
    }

    #[test]
    fn service_failure_exposes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let failure = AnalysisFailure::from(TransportError::from(io));
        assert_eq!(failure.kind(), FailureKind::ServiceFailure);
        let source = failure.source().expect("cause attached");
        assert!(source.to_string().contains("refused"));
    }

    #[test]
    fn io_failures_are_neither_auth_nor_quota() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = TransportError::from(io);
        assert!(matches!(err, TransportError::Io(_)));
        assert!(!err.is_auth_rejection());
        assert!(!err.is_quota_rejection());
    }

    #[test]
    fn invalid_input_converts() {
        let failure = AnalysisFailure::from(InvalidInput::Empty);
        assert_eq!(failure.kind(), FailureKind::InvalidInput);
    }
}

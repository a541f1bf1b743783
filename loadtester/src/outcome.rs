use std::fmt;

use rama::http::StatusCode;

/// Result of one attempted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The target answered with `200 OK`.
    Success { status: StatusCode },
    /// The target answered, but with any status other than `200 OK`.
    HttpError { status: StatusCode, body: String },
    /// No valid HTTP response was received
    /// (connect failure, timeout, dns failure, malformed response, ...).
    TransportError { message: String },
}

impl RequestOutcome {
    /// Classify a received status code,
    /// the body is only kept for non-success statuses.
    pub fn from_status(status: StatusCode, body: impl FnOnce() -> String) -> Self {
        if status == StatusCode::OK {
            Self::Success { status }
        } else {
            Self::HttpError {
                status,
                body: body(),
            }
        }
    }

    pub fn transport(message: impl fmt::Display) -> Self {
        Self::TransportError {
            message: message.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The error class and message of a failed outcome,
    /// `None` for a success.
    pub fn error(&self) -> Option<(ErrorClass, &str)> {
        match self {
            Self::Success { .. } => None,
            Self::HttpError { status, body } => Some((ErrorClass::Status(*status), body)),
            Self::TransportError { message } => Some((ErrorClass::Transport, message)),
        }
    }
}

/// Bucket under which failed outcomes are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Status(StatusCode),
    Transport,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "{}", status.as_u16()),
            Self::Transport => f.write_str("transport"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_ok_is_success() {
        let outcome = RequestOutcome::from_status(StatusCode::OK, || unreachable!());
        assert!(outcome.is_success());
        assert_eq!(None, outcome.error());
    }

    #[test]
    fn test_from_status_other_codes_are_http_errors() {
        // only 200 counts, other 2xx included
        for status in [
            StatusCode::CREATED,
            StatusCode::NO_CONTENT,
            StatusCode::FOUND,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let outcome = RequestOutcome::from_status(status, || "oops".to_owned());
            assert!(!outcome.is_success(), "{status}");
            assert_eq!(Some((ErrorClass::Status(status), "oops")), outcome.error());
        }
    }

    #[test]
    fn test_transport_error() {
        let outcome = RequestOutcome::transport("connection refused");
        assert_eq!(
            Some((ErrorClass::Transport, "connection refused")),
            outcome.error()
        );
    }

    #[test]
    fn test_error_class_display() {
        assert_eq!("404", ErrorClass::Status(StatusCode::NOT_FOUND).to_string());
        assert_eq!("transport", ErrorClass::Transport.to_string());
    }
}

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_INTERNAL_ERROR_CODE: i32 = 100;
pub const UNPARSABLE_REQUEST_CODE: i32 = 101;
pub const JSON_PARSING_ERROR_CODE: i32 = 102;
pub const UNREADABLE_UPLOAD_CODE: i32 = 1000;
pub const EMPTY_UPLOAD_CODE: i32 = 1001;

/// Body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureOutcome {
    pub code: i32,
    pub message: String,
}

/// The fixed set of failures a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCodeType {
    UnknownInternalError,
    UnparsableRequest,
    JsonParsingError,
    UnreadableUpload,
    EmptyUpload,
}

impl StatusCodeType {
    pub const fn code(self) -> i32 {
        match self {
            StatusCodeType::UnknownInternalError => UNKNOWN_INTERNAL_ERROR_CODE,
            StatusCodeType::UnparsableRequest => UNPARSABLE_REQUEST_CODE,
            StatusCodeType::JsonParsingError => JSON_PARSING_ERROR_CODE,
            StatusCodeType::UnreadableUpload => UNREADABLE_UPLOAD_CODE,
            StatusCodeType::EmptyUpload => EMPTY_UPLOAD_CODE,
        }
    }

    /// Fixed message, or `None` when the message comes from the failure itself.
    pub const fn message(self) -> Option<&'static str> {
        match self {
            StatusCodeType::UnknownInternalError => Some("unknown internal error"),
            StatusCodeType::UnparsableRequest | StatusCodeType::JsonParsingError => None,
            StatusCodeType::UnreadableUpload => Some("unable to read file upload"),
            StatusCodeType::EmptyUpload => Some("empty file provided"),
        }
    }

    pub const fn http_status(self) -> StatusCode {
        match self {
            StatusCodeType::UnknownInternalError | StatusCodeType::UnreadableUpload => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            StatusCodeType::UnparsableRequest
            | StatusCodeType::JsonParsingError
            | StatusCodeType::EmptyUpload => StatusCode::BAD_REQUEST,
        }
    }

    pub fn outcome(self, detail: Option<String>) -> FailureOutcome {
        let message = match (self.message(), detail) {
            (Some(fixed), _) => fixed.to_owned(),
            (None, Some(detail)) => detail,
            (None, None) => String::new(),
        };

        FailureOutcome {
            code: self.code(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_codes_are_stable() {
        assert_eq!(
            StatusCodeType::EmptyUpload.outcome(None),
            FailureOutcome {
                code: 1001,
                message: "empty file provided".to_owned()
            }
        );
        assert_eq!(
            StatusCodeType::UnreadableUpload.outcome(Some("disk full".to_owned())),
            FailureOutcome {
                code: 1000,
                message: "unable to read file upload".to_owned()
            }
        );
    }

    #[test]
    fn request_errors_carry_detail() {
        let outcome = StatusCodeType::JsonParsingError.outcome(Some("expected value".to_owned()));
        assert_eq!(outcome.code, JSON_PARSING_ERROR_CODE);
        assert_eq!(outcome.message, "expected value");

        let outcome = StatusCodeType::UnparsableRequest.outcome(None);
        assert_eq!(outcome.code, UNPARSABLE_REQUEST_CODE);
        assert!(outcome.message.is_empty());
    }

    #[test]
    fn only_server_faults_are_500() {
        assert_eq!(
            StatusCodeType::UnknownInternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCodeType::UnreadableUpload.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCodeType::EmptyUpload.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}

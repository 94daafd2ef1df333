use crate::{probe::ProbeError, status::StatusCodeType};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum Error {
    #[error("empty file provided")]
    EmptyUpload,
    #[error("Staging error: {0}")]
    Staging(#[from] std::io::Error),
    #[error("Upload read error: {0}")]
    UploadRead(#[source] MultipartError),
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("upload exceeds {limit} bytes")]
    UploadTooLarge { limit: u64 },
    #[error("Malformed JSON: {0}")]
    Json(String),
    #[error("No route for {0}")]
    NotFound(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Handler panicked")]
    Panicked,
}

impl Error {
    /// Maps every failure onto the code the caller sees. Order matters: input
    /// problems first, then infrastructure faults, then everything else.
    pub fn status_code_type(&self) -> StatusCodeType {
        match self {
            Error::EmptyUpload => StatusCodeType::EmptyUpload,
            Error::Multipart(_) | Error::BadRequest(_) | Error::UploadTooLarge { .. } => {
                StatusCodeType::UnparsableRequest
            }
            Error::Json(_) => StatusCodeType::JsonParsingError,
            Error::Staging(_) | Error::UploadRead(_) | Error::Probe(_) => {
                StatusCodeType::UnreadableUpload
            }
            Error::NotFound(_) | Error::MethodNotAllowed | Error::Panicked => {
                StatusCodeType::UnknownInternalError
            }
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Error::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => self.status_code_type().http_status(),
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Error::Multipart(err) => Some(err.to_string()),
            Error::BadRequest(message) | Error::Json(message) => Some(message.clone()),
            Error::UploadTooLarge { .. } => Some(self.to_string()),
            _ => None,
        }
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::BadRequest(rejection.to_string())
    }
}

// No route takes a JSON body yet; JSON extractors on future routes should
// take `Result<Json<T>, JsonRejection>` and convert through here.
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(missing) => {
                Error::BadRequest(missing.to_string())
            }
            other => Error::Json(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let kind = self.status_code_type();
        let status = self.http_status();

        if status.is_server_error() {
            error!(code = kind.code(), error = %self, "Request failed");
        } else {
            warn!(code = kind.code(), error = %self, "Request rejected");
        }

        (status, Json(kind.outcome(self.detail()))).into_response()
    }
}

/// Router fallback for paths with no route.
pub async fn not_found(uri: Uri) -> Error {
    Error::NotFound(uri.path().to_owned())
}

/// Turns a panic inside a handler into the generic unknown error body.
pub fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    Error::Panicked.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{
        EMPTY_UPLOAD_CODE, JSON_PARSING_ERROR_CODE, UNKNOWN_INTERNAL_ERROR_CODE,
        UNPARSABLE_REQUEST_CODE, UNREADABLE_UPLOAD_CODE,
    };
    use axum::{
        body::Body,
        extract::{FromRequest, RequestParts},
        http::{header::CONTENT_TYPE, Request},
    };
    use std::io;

    #[test]
    fn infrastructure_faults_collapse_to_one_code() {
        let faults = [
            Error::Staging(io::Error::new(io::ErrorKind::Other, "disk full")),
            Error::Probe(ProbeError::ProcessFailure(io::Error::new(
                io::ErrorKind::Interrupted,
                "interrupted",
            ))),
            Error::Probe(ProbeError::Spawn {
                tool: "admesh".to_owned(),
                source: io::Error::new(io::ErrorKind::NotFound, "not found"),
            }),
            Error::Probe(ProbeError::TimedOut(std::time::Duration::from_secs(1))),
            Error::Probe(ProbeError::MalformedVolume("1.5\n".to_owned())),
        ];

        for fault in faults {
            let kind = fault.status_code_type();
            assert_eq!(kind.code(), UNREADABLE_UPLOAD_CODE, "{fault}");
            assert_eq!(
                kind.outcome(fault.detail()).message,
                "unable to read file upload"
            );
        }
    }

    #[test]
    fn input_errors_keep_their_message() {
        let err = Error::BadRequest("Request payload is too large".to_owned());
        assert_eq!(err.status_code_type().code(), UNPARSABLE_REQUEST_CODE);
        assert_eq!(err.detail().as_deref(), Some("Request payload is too large"));

        let err = Error::Json("trailing comma at line 1".to_owned());
        assert_eq!(err.status_code_type().code(), JSON_PARSING_ERROR_CODE);
        assert_eq!(err.detail().as_deref(), Some("trailing comma at line 1"));

        assert_eq!(Error::EmptyUpload.status_code_type().code(), EMPTY_UPLOAD_CODE);

        let err = Error::UploadTooLarge { limit: 8 };
        assert_eq!(err.status_code_type().code(), UNPARSABLE_REQUEST_CODE);
        assert_eq!(err.http_status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.detail().as_deref(), Some("upload exceeds 8 bytes"));
    }

    #[test]
    fn routing_misses_are_unknown_with_their_own_status() {
        let err = Error::NotFound("/api/v1/nothing".to_owned());
        assert_eq!(err.status_code_type().code(), UNKNOWN_INTERNAL_ERROR_CODE);
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);

        let err = Error::MethodNotAllowed;
        assert_eq!(err.status_code_type().code(), UNKNOWN_INTERNAL_ERROR_CODE);
        assert_eq!(err.http_status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn panics_are_unknown() {
        let err = Error::Panicked;
        assert_eq!(err.status_code_type().code(), UNKNOWN_INTERNAL_ERROR_CODE);
        assert_eq!(err.detail(), None);

        let response = handle_panic(Box::new("boom"));
        assert!(response.status().is_server_error());
    }

    async fn json_rejection(content_type: &str, body: &'static str) -> JsonRejection {
        let request = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();

        Json::<serde_json::Value>::from_request(&mut RequestParts::new(request))
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn malformed_json_uses_parser_message() {
        let err = Error::from(json_rejection("application/json", "{\"volume\": ").await);

        assert_eq!(err.status_code_type().code(), JSON_PARSING_ERROR_CODE);
        assert!(!err.detail().unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_content_type_is_a_bad_request() {
        let err = Error::from(json_rejection("text/plain", "{}").await);

        assert_eq!(err.status_code_type().code(), UNPARSABLE_REQUEST_CODE);
    }
}

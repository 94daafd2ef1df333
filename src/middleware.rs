use crate::error::Error;
use axum::{
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The method router answers a wrong verb with a bare 405; give it the same
/// failure body as every other error.
pub async fn method_not_allowed<B>(req: Request<B>, next: Next<B>) -> Response {
    let response = next.run(req).await;

    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        Error::MethodNotAllowed.into_response()
    } else {
        response
    }
}

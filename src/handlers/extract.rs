//! Request extractors whose rejections answer with the API error body

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::FromRequest;
use axum::extract::FromRequestParts;

use crate::utils::errors::CollectivError;

/// JSON body; malformed bodies are invalid requests
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(CollectivError))]
pub struct ApiJson<T>(pub T);

/// Query string; malformed parameters are invalid requests
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(CollectivError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters; malformed ids are invalid requests
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(CollectivError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for CollectivError {
    fn from(rejection: JsonRejection) -> Self {
        CollectivError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for CollectivError {
    fn from(rejection: QueryRejection) -> Self {
        CollectivError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for CollectivError {
    fn from(rejection: PathRejection) -> Self {
        CollectivError::InvalidRequest(rejection.body_text())
    }
}

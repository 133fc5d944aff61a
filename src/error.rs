use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::model::PreprocessError;

/// Errors surfaced to HTTP clients. Model failures never reach this type;
/// the classifier adapter absorbs them into a fallback label.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image file uploaded in field 'image'")]
    MissingImage,

    #[error("Invalid multipart request: {0}")]
    Multipart(String),

    #[error("Failed to read uploaded image: {0}")]
    UploadRead(String),

    #[error("Could not process the input image: {0}")]
    Preprocess(#[from] PreprocessError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingImage
            | ApiError::Multipart(_)
            | ApiError::UploadRead(_)
            | ApiError::Preprocess(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "rejecting predict request");
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

//! JSON body extractor with field-level rejections.
//!
//! `axum::Json` answers a wrongly typed field with a plain-text 422. This
//! wrapper reports it the same way as any other validation failure, keyed
//! by the path of the offending value (`email`, `tags[0]`).

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, FieldErrors};

/// Extractor that deserializes a JSON body into `T`.
///
/// Rejects with 415 without a JSON content type, 400 with a message for
/// unparseable JSON, and a 400 field error map when the JSON doesn't fit `T`.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        decode(value).map(Self)
    }
}

/// Deserialize an already-parsed body, keying type errors by value path.
///
/// # Errors
///
/// Returns `AppError::Validation` for a value of the wrong shape, or
/// `AppError::BadRequest` when the body itself has the wrong type.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let message = err.into_inner().to_string();
        if path == "." {
            AppError::BadRequest(message)
        } else {
            AppError::Validation(FieldErrors::single(&path, message))
        }
    })
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(e) => AppError::UnsupportedMediaType(e.body_text()),
        other => AppError::BadRequest(other.body_text()),
    }
}

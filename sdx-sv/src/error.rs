//! Error types for sdx-sv
//!
//! Every operation of the service returns an [`OpResult`]: either the
//! payload, or an [`ErrorKind`] plus a human-readable message. HTTP-level
//! problems that are not operation outcomes (unknown or finished task) use
//! [`ApiError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Boundary error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Remote document unreachable or an open/save round-trip failed
    ConnectionError,
    /// Node or attribute does not exist
    NotFound,
    /// Asset conversion reported an error
    ConversionFailure,
    /// Request payload could not be parsed or validated
    MalformedInput,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::ConnectionError => StatusCode::BAD_GATEWAY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::ConversionFailure => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::MalformedInput => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ConversionFailure => "conversion_failure",
            ErrorKind::MalformedInput => "malformed_input",
        };
        f.write_str(s)
    }
}

/// Classified failure of one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl OpFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for OpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of a service operation
///
/// Serializes as `{"success": true, "value": ...}` or
/// `{"success": false, "error": "<kind>", "message": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum OpResult<T> {
    Ok(T),
    Err(OpFailure),
}

impl<T> OpResult<T> {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        OpResult::Err(OpFailure::new(kind, message))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, OpResult::Ok(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            OpResult::Ok(v) => Some(v),
            OpResult::Err(_) => None,
        }
    }

    pub fn error(&self) -> Option<&OpFailure> {
        match self {
            OpResult::Ok(_) => None,
            OpResult::Err(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<T, OpFailure> {
        match self {
            OpResult::Ok(v) => Ok(v),
            OpResult::Err(e) => Err(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OpResult<U> {
        match self {
            OpResult::Ok(v) => OpResult::Ok(f(v)),
            OpResult::Err(e) => OpResult::Err(e),
        }
    }
}

impl<T, E: Into<OpFailure>> From<Result<T, E>> for OpResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => OpResult::Ok(v),
            Err(e) => OpResult::Err(e.into()),
        }
    }
}

impl<T: Serialize> Serialize for OpResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OpResult::Ok(value) => {
                let mut s = serializer.serialize_struct("OpResult", 2)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("value", value)?;
                s.end()
            }
            OpResult::Err(failure) => {
                let mut s = serializer.serialize_struct("OpResult", 3)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error", &failure.kind)?;
                s.serialize_field("message", &failure.message)?;
                s.end()
            }
        }
    }
}

impl<T: Serialize> IntoResponse for OpResult<T> {
    fn into_response(self) -> Response {
        let status = match &self {
            OpResult::Ok(_) => StatusCode::OK,
            OpResult::Err(failure) => failure.kind.status_code(),
        };
        (status, Json(self)).into_response()
    }
}

/// Errors for task lookup routes, which answer outside the `OpResult` shape
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown task id (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Task already finished (409)
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

//! Response envelopes.
//!
//! A successful operation answers with its raw JSON result. A failed one answers with
//! `{"error": {"kind": ..., "message": ...}}`, with status 200 unless distinguishing
//! statuses were enabled.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ServerError;

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Debug)]
pub enum Envelope {
    Success(Value),
    Failure {
        status: StatusCode,
        details: ErrorDetails,
    },
}

impl Envelope {
    pub fn success(value: impl Into<Value>) -> Self {
        Envelope::Success(value.into())
    }

    /// Wraps an error; `error_status` picks the error's own status over 200.
    pub fn failure(err: &ServerError, error_status: bool) -> Self {
        Envelope::Failure {
            status: match error_status {
                true => err.status(),
                false => StatusCode::OK,
            },
            details: ErrorDetails {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        match self {
            Envelope::Success(value) => Json(value).into_response(),
            Envelope::Failure { status, details } => {
                (status, Json(ErrorBody { error: details })).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrest_core::error::DocumentStoreError;

    #[test]
    fn failures_default_to_ok_status() {
        let err = ServerError::from(DocumentStoreError::Backend("down".into()));

        let Envelope::Failure { status, details } = Envelope::failure(&err, false) else {
            panic!("expected a failure envelope");
        };
        assert_eq!(status, StatusCode::OK);
        assert_eq!(details.kind, "backend");
        assert_eq!(details.message, "Backend error: down");
    }

    #[test]
    fn failures_can_carry_the_error_status() {
        let err = ServerError::BadRequest("not an object".into());

        let response = Envelope::failure(&err, true).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

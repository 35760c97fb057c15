//! Errors raised by the HTTP layer and at startup.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docrest_core::error::DocumentStoreError;
use thiserror::Error;

use crate::envelope::Envelope;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid or missing configuration; fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
    /// The request body could not be read as a document.
    #[error("Bad request body: {0}")]
    BadRequest(String),
}

impl ServerError {
    /// Stable, machine-readable name used in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Config(_) => "configuration",
            ServerError::Io(_) => "io",
            ServerError::Store(err) => err.kind(),
            ServerError::BadRequest(_) => "bad_request",
        }
    }

    /// Status used for the envelope when distinguishing statuses are enabled.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Store(err) => match err {
                DocumentStoreError::DocumentNotFound(_, _) => StatusCode::NOT_FOUND,
                DocumentStoreError::DocumentAlreadyExists(_, _) => StatusCode::CONFLICT,
                DocumentStoreError::InvalidDocument(_)
                | DocumentStoreError::Serialization(_) => StatusCode::BAD_REQUEST,
                DocumentStoreError::Initialization(_)
                | DocumentStoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Config(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        Envelope::failure(&self, false).into_response()
    }
}

//! Error types for the search gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type used by components below the HTTP boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing tenant identifier")]
    MissingTenant,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Engine timeout after {0}ms")]
    EngineTimeout(u64),

    #[error("Cache fault: {0}")]
    CacheFault(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::EngineTimeout(_) | Error::Engine(_))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Error::MissingTenant | Error::BadRequest(_) => 400,
            Error::Forbidden(_) => 403,
            Error::EngineTimeout(_) => 504,
            Error::Engine(_) => 500,
            _ => 500,
        }
    }
}

/// HTTP-facing error, produced by handlers and converted directly into a
/// JSON error envelope. Timeouts never become a `GatewayError`: the
/// dispatcher always resolves a deadline into a (possibly partial) response.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Missing tenant identifier")]
    MissingTenant,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Engine error: {0}")]
    EngineError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(Error),
}

impl GatewayError {
    fn code(&self) -> &'static str {
        match self {
            GatewayError::MissingTenant => "MISSING_TENANT_ID",
            GatewayError::Forbidden(_) => "FORBIDDEN",
            GatewayError::BadRequest(_) => "BAD_REQUEST",
            GatewayError::EngineError(_) => "ENGINE_ERROR",
            GatewayError::Internal(_) => "INTERNAL",
            GatewayError::Json(_) => "BAD_REQUEST",
            GatewayError::Core(err) => match err {
                Error::MissingTenant => "MISSING_TENANT_ID",
                Error::Forbidden(_) => "FORBIDDEN",
                Error::BadRequest(_) => "BAD_REQUEST",
                Error::Engine(_) | Error::EngineTimeout(_) => "ENGINE_ERROR",
                _ => "INTERNAL",
            },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::MissingTenant => StatusCode::BAD_REQUEST,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::EngineError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Json(_) => StatusCode::BAD_REQUEST,
            GatewayError::Core(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        let message = self.to_string();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<Error> for GatewayError {
    fn from(err: Error) -> Self {
        match err {
            Error::MissingTenant => GatewayError::MissingTenant,
            Error::Forbidden(msg) => GatewayError::Forbidden(msg),
            Error::BadRequest(msg) => GatewayError::BadRequest(msg),
            Error::Engine(msg) => GatewayError::EngineError(msg),
            Error::EngineTimeout(ms) => GatewayError::EngineError(format!("timeout after {ms}ms")),
            other => GatewayError::Core(other),
        }
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("path escapes root")]
    Unsafe,
    #[error("not found")]
    NotFound,
    #[error("not a directory")]
    NotADirectory,
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("missing file part")]
    MissingFile,
    #[error("file type not allowed: {0}")]
    ExtensionDenied(String),
    #[error("upload too large")]
    TooLarge,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unsafe => "Unsafe",
            AppError::NotFound => "NotFound",
            AppError::NotADirectory => "NotADirectory",
            AppError::AlreadyExists(_) => "AlreadyExists",
            AppError::InvalidName(_) => "InvalidName",
            AppError::MissingFile => "MissingFile",
            AppError::ExtensionDenied(_) => "ExtensionDenied",
            AppError::TooLarge => "TooLarge",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Io(_) => "Io",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unsafe
            | AppError::NotADirectory
            | AppError::AlreadyExists(_)
            | AppError::InvalidName(_)
            | AppError::MissingFile
            | AppError::ExtensionDenied(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps an I/O error on a user-addressed path: a vanished target is the
    /// caller's 404, everything else surfaces as a 500.
    pub fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound
        } else {
            AppError::Io(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

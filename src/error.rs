use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// A date string matched neither the strict format nor any fallback format.
#[derive(Debug, Error)]
#[error("no accepted date format matches {value:?}")]
pub struct DateParseError {
    pub value: String,
}

/// Fatal pipeline failures. One bad value aborts the whole run; there is no
/// row-level skip-and-continue.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("row {row}, column '{column}': {source}")]
    DateParse {
        row: usize,
        column: String,
        #[source]
        source: DateParseError,
    },
    #[error("row {row}, column '{column}': expected a {expected} value")]
    UnexpectedType {
        row: usize,
        column: String,
        expected: &'static str,
    },
    #[error("column '{0}' is not present")]
    MissingColumn(String),
    #[error("failed to serialize workbook: {0}")]
    Report(#[from] rust_xlsxwriter::XlsxError),
}

#[derive(Debug)]
pub enum AppError {
    InvalidInput(String),
    SchemaError(Vec<String>),
    Pipeline(PipelineError),
    FileProcessingError(String),
    IoError(std::io::Error),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::SchemaError(columns) => write!(
                f,
                "The following required columns are missing: {}",
                columns.join(", ")
            ),
            AppError::Pipeline(err) => write!(f, "Pipeline error: {}", err),
            AppError::FileProcessingError(msg) => write!(f, "File processing error: {}", msg),
            AppError::IoError(err) => write!(f, "IO error: {}", err),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Pipeline(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::SchemaError(columns) => (
                StatusCode::BAD_REQUEST,
                format!(
                    "The following required columns are missing: {}",
                    columns.join(", ")
                ),
            ),
            AppError::Pipeline(err) => {
                let status = match err {
                    PipelineError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
            AppError::FileProcessingError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::IoError(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

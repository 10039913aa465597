use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Hosted backend unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hosted backend error {status}: {message}")]
    Hosted { status: u16, message: String },

    #[error("{0}")]
    Auth(String),

    #[error("No user is logged in")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{}", describe_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Publishing stopped at {step}: {message}")]
    Publish {
        step: String,
        message: String,
        rolled_back: bool,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A single failed form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub title: String,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// An error carrying the notification title of the action that produced it.
#[derive(Debug)]
pub struct ActionError {
    pub title: &'static str,
    pub source: AppError,
}

impl AppError {
    pub fn titled(self, title: &'static str) -> ActionError {
        ActionError { title, source: self }
    }

    fn default_title(&self) -> &'static str {
        match self {
            AppError::Auth(_) | AppError::Unauthorized => "Authentication required",
            AppError::Forbidden(_) => "Not allowed",
            AppError::NotFound => "Not found",
            AppError::BadRequest(_) | AppError::Validation(_) => "Invalid input",
            AppError::Publish { .. } => "Failed to publish course",
            AppError::Http(_) | AppError::Hosted { .. } => "Could not load data",
            _ => "Something went wrong",
        }
    }

    fn render(self, title: &str) -> Response {
        let (status, message, retryable, fields) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string(), false, Vec::new()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, false, Vec::new()),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                describe_fields(&fields),
                false,
                fields,
            ),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg, false, Vec::new()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "No user is logged in".to_string(),
                false,
                Vec::new(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, false, Vec::new()),
            AppError::Publish {
                step,
                message,
                rolled_back,
            } => {
                error!("publish failed at {}: {} (rolled back: {})", step, message, rolled_back);
                let outcome = if rolled_back {
                    "Nothing was saved."
                } else {
                    "Some of the course could not be removed again."
                };
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Publishing stopped at {}. {}", step, outcome),
                    rolled_back,
                    Vec::new(),
                )
            }
            AppError::Http(e) => {
                error!("hosted request failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "The backend could not be reached".to_string(),
                    true,
                    Vec::new(),
                )
            }
            AppError::Hosted { status, message } => {
                error!("hosted backend returned {}: {}", status, message);
                (StatusCode::BAD_GATEWAY, message, true, Vec::new())
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    true,
                    Vec::new(),
                )
            }
            AppError::Migration(e) => {
                error!("migration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    false,
                    Vec::new(),
                )
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    false,
                    Vec::new(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            title: title.to_string(),
            message,
            retryable,
            fields,
        });

        (status, body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let title = self.default_title();
        self.render(title)
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        self.source.render(self.title)
    }
}

impl From<AppError> for ActionError {
    fn from(source: AppError) -> Self {
        let title = source.default_title();
        ActionError { title, source }
    }
}

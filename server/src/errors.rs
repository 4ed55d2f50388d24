// shopflow_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use shopflow::CommerceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Commerce(#[from] CommerceError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),
}

impl AppError {
  pub fn validation(message: impl Into<String>) -> Self {
    AppError::Commerce(CommerceError::Validation(message.into()))
  }

  pub fn unauthorized(message: impl Into<String>) -> Self {
    AppError::Commerce(CommerceError::Unauthorized(message.into()))
  }

  pub fn forbidden(message: impl Into<String>) -> Self {
    AppError::Commerce(CommerceError::Forbidden(message.into()))
  }

  fn code(&self) -> &'static str {
    match self {
      AppError::Commerce(e) => e.kind(),
      AppError::Config(_) | AppError::Sqlx(_) => "INTERNAL_ERROR",
    }
  }

  /// Message safe to show a client. Infrastructure failures are not described.
  fn public_message(&self) -> String {
    match self {
      AppError::Commerce(CommerceError::Internal(_) | CommerceError::Pipeline { .. }) => {
        "An internal error occurred".to_string()
      }
      AppError::Commerce(e) => e.to_string(),
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Config(_) => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Commerce(e) => StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
      AppError::Config(_) | AppError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }
    HttpResponse::build(status).json(json!({
      "success": false,
      "code": self.code(),
      "message": self.public_message(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

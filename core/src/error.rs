// shopflow/src/error.rs

//! Error types for the pipeline engine (`PipelineError`) and the order and
//! payment domain (`CommerceError`).

use thiserror::Error;

/// Faults raised by the pipeline engine itself rather than by business logic.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No pipeline registered for context type {context_type}")]
  PipelineNotRegistered { context_type: String },

  #[error("Context type mismatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Configuration error for step '{step_name}': {message}")]
  ConfigurationError { step_name: String, message: String },
}

pub type PipelineResult<T, E = PipelineError> = std::result::Result<T, E>;

/// Domain error taxonomy. Every variant maps onto one HTTP status class in the
/// server (see `CommerceError::status_code`).
#[derive(Debug, Error)]
pub enum CommerceError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Forbidden(String),

  /// Illegal state change; nothing was mutated.
  #[error("{0}")]
  InvalidTransition(String),

  /// Optimistic concurrency failure; the caller may retry.
  #[error("{0}")]
  Conflict(String),

  #[error("Duplicate value for '{field}': '{value}'. Choose another.")]
  Duplicate { field: String, value: String },

  #[error("Payment verification failed")]
  PaymentVerificationFailed,

  #[error("{service} error: {message}")]
  ExternalService {
    service: String,
    message: String,
    retryable: bool,
  },

  #[error("Internal error: {0}")]
  Internal(String),

  #[error("Workflow error: {source}")]
  Pipeline {
    #[from]
    source: PipelineError,
  },
}

impl CommerceError {
  /// HTTP status the error is rendered with.
  pub fn status_code(&self) -> u16 {
    match self {
      CommerceError::Validation(_)
      | CommerceError::InvalidTransition(_)
      | CommerceError::Duplicate { .. }
      | CommerceError::PaymentVerificationFailed => 400,
      CommerceError::Unauthorized(_) => 401,
      CommerceError::Forbidden(_) => 403,
      CommerceError::NotFound(_) => 404,
      CommerceError::Conflict(_) => 409,
      CommerceError::ExternalService { retryable: true, .. } => 503,
      CommerceError::ExternalService { retryable: false, .. } => 502,
      CommerceError::Internal(_) | CommerceError::Pipeline { .. } => 500,
    }
  }

  /// Stable machine-readable error code for the response envelope.
  pub fn kind(&self) -> &'static str {
    match self {
      CommerceError::Validation(_) => "VALIDATION_ERROR",
      CommerceError::NotFound(_) => "NOT_FOUND",
      CommerceError::Unauthorized(_) => "UNAUTHORIZED",
      CommerceError::Forbidden(_) => "FORBIDDEN",
      CommerceError::InvalidTransition(_) => "INVALID_TRANSITION",
      CommerceError::Conflict(_) => "CONFLICT",
      CommerceError::Duplicate { .. } => "DUPLICATE_VALUE",
      CommerceError::PaymentVerificationFailed => "PAYMENT_VERIFICATION_FAILED",
      CommerceError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
      CommerceError::Internal(_) | CommerceError::Pipeline { .. } => "INTERNAL_ERROR",
    }
  }

  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      CommerceError::Conflict(_) | CommerceError::ExternalService { retryable: true, .. }
    )
  }

  pub fn not_found(what: &str) -> Self {
    CommerceError::NotFound(format!("{what} not found"))
  }
}

pub type Result<T, E = CommerceError> = std::result::Result<T, E>;

// src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy. Every backend failure is converted into one of
/// these at the component boundary and surfaced as a user-visible message;
/// nothing propagates as a panic and nothing is retried automatically.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("Silakan login terlebih dahulu")]
  Unauthenticated,

  #[error("Operasi ini tidak diizinkan: {0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("Stok habis untuk buku: {title}")]
  OutOfStock { title: String },

  #[error("Buku ini sedang Anda pinjam")]
  AlreadyBorrowed,

  #[error("Buku sudah dikembalikan")]
  AlreadyReturned,

  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Backend Unavailable: {0}")]
  BackendUnavailable(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in code that uses `?` on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Sqlx(db_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Unauthenticated => HttpResponse::Unauthorized().json(json!({"error": self.to_string()})),
      AppError::Forbidden(_) => HttpResponse::Forbidden().json(json!({"error": self.to_string()})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::OutOfStock { .. } | AppError::AlreadyBorrowed | AppError::AlreadyReturned => {
        HttpResponse::Conflict().json(json!({"error": self.to_string()}))
      }
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sqlx(_) => {
        HttpResponse::ServiceUnavailable().json(json!({"error": "Terjadi kesalahan pada server. Coba lagi nanti."}))
      }
      AppError::BackendUnavailable(m) => {
        HttpResponse::ServiceUnavailable().json(json!({"error": "Backend tidak tersedia", "detail": m}))
      }
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// src/models/book.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
  pub id: Uuid,
  pub title: String,
  pub author: String,
  pub category: String,
  /// Copies currently available for borrowing. Never negative; the stores
  /// only mutate it through the conditional borrow/return updates.
  pub stock: i32,
  pub cover_url: Option<String>,
  pub description: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Book {
  pub fn is_available(&self) -> bool {
    self.stock > 0
  }
}

// src/models/cart_item.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A pending-borrow intent, keyed by `(user_id, book_id)`. Adding the same
/// book twice overwrites the entry; it never reserves stock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub user_id: Uuid,
  pub book_id: Uuid,
  pub title: String,
  pub author: String,
  pub cover_url: Option<String>,
  /// Always 1; kept as a field for the wire shape, treated as a presence flag.
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

/// Cart entry enriched with the catalog's live stock at read time. The
/// denormalized snapshot in the item is not trusted for availability.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  #[serde(flatten)]
  pub item: CartItem,
  pub stock: i32,
}

impl CartLine {
  pub fn is_out_of_stock(&self) -> bool {
    self.stock <= 0
  }
}

// src/services/cart.rs

//! Cart: per-user pending-borrow intents. Cart membership never reserves
//! stock; availability is decided at borrow time.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{CartItem, CartLine};
use crate::store::Backend;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartOutcome {
  pub item: CartItem,
  pub message: String,
}

/// Puts a book into the cart. Idempotent: adding the same book again just
/// overwrites the entry (quantity stays 1).
#[instrument(name = "cart::add_to_cart", skip(backend))]
pub async fn add_to_cart(backend: &Backend, user: Option<Uuid>, book_id: Uuid) -> Result<CartOutcome> {
  let user_id = user.ok_or(AppError::Unauthenticated)?;

  let book = backend
    .books()
    .find_by_id(book_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Buku tidak ditemukan".to_string()))?;

  let item = CartItem {
    user_id,
    book_id,
    title: book.title,
    author: book.author,
    cover_url: book.cover_url,
    quantity: 1,
    added_at: Utc::now(),
  };
  backend.cart().upsert(item.clone()).await?;

  info!(user_id = %user_id, book_id = %book_id, "Book added to cart.");
  Ok(CartOutcome {
    item,
    message: "Buku berhasil ditambahkan ke Cart".to_string(),
  })
}

/// Removes a cart entry; removing an absent entry is not an error.
#[instrument(name = "cart::remove_from_cart", skip(backend))]
pub async fn remove_from_cart(backend: &Backend, user: Option<Uuid>, book_id: Uuid) -> Result<()> {
  let user_id = user.ok_or(AppError::Unauthenticated)?;
  backend.cart().delete(user_id, book_id).await
}

/// The user's cart, oldest first, each entry enriched with the catalog's
/// live stock. The denormalized snapshot is only display data; a book that
/// has disappeared from the catalog shows as stock 0.
#[instrument(name = "cart::list_cart", skip(backend))]
pub async fn list_cart(backend: &Backend, user: Option<Uuid>) -> Result<Vec<CartLine>> {
  let user_id = user.ok_or(AppError::Unauthenticated)?;

  let items = backend.cart().find_by_user(user_id).await?;
  let mut lines = Vec::with_capacity(items.len());
  for item in items {
    let stock = backend
      .books()
      .find_by_id(item.book_id)
      .await?
      .map(|book| book.stock)
      .unwrap_or(0);
    lines.push(CartLine { item, stock });
  }
  Ok(lines)
}

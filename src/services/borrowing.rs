// src/services/borrowing.rs

//! The borrowing workflow: the one component with real invariants.
//!
//! Stock is the single source of truth for availability; it only moves
//! through the stores' conditional claim (−1) and guarded return (+1), so
//! `stock >= 0` holds in every reachable state and two racing requests for
//! the last copy cannot both succeed.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::Borrowing;
use crate::store::{Backend, BorrowingFilter, CreateBorrowing, MarkReturned};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowOutcome {
  pub borrowing: Borrowing,
  pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOutcome {
  pub borrowing: Borrowing,
  pub message: String,
}

/// Aggregate result of a batch borrow. Per-item failures are not reported;
/// the caller only learns how many items went through.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
  pub borrowed: usize,
  pub skipped: usize,
  pub message: String,
}

/// Damage assessment attached to a return.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
  #[serde(default)]
  pub damage_count: i32,
  #[serde(default)]
  pub damage_note: String,
}

/// Advisory check backing the "already borrowed" UI state. Not a lock: the
/// stores re-check atomically at borrow time.
pub async fn check_active_borrowing(backend: &Backend, user_id: Uuid, book_id: Uuid) -> Result<bool> {
  let active = backend
    .borrowings()
    .find(BorrowingFilter {
      user_id: Some(user_id),
      book_id: Some(book_id),
      is_returned: Some(false),
    })
    .await?;
  Ok(!active.is_empty())
}

/// Borrows one copy of a book for the signed-in user.
///
/// Fails `Unauthenticated` without a session, `NotFound` for an unknown
/// book, `AlreadyBorrowed` when an active borrowing for the pair exists and
/// `OutOfStock` when no copy is left. On success the due date is the borrow
/// date plus seven days and the fine/damage fields start zeroed.
#[instrument(name = "borrowing::borrow_book", skip(backend))]
pub async fn borrow_book(backend: &Backend, user: Option<Uuid>, book_id: Uuid) -> Result<BorrowOutcome> {
  let user_id = user.ok_or(AppError::Unauthenticated)?;

  if check_active_borrowing(backend, user_id, book_id).await? {
    return Err(AppError::AlreadyBorrowed);
  }

  let borrowing = backend
    .borrowings()
    .create_if_in_stock(CreateBorrowing {
      user_id,
      book_id,
      borrowed_at: Utc::now(),
    })
    .await?;

  info!(user_id = %user_id, borrowing_id = %borrowing.id, "Book borrowed.");
  Ok(BorrowOutcome {
    borrowing,
    message: "Buku berhasil dipinjam!".to_string(),
  })
}

/// Closes an active borrowing and credits the stock back. The stores require
/// the borrowing to belong to the caller and to still be open, so a double
/// return or a return against someone else's borrowing is rejected instead
/// of crediting stock twice.
#[instrument(name = "borrowing::return_book", skip(backend, request))]
pub async fn return_book(
  backend: &Backend,
  user: Option<Uuid>,
  borrowing_id: Uuid,
  request: ReturnRequest,
) -> Result<ReturnOutcome> {
  let user_id = user.ok_or(AppError::Unauthenticated)?;

  let borrowing = backend
    .borrowings()
    .mark_returned(MarkReturned {
      borrowing_id,
      user_id,
      returned_at: Utc::now(),
      damage_count: request.damage_count,
      damage_note: request.damage_note,
    })
    .await?;

  info!(user_id = %user_id, borrowing_id = %borrowing.id, days_late = borrowing.days_late, "Book returned.");
  Ok(ReturnOutcome {
    borrowing,
    message: "Buku berhasil dikembalikan.".to_string(),
  })
}

/// Best-effort batch borrow of the selected cart entries.
///
/// Items that are out of stock, vanished from the catalog, or already on
/// loan to the user are silently skipped and stay in the cart; each success
/// removes its cart entry. Partial success is expected; only a backend
/// failure aborts the remainder.
#[instrument(name = "borrowing::borrow_selected", skip(backend, selected), fields(selected_count = selected.len()))]
pub async fn borrow_selected(backend: &Backend, user: Option<Uuid>, selected: &HashSet<Uuid>) -> Result<BatchOutcome> {
  let user_id = user.ok_or(AppError::Unauthenticated)?;

  let cart_items = backend.cart().find_by_user(user_id).await?;

  let mut borrowed = 0usize;
  let mut skipped = 0usize;
  for item in cart_items {
    if !selected.contains(&item.book_id) {
      continue;
    }

    let attempt = backend
      .borrowings()
      .create_if_in_stock(CreateBorrowing {
        user_id,
        book_id: item.book_id,
        borrowed_at: Utc::now(),
      })
      .await;

    match attempt {
      Ok(borrowing) => {
        backend.cart().delete(user_id, item.book_id).await?;
        info!(user_id = %user_id, borrowing_id = %borrowing.id, "Borrowed from cart.");
        borrowed += 1;
      }
      Err(AppError::OutOfStock { title }) => {
        warn!(user_id = %user_id, book_id = %item.book_id, %title, "Skipped cart item: out of stock.");
        skipped += 1;
      }
      Err(AppError::NotFound(_)) | Err(AppError::AlreadyBorrowed) => {
        warn!(user_id = %user_id, book_id = %item.book_id, "Skipped cart item: unavailable.");
        skipped += 1;
      }
      Err(other) => return Err(other),
    }
  }

  let message = if borrowed > 0 {
    "Peminjaman berhasil.".to_string()
  } else {
    "Tidak ada buku yang dapat dipinjam.".to_string()
  };
  Ok(BatchOutcome {
    borrowed,
    skipped,
    message,
  })
}

// src/store/postgres.rs

//! Live store over PostgreSQL (runtime queries, no compile-time checking).
//!
//! The two invariant-bearing writes run inside transactions with row locks,
//! so "decrement stock iff stock > 0" and the guarded return are atomic even
//! under concurrent requests. After each of its own mutations the store
//! re-queries and republishes the affected subscription sets; delivery is
//! in-process, mirroring the snapshot listeners of the original client.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{borrowing, due_status, late_fee_cents, Book, Borrowing, CartItem, User};

use super::memory::sample_books;
use super::subscription::{SubscriberSet, Subscription};
use super::{
  BookRepository, BorrowingFilter, BorrowingRepository, CartRepository, CreateBorrowing, MarkReturned, NewUser,
  UserRepository,
};

const BOOK_COLUMNS: &str = "id, title, author, category, stock, cover_url, description, created_at, updated_at";
const BORROWING_COLUMNS: &str = "id, user_id, book_id, title, borrow_date, return_due_date, is_returned, \
                                 returned_at, days_late, damage_count, damage_note, fine_cents";
const CART_COLUMNS: &str = "user_id, book_id, title, author, cover_url, quantity, added_at";

pub struct PgStore {
  pool: PgPool,
  book_subs: SubscriberSet<(), Vec<Book>>,
  borrowing_subs: SubscriberSet<Uuid, Vec<Borrowing>>,
  cart_subs: SubscriberSet<Uuid, Vec<CartItem>>,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self {
      pool,
      book_subs: SubscriberSet::new(),
      borrowing_subs: SubscriberSet::new(),
      cart_subs: SubscriberSet::new(),
    }
  }

  /// Connects to the configured database. A connection failure is a
  /// `BackendUnavailable`, which the caller turns into demo-mode fallback.
  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPool::connect(database_url)
      .await
      .map_err(|e| AppError::BackendUnavailable(e.to_string()))?;
    Ok(Self::new(pool))
  }

  /// Inserts the sample catalog, skipping books that already exist. Used by
  /// the SEED_DB startup flag.
  pub async fn seed_sample_books(&self) -> Result<()> {
    for book in sample_books() {
      sqlx::query(
        "INSERT INTO books (id, title, author, category, stock, cover_url, description, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) ON CONFLICT (id) DO NOTHING",
      )
      .bind(book.id)
      .bind(&book.title)
      .bind(&book.author)
      .bind(&book.category)
      .bind(book.stock)
      .bind(&book.cover_url)
      .bind(&book.description)
      .bind(book.created_at)
      .bind(book.updated_at)
      .execute(&self.pool)
      .await
      .map_err(AppError::Sqlx)?;
    }
    Ok(())
  }

  async fn fetch_books(&self) -> Result<Vec<Book>> {
    let books: Vec<Book> = sqlx::query_as(&format!("SELECT {} FROM books ORDER BY title ASC", BOOK_COLUMNS))
      .fetch_all(&self.pool)
      .await
      .map_err(AppError::Sqlx)?;
    Ok(books)
  }

  async fn fetch_borrowings(&self, filter: &BorrowingFilter) -> Result<Vec<Borrowing>> {
    let mut qb: QueryBuilder<Postgres> =
      QueryBuilder::new(format!("SELECT {} FROM borrowings WHERE 1=1", BORROWING_COLUMNS));
    if let Some(user_id) = filter.user_id {
      qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(book_id) = filter.book_id {
      qb.push(" AND book_id = ").push_bind(book_id);
    }
    if let Some(is_returned) = filter.is_returned {
      qb.push(" AND is_returned = ").push_bind(is_returned);
    }
    qb.push(" ORDER BY borrow_date DESC");

    let rows = qb
      .build_query_as::<Borrowing>()
      .fetch_all(&self.pool)
      .await
      .map_err(AppError::Sqlx)?;
    Ok(rows)
  }

  async fn fetch_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
    let items: Vec<CartItem> = sqlx::query_as(&format!(
      "SELECT {} FROM cart_items WHERE user_id = $1 ORDER BY added_at ASC",
      CART_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(items)
  }

  // Subscription re-delivery is best-effort: a failed re-query is logged and
  // skipped, never turned into a failure of the mutation that triggered it.
  async fn publish_books(&self) {
    if self.book_subs.live_keys().is_empty() {
      return;
    }
    match self.fetch_books().await {
      Ok(books) => self.book_subs.push(&(), books),
      Err(e) => warn!(error = %e, "Failed to re-deliver book snapshot"),
    }
  }

  async fn publish_borrowings(&self, user_id: Uuid) {
    if !self.borrowing_subs.live_keys().contains(&user_id) {
      return;
    }
    let filter = BorrowingFilter {
      user_id: Some(user_id),
      ..BorrowingFilter::default()
    };
    match self.fetch_borrowings(&filter).await {
      Ok(set) => self.borrowing_subs.push(&user_id, set),
      Err(e) => warn!(error = %e, %user_id, "Failed to re-deliver borrowing snapshot"),
    }
  }

  async fn publish_cart(&self, user_id: Uuid) {
    if !self.cart_subs.live_keys().contains(&user_id) {
      return;
    }
    match self.fetch_cart(user_id).await {
      Ok(items) => self.cart_subs.push(&user_id, items),
      Err(e) => warn!(error = %e, %user_id, "Failed to re-deliver cart snapshot"),
    }
  }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl BookRepository for PgStore {
  async fn find_all(&self) -> Result<Vec<Book>> {
    self.fetch_books().await
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>> {
    let book: Option<Book> = sqlx::query_as(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(AppError::Sqlx)?;
    Ok(book)
  }

  async fn subscribe_all(&self) -> Result<Subscription<Vec<Book>>> {
    let initial = self.fetch_books().await?;
    Ok(self.book_subs.subscribe((), initial))
  }
}

#[async_trait]
impl BorrowingRepository for PgStore {
  async fn create_if_in_stock(&self, event: CreateBorrowing) -> Result<Borrowing> {
    let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

    let book: Option<Book> = sqlx::query_as(&format!("SELECT {} FROM books WHERE id = $1 FOR UPDATE", BOOK_COLUMNS))
      .bind(event.book_id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(AppError::Sqlx)?;
    let book = book.ok_or_else(|| AppError::NotFound("Buku tidak ditemukan".to_string()))?;
    if book.stock <= 0 {
      return Err(AppError::OutOfStock { title: book.title });
    }

    // The partial unique index on (user_id, book_id) WHERE NOT is_returned
    // is the authoritative duplicate guard.
    let created: Borrowing = sqlx::query_as(&format!(
      "INSERT INTO borrowings (id, user_id, book_id, title, borrow_date, return_due_date, is_returned, \
       returned_at, days_late, damage_count, damage_note, fine_cents) \
       VALUES ($1, $2, $3, $4, $5, $6, FALSE, NULL, 0, 0, '', 0) RETURNING {}",
      BORROWING_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(event.user_id)
    .bind(event.book_id)
    .bind(&book.title)
    .bind(event.borrowed_at)
    .bind(Borrowing::due_date_for(event.borrowed_at))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
      if is_unique_violation(&e) {
        AppError::AlreadyBorrowed
      } else {
        AppError::Sqlx(e)
      }
    })?;

    sqlx::query("UPDATE books SET stock = stock - 1, updated_at = $2 WHERE id = $1 AND stock > 0")
      .bind(event.book_id)
      .bind(event.borrowed_at)
      .execute(&mut *tx)
      .await
      .map_err(AppError::Sqlx)?;

    tx.commit().await.map_err(AppError::Sqlx)?;

    self.publish_books().await;
    self.publish_borrowings(event.user_id).await;
    Ok(created)
  }

  async fn mark_returned(&self, event: MarkReturned) -> Result<Borrowing> {
    let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

    let record: Option<Borrowing> = sqlx::query_as(&format!(
      "SELECT {} FROM borrowings WHERE id = $1 FOR UPDATE",
      BORROWING_COLUMNS
    ))
    .bind(event.borrowing_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;
    let record = record.ok_or_else(|| AppError::NotFound("Peminjaman tidak ditemukan".to_string()))?;

    if record.user_id != event.user_id {
      return Err(AppError::Forbidden("peminjaman ini bukan milik Anda".to_string()));
    }
    if record.is_returned {
      return Err(AppError::AlreadyReturned);
    }

    let days_late = match due_status(record.return_due_date, event.returned_at) {
      borrowing::DueStatus::Overdue { days_late } => days_late,
      borrowing::DueStatus::DueIn { .. } => 0,
    };

    let updated: Borrowing = sqlx::query_as(&format!(
      "UPDATE borrowings SET is_returned = TRUE, returned_at = $2, days_late = $3, fine_cents = $4, \
       damage_count = $5, damage_note = $6 WHERE id = $1 RETURNING {}",
      BORROWING_COLUMNS
    ))
    .bind(event.borrowing_id)
    .bind(event.returned_at)
    .bind(days_late as i32)
    .bind(late_fee_cents(days_late))
    .bind(event.damage_count)
    .bind(&event.damage_note)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;

    // Missing book record: credit skipped, zero rows affected is fine.
    sqlx::query("UPDATE books SET stock = stock + 1, updated_at = $2 WHERE id = $1")
      .bind(updated.book_id)
      .bind(event.returned_at)
      .execute(&mut *tx)
      .await
      .map_err(AppError::Sqlx)?;

    tx.commit().await.map_err(AppError::Sqlx)?;

    self.publish_books().await;
    self.publish_borrowings(updated.user_id).await;
    Ok(updated)
  }

  async fn find(&self, filter: BorrowingFilter) -> Result<Vec<Borrowing>> {
    self.fetch_borrowings(&filter).await
  }

  async fn subscribe(&self, user_id: Uuid) -> Result<Subscription<Vec<Borrowing>>> {
    let filter = BorrowingFilter {
      user_id: Some(user_id),
      ..BorrowingFilter::default()
    };
    let initial = self.fetch_borrowings(&filter).await?;
    Ok(self.borrowing_subs.subscribe(user_id, initial))
  }
}

#[async_trait]
impl CartRepository for PgStore {
  async fn upsert(&self, item: CartItem) -> Result<()> {
    sqlx::query(
      "INSERT INTO cart_items (user_id, book_id, title, author, cover_url, quantity, added_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) \
       ON CONFLICT (user_id, book_id) DO UPDATE \
       SET title = EXCLUDED.title, author = EXCLUDED.author, cover_url = EXCLUDED.cover_url, \
           quantity = EXCLUDED.quantity, added_at = EXCLUDED.added_at",
    )
    .bind(item.user_id)
    .bind(item.book_id)
    .bind(&item.title)
    .bind(&item.author)
    .bind(&item.cover_url)
    .bind(item.quantity)
    .bind(item.added_at)
    .execute(&self.pool)
    .await
    .map_err(|e| {
      error!(error = %e, user_id = %item.user_id, book_id = %item.book_id, "Cart upsert failed");
      AppError::Sqlx(e)
    })?;

    self.publish_cart(item.user_id).await;
    Ok(())
  }

  async fn delete(&self, user_id: Uuid, book_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND book_id = $2")
      .bind(user_id)
      .bind(book_id)
      .execute(&self.pool)
      .await
      .map_err(AppError::Sqlx)?;

    if result.rows_affected() > 0 {
      self.publish_cart(user_id).await;
    }
    Ok(())
  }

  async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
    self.fetch_cart(user_id).await
  }

  async fn subscribe(&self, user_id: Uuid) -> Result<Subscription<Vec<CartItem>>> {
    let initial = self.fetch_cart(user_id).await?;
    Ok(self.cart_subs.subscribe(user_id, initial))
  }
}

#[async_trait]
impl UserRepository for PgStore {
  async fn create(&self, new_user: NewUser) -> Result<User> {
    let user: User = sqlx::query_as(
      "INSERT INTO users (id, email, password_hash, display_name, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, NOW(), NOW()) \
       RETURNING id, email, password_hash, display_name, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(&new_user.display_name)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| {
      if is_unique_violation(&e) {
        AppError::Validation("Email sudah terdaftar".to_string())
      } else {
        AppError::Sqlx(e)
      }
    })?;
    Ok(user)
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    let user: Option<User> = sqlx::query_as(
      "SELECT id, email, password_hash, display_name, created_at, updated_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(&self.pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(user)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
    let user: Option<User> = sqlx::query_as(
      "SELECT id, email, password_hash, display_name, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(user)
  }

  async fn store_password_reset(&self, user_id: Uuid, token: &str) -> Result<()> {
    sqlx::query("INSERT INTO password_resets (user_id, token, requested_at) VALUES ($1, $2, NOW())")
      .bind(user_id)
      .bind(token)
      .execute(&self.pool)
      .await
      .map_err(AppError::Sqlx)?;
    Ok(())
  }
}

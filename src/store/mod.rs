// src/store/mod.rs

//! Storage strategy layer.
//!
//! The catalog, borrowing, cart and user aggregates are reached through
//! per-aggregate repository traits, bundled into a [`Backend`] handle that is
//! built exactly once at startup and injected through the application state.
//! Two implementations exist: [`memory::MemoryStore`] (demo/fallback mode,
//! also the test double) and [`postgres::PgStore`] (live mode).

pub mod memory;
pub mod postgres;
pub mod subscription;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Book, Borrowing, CartItem, User};
use subscription::Subscription;

/// Borrow request recorded against a book with available stock.
#[derive(Debug, Clone)]
pub struct CreateBorrowing {
  pub user_id: Uuid,
  pub book_id: Uuid,
  pub borrowed_at: DateTime<Utc>,
}

/// Return of an active borrowing, with optional damage assessment.
#[derive(Debug, Clone)]
pub struct MarkReturned {
  pub borrowing_id: Uuid,
  pub user_id: Uuid,
  pub returned_at: DateTime<Utc>,
  pub damage_count: i32,
  pub damage_note: String,
}

#[derive(Debug, Clone, Default)]
pub struct BorrowingFilter {
  pub user_id: Option<Uuid>,
  pub book_id: Option<Uuid>,
  pub is_returned: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub email: String,
  pub password_hash: String,
  pub display_name: Option<String>,
}

#[async_trait]
pub trait BookRepository: Send + Sync {
  async fn find_all(&self) -> Result<Vec<Book>>;
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>>;
  /// Live view of the whole catalog; re-delivers the full list on every
  /// stock change.
  async fn subscribe_all(&self) -> Result<Subscription<Vec<Book>>>;
}

#[async_trait]
pub trait BorrowingRepository: Send + Sync {
  /// Atomically claims one copy (stock must be > 0) and inserts the
  /// borrowing record. Fails `OutOfStock` when no copy is left,
  /// `AlreadyBorrowed` when the user already holds this book, and
  /// `NotFound` when the book record is gone.
  async fn create_if_in_stock(&self, event: CreateBorrowing) -> Result<Borrowing>;

  /// Atomically closes an active borrowing: requires `is_returned = false`
  /// and a matching `user_id`, records the return timestamp, late days,
  /// fine and damage fields, and credits the stock back. A missing book
  /// record is tolerated; the credit is skipped.
  async fn mark_returned(&self, event: MarkReturned) -> Result<Borrowing>;

  async fn find(&self, filter: BorrowingFilter) -> Result<Vec<Borrowing>>;

  /// Live view of one user's borrowings (active and historical).
  async fn subscribe(&self, user_id: Uuid) -> Result<Subscription<Vec<Borrowing>>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
  /// Idempotent upsert keyed by `(user_id, book_id)`.
  async fn upsert(&self, item: CartItem) -> Result<()>;
  /// Deleting an absent entry is a no-op.
  async fn delete(&self, user_id: Uuid, book_id: Uuid) -> Result<()>;
  /// The user's cart, oldest entry first.
  async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<CartItem>>;
  async fn subscribe(&self, user_id: Uuid) -> Result<Subscription<Vec<CartItem>>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
  async fn create(&self, new_user: NewUser) -> Result<User>;
  async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
  async fn store_password_reset(&self, user_id: Uuid, token: &str) -> Result<()>;
}

/// Bundle of repository handles behind one cloneable value.
#[derive(Clone)]
pub struct Backend {
  books: Arc<dyn BookRepository>,
  borrowings: Arc<dyn BorrowingRepository>,
  cart: Arc<dyn CartRepository>,
  users: Arc<dyn UserRepository>,
}

impl Backend {
  pub fn new(
    books: Arc<dyn BookRepository>,
    borrowings: Arc<dyn BorrowingRepository>,
    cart: Arc<dyn CartRepository>,
    users: Arc<dyn UserRepository>,
  ) -> Self {
    Self {
      books,
      borrowings,
      cart,
      users,
    }
  }

  /// Empty in-memory backend.
  pub fn memory() -> Self {
    let store = Arc::new(memory::MemoryStore::new());
    Self::new(store.clone(), store.clone(), store.clone(), store)
  }

  /// In-memory backend seeded with the sample catalog and demo account.
  pub fn demo() -> Result<Self> {
    let store = Arc::new(memory::MemoryStore::with_sample_data()?);
    Ok(Self::new(store.clone(), store.clone(), store.clone(), store))
  }

  /// Live backend over an established PostgreSQL pool.
  pub fn postgres(pool: sqlx::PgPool) -> Self {
    Self::postgres_store(Arc::new(postgres::PgStore::new(pool)))
  }

  /// Live backend from an already-built store (used when the caller still
  /// needs the concrete handle, e.g. for seeding).
  pub fn postgres_store(store: Arc<postgres::PgStore>) -> Self {
    Self::new(store.clone(), store.clone(), store.clone(), store)
  }

  pub fn books(&self) -> &dyn BookRepository {
    self.books.as_ref()
  }

  pub fn books_handle(&self) -> Arc<dyn BookRepository> {
    self.books.clone()
  }

  pub fn borrowings(&self) -> &dyn BorrowingRepository {
    self.borrowings.as_ref()
  }

  pub fn cart(&self) -> &dyn CartRepository {
    self.cart.as_ref()
  }

  pub fn users(&self) -> &dyn UserRepository {
    self.users.as_ref()
  }
}

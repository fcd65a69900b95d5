// src/store/memory.rs

//! In-memory store: demo/fallback mode and the test double.
//!
//! Every aggregate lives under a `parking_lot` lock, so the conditional
//! stock updates are trivially atomic: the whole claim (stock check,
//! decrement, record insert) happens under one write guard.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{borrowing, due_status, late_fee_cents, Book, Borrowing, CartItem, User};
use crate::services::auth;

use super::subscription::{SubscriberSet, Subscription};
use super::{
  BookRepository, BorrowingFilter, BorrowingRepository, CartRepository, CreateBorrowing, MarkReturned, NewUser,
  UserRepository,
};

pub struct MemoryStore {
  books: RwLock<HashMap<Uuid, Book>>,
  borrowings: RwLock<HashMap<Uuid, Borrowing>>,
  cart: RwLock<HashMap<(Uuid, Uuid), CartItem>>,
  users: RwLock<HashMap<Uuid, User>>,
  password_resets: RwLock<Vec<(Uuid, String)>>,
  book_subs: SubscriberSet<(), Vec<Book>>,
  borrowing_subs: SubscriberSet<Uuid, Vec<Borrowing>>,
  cart_subs: SubscriberSet<Uuid, Vec<CartItem>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self {
      books: RwLock::new(HashMap::new()),
      borrowings: RwLock::new(HashMap::new()),
      cart: RwLock::new(HashMap::new()),
      users: RwLock::new(HashMap::new()),
      password_resets: RwLock::new(Vec::new()),
      book_subs: SubscriberSet::new(),
      borrowing_subs: SubscriberSet::new(),
      cart_subs: SubscriberSet::new(),
    }
  }

  /// Store seeded with the sample catalog and the demo account, used when no
  /// live backend is configured or reachable.
  pub fn with_sample_data() -> Result<Self> {
    let store = Self::new();
    {
      let mut books = store.books.write();
      for book in sample_books() {
        books.insert(book.id, book);
      }
    }
    let demo_user = User {
      id: demo_user_id(),
      email: "demo@librify.app".to_string(),
      password_hash: auth::hash_password("demo-password")?,
      display_name: Some("Demo User".to_string()),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    };
    store.users.write().insert(demo_user.id, demo_user);
    Ok(store)
  }

  fn current_books(&self) -> Vec<Book> {
    let mut all: Vec<Book> = self.books.read().values().cloned().collect();
    all.sort_by(|a, b| a.title.cmp(&b.title));
    all
  }

  fn current_borrowings(&self, filter: &BorrowingFilter) -> Vec<Borrowing> {
    let guard = self.borrowings.read();
    let mut matched: Vec<Borrowing> = guard
      .values()
      .filter(|b| filter.user_id.map_or(true, |u| b.user_id == u))
      .filter(|b| filter.book_id.map_or(true, |id| b.book_id == id))
      .filter(|b| filter.is_returned.map_or(true, |r| b.is_returned == r))
      .cloned()
      .collect();
    matched.sort_by(|a, b| b.borrow_date.cmp(&a.borrow_date));
    matched
  }

  fn current_cart(&self, user_id: Uuid) -> Vec<CartItem> {
    let guard = self.cart.read();
    let mut items: Vec<CartItem> = guard
      .values()
      .filter(|item| item.user_id == user_id)
      .cloned()
      .collect();
    items.sort_by(|a, b| a.added_at.cmp(&b.added_at));
    items
  }

  fn publish_books(&self) {
    self.book_subs.push(&(), self.current_books());
  }

  fn publish_borrowings(&self, user_id: Uuid) {
    let set = self.current_borrowings(&BorrowingFilter {
      user_id: Some(user_id),
      ..BorrowingFilter::default()
    });
    self.borrowing_subs.push(&user_id, set);
  }

  fn publish_cart(&self, user_id: Uuid) {
    self.cart_subs.push(&user_id, self.current_cart(user_id));
  }
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl BookRepository for MemoryStore {
  async fn find_all(&self) -> Result<Vec<Book>> {
    Ok(self.current_books())
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>> {
    Ok(self.books.read().get(&id).cloned())
  }

  async fn subscribe_all(&self) -> Result<Subscription<Vec<Book>>> {
    Ok(self.book_subs.subscribe((), self.current_books()))
  }
}

#[async_trait]
impl BorrowingRepository for MemoryStore {
  async fn create_if_in_stock(&self, event: CreateBorrowing) -> Result<Borrowing> {
    let created = {
      let mut books = self.books.write();
      let mut borrowings = self.borrowings.write();

      let already_active = borrowings
        .values()
        .any(|b| b.user_id == event.user_id && b.book_id == event.book_id && !b.is_returned);
      if already_active {
        return Err(AppError::AlreadyBorrowed);
      }

      let book = books
        .get_mut(&event.book_id)
        .ok_or_else(|| AppError::NotFound("Buku tidak ditemukan".to_string()))?;
      if book.stock <= 0 {
        return Err(AppError::OutOfStock {
          title: book.title.clone(),
        });
      }
      book.stock -= 1;
      book.updated_at = event.borrowed_at;

      let record = Borrowing {
        id: Uuid::new_v4(),
        user_id: event.user_id,
        book_id: event.book_id,
        title: book.title.clone(),
        borrow_date: event.borrowed_at,
        return_due_date: Borrowing::due_date_for(event.borrowed_at),
        is_returned: false,
        returned_at: None,
        days_late: 0,
        damage_count: 0,
        damage_note: String::new(),
        fine_cents: 0,
      };
      borrowings.insert(record.id, record.clone());
      record
    };

    self.publish_books();
    self.publish_borrowings(event.user_id);
    Ok(created)
  }

  async fn mark_returned(&self, event: MarkReturned) -> Result<Borrowing> {
    let updated = {
      let mut borrowings = self.borrowings.write();
      let record = borrowings
        .get_mut(&event.borrowing_id)
        .ok_or_else(|| AppError::NotFound("Peminjaman tidak ditemukan".to_string()))?;

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
      record.is_returned = true;
      record.returned_at = Some(event.returned_at);
      record.days_late = days_late as i32;
      record.fine_cents = late_fee_cents(days_late);
      record.damage_count = event.damage_count;
      record.damage_note = event.damage_note.clone();
      record.clone()
    };

    // The book may have been removed from the catalog since the borrow; the
    // stock credit is skipped in that case.
    {
      let mut books = self.books.write();
      if let Some(book) = books.get_mut(&updated.book_id) {
        book.stock += 1;
        book.updated_at = event.returned_at;
      }
    }

    self.publish_books();
    self.publish_borrowings(updated.user_id);
    Ok(updated)
  }

  async fn find(&self, filter: BorrowingFilter) -> Result<Vec<Borrowing>> {
    Ok(self.current_borrowings(&filter))
  }

  async fn subscribe(&self, user_id: Uuid) -> Result<Subscription<Vec<Borrowing>>> {
    let initial = self.current_borrowings(&BorrowingFilter {
      user_id: Some(user_id),
      ..BorrowingFilter::default()
    });
    Ok(self.borrowing_subs.subscribe(user_id, initial))
  }
}

#[async_trait]
impl CartRepository for MemoryStore {
  async fn upsert(&self, item: CartItem) -> Result<()> {
    let user_id = item.user_id;
    self.cart.write().insert((item.user_id, item.book_id), item);
    self.publish_cart(user_id);
    Ok(())
  }

  async fn delete(&self, user_id: Uuid, book_id: Uuid) -> Result<()> {
    let removed = self.cart.write().remove(&(user_id, book_id));
    if removed.is_some() {
      self.publish_cart(user_id);
    }
    Ok(())
  }

  async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
    Ok(self.current_cart(user_id))
  }

  async fn subscribe(&self, user_id: Uuid) -> Result<Subscription<Vec<CartItem>>> {
    Ok(self.cart_subs.subscribe(user_id, self.current_cart(user_id)))
  }
}

#[async_trait]
impl UserRepository for MemoryStore {
  async fn create(&self, new_user: NewUser) -> Result<User> {
    let mut users = self.users.write();
    if users.values().any(|u| u.email == new_user.email) {
      return Err(AppError::Validation("Email sudah terdaftar".to_string()));
    }
    let now = Utc::now();
    let user = User {
      id: Uuid::new_v4(),
      email: new_user.email,
      password_hash: new_user.password_hash,
      display_name: new_user.display_name,
      created_at: now,
      updated_at: now,
    };
    users.insert(user.id, user.clone());
    Ok(user)
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(self.users.read().values().find(|u| u.email == email).cloned())
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.users.read().get(&id).cloned())
  }

  async fn store_password_reset(&self, user_id: Uuid, token: &str) -> Result<()> {
    self.password_resets.write().push((user_id, token.to_string()));
    Ok(())
  }
}

pub fn demo_user_id() -> Uuid {
  Uuid::from_u128(0xD0)
}

/// The fixed catalog served in demo mode.
pub fn sample_books() -> Vec<Book> {
  let entries: [(u128, &str, &str, &str, i32, &str); 6] = [
    (
      1,
      "The Psychology of Money",
      "Morgan Housel",
      "Finance",
      5,
      "Timeless lessons on wealth, greed, and happiness.",
    ),
    (
      2,
      "Atomic Habits",
      "James Clear",
      "Productivity",
      3,
      "An easy & proven way to build good habits & break bad ones.",
    ),
    (
      3,
      "Deep Work",
      "Cal Newport",
      "Productivity",
      2,
      "Rules for focused success in a distracted world.",
    ),
    (4, "Sapiens", "Yuval Noah Harari", "History", 7, "A brief history of humankind."),
    (
      5,
      "The Lean Startup",
      "Eric Ries",
      "Business",
      4,
      "How today's entrepreneurs use continuous innovation.",
    ),
    (
      6,
      "Ikigai",
      "Héctor García and Francesc Miralles",
      "Self-Help",
      6,
      "The Japanese secret to a long and happy life.",
    ),
  ];

  let now = Utc::now();
  entries
    .into_iter()
    .map(|(raw_id, title, author, category, stock, description)| Book {
      id: Uuid::from_u128(raw_id),
      title: title.to_string(),
      author: author.to_string(),
      category: category.to_string(),
      stock,
      cover_url: Some("/placeholder.svg?height=300&width=200".to_string()),
      description: Some(description.to_string()),
      created_at: now,
      updated_at: now,
    })
    .collect()
}

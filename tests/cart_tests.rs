// tests/cart_tests.rs
mod common;

use common::*;
use librify::errors::AppError;
use librify::services::{borrowing, cart};
use librify::store::BorrowingFilter;
use std::collections::HashSet;
use uuid::Uuid;

#[tokio::test]
async fn add_to_cart_requires_a_session() {
  setup_tracing();
  let backend = demo_backend();

  let result = cart::add_to_cart(&backend, None, sample_book_id(1)).await;
  assert!(matches!(result, Err(AppError::Unauthenticated)));
}

#[tokio::test]
async fn adding_the_same_book_twice_keeps_one_entry() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();
  let ikigai = sample_book_id(6);

  cart::add_to_cart(&backend, user, ikigai).await.unwrap();
  cart::add_to_cart(&backend, user, ikigai).await.unwrap();

  let lines = cart::list_cart(&backend, user).await.unwrap();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0].item.book_id, ikigai);
  assert_eq!(lines[0].item.quantity, 1);
}

#[tokio::test]
async fn adding_an_unknown_book_is_not_found() {
  setup_tracing();
  let backend = demo_backend();

  let result = cart::add_to_cart(&backend, some_user(), Uuid::new_v4()).await;
  assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn removing_an_absent_entry_is_a_no_op() {
  setup_tracing();
  let backend = demo_backend();

  cart::remove_from_cart(&backend, some_user(), sample_book_id(1))
    .await
    .unwrap();
}

#[tokio::test]
async fn cart_listing_reports_live_stock() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();
  let deep_work = sample_book_id(3); // seeded with 2 copies

  cart::add_to_cart(&backend, user, deep_work).await.unwrap();

  // Another reader takes a copy after the item went into the cart: the cart
  // holds no reservation, so the listing must show the reduced stock.
  borrowing::borrow_book(&backend, some_user(), deep_work).await.unwrap();

  let lines = cart::list_cart(&backend, user).await.unwrap();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0].stock, 1);
  assert!(!lines[0].is_out_of_stock());
}

#[tokio::test]
async fn batch_borrow_skips_exhausted_items_and_keeps_them_in_cart() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();
  let atomic_habits = sample_book_id(2);
  let deep_work = sample_book_id(3);

  cart::add_to_cart(&backend, user, atomic_habits).await.unwrap();
  cart::add_to_cart(&backend, user, deep_work).await.unwrap();

  // Other readers exhaust Deep Work before the batch runs.
  borrowing::borrow_book(&backend, some_user(), deep_work).await.unwrap();
  borrowing::borrow_book(&backend, some_user(), deep_work).await.unwrap();

  let selected: HashSet<Uuid> = [atomic_habits, deep_work].into_iter().collect();
  let outcome = borrowing::borrow_selected(&backend, user, &selected).await.unwrap();

  assert_eq!(outcome.borrowed, 1);
  assert_eq!(outcome.skipped, 1);

  // Exactly one borrowing was created for this user, and only the
  // out-of-stock item is still in the cart.
  let created = backend
    .borrowings()
    .find(BorrowingFilter {
      user_id: user,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(created.len(), 1);
  assert_eq!(created[0].book_id, atomic_habits);

  let lines = cart::list_cart(&backend, user).await.unwrap();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0].item.book_id, deep_work);
  assert!(lines[0].is_out_of_stock());
}

#[tokio::test]
async fn batch_borrow_only_touches_selected_items() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();
  let sapiens = sample_book_id(4);
  let lean_startup = sample_book_id(5);

  cart::add_to_cart(&backend, user, sapiens).await.unwrap();
  cart::add_to_cart(&backend, user, lean_startup).await.unwrap();

  let selected: HashSet<Uuid> = [sapiens].into_iter().collect();
  let outcome = borrowing::borrow_selected(&backend, user, &selected).await.unwrap();

  assert_eq!(outcome.borrowed, 1);
  assert_eq!(outcome.skipped, 0);

  let lines = cart::list_cart(&backend, user).await.unwrap();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0].item.book_id, lean_startup);
}

#[tokio::test]
async fn batch_borrow_with_nothing_available_reports_zero() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();
  let deep_work = sample_book_id(3);

  cart::add_to_cart(&backend, user, deep_work).await.unwrap();
  borrowing::borrow_book(&backend, some_user(), deep_work).await.unwrap();
  borrowing::borrow_book(&backend, some_user(), deep_work).await.unwrap();

  let selected: HashSet<Uuid> = [deep_work].into_iter().collect();
  let outcome = borrowing::borrow_selected(&backend, user, &selected).await.unwrap();

  assert_eq!(outcome.borrowed, 0);
  assert_eq!(outcome.skipped, 1);
  assert_eq!(outcome.message, "Tidak ada buku yang dapat dipinjam.");
}

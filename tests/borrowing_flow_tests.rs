// tests/borrowing_flow_tests.rs
mod common;

use common::*;
use librify::errors::AppError;
use librify::services::borrowing::{self, ReturnRequest};
use uuid::Uuid;

#[tokio::test]
async fn borrow_decrements_stock_and_sets_due_date() {
  setup_tracing();
  let backend = demo_backend();
  let atomic_habits = sample_book_id(2);

  let outcome = borrowing::borrow_book(&backend, some_user(), atomic_habits)
    .await
    .unwrap();

  let record = &outcome.borrowing;
  assert!(!record.is_returned);
  assert_eq!(record.title, "Atomic Habits");
  assert_eq!(record.return_due_date, record.borrow_date + chrono::Duration::days(7));
  assert_eq!(record.days_late, 0);
  assert_eq!(record.damage_count, 0);
  assert_eq!(record.fine_cents, 0);

  let book = backend.books().find_by_id(atomic_habits).await.unwrap().unwrap();
  assert_eq!(book.stock, 2); // seeded with 3
}

#[tokio::test]
async fn borrow_without_session_is_rejected() {
  setup_tracing();
  let backend = demo_backend();

  let result = borrowing::borrow_book(&backend, None, sample_book_id(1)).await;
  assert!(matches!(result, Err(AppError::Unauthenticated)));
}

#[tokio::test]
async fn borrow_of_unknown_book_is_not_found() {
  setup_tracing();
  let backend = demo_backend();

  let result = borrowing::borrow_book(&backend, some_user(), Uuid::new_v4()).await;
  assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn exhausted_book_cannot_be_borrowed() {
  setup_tracing();
  let backend = demo_backend();
  let deep_work = sample_book_id(3); // seeded with 2 copies

  borrowing::borrow_book(&backend, some_user(), deep_work).await.unwrap();
  borrowing::borrow_book(&backend, some_user(), deep_work).await.unwrap();

  let result = borrowing::borrow_book(&backend, some_user(), deep_work).await;
  match result {
    Err(AppError::OutOfStock { title }) => assert_eq!(title, "Deep Work"),
    other => panic!("expected OutOfStock, got {:?}", other.map(|o| o.message)),
  }

  // Stock never went negative and no third record was created.
  let book = backend.books().find_by_id(deep_work).await.unwrap().unwrap();
  assert_eq!(book.stock, 0);
  let all = backend
    .borrowings()
    .find(librify::store::BorrowingFilter {
      book_id: Some(deep_work),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn at_most_one_active_borrowing_per_user_and_book() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();
  let sapiens = sample_book_id(4);

  borrowing::borrow_book(&backend, user, sapiens).await.unwrap();
  assert!(borrowing::check_active_borrowing(&backend, user.unwrap(), sapiens)
    .await
    .unwrap());

  let again = borrowing::borrow_book(&backend, user, sapiens).await;
  assert!(matches!(again, Err(AppError::AlreadyBorrowed)));

  let active = backend
    .borrowings()
    .find(librify::store::BorrowingFilter {
      user_id: user,
      book_id: Some(sapiens),
      is_returned: Some(false),
    })
    .await
    .unwrap();
  assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn return_flow_credits_stock_back() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();
  let atomic_habits = sample_book_id(2);

  let borrowed = borrowing::borrow_book(&backend, user, atomic_habits).await.unwrap();
  let outcome = borrowing::return_book(&backend, user, borrowed.borrowing.id, ReturnRequest::default())
    .await
    .unwrap();

  let record = &outcome.borrowing;
  assert!(record.is_returned);
  assert!(record.returned_at.is_some());
  assert_eq!(record.days_late, 0);
  assert_eq!(record.fine_cents, 0);

  let book = backend.books().find_by_id(atomic_habits).await.unwrap().unwrap();
  assert_eq!(book.stock, 3); // back to the seeded count

  // The user can borrow the book again once it is returned.
  assert!(!borrowing::check_active_borrowing(&backend, user.unwrap(), atomic_habits)
    .await
    .unwrap());
  borrowing::borrow_book(&backend, user, atomic_habits).await.unwrap();
}

#[tokio::test]
async fn double_return_is_rejected_and_stock_credited_once() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();
  let ikigai = sample_book_id(6);

  let borrowed = borrowing::borrow_book(&backend, user, ikigai).await.unwrap();
  borrowing::return_book(&backend, user, borrowed.borrowing.id, ReturnRequest::default())
    .await
    .unwrap();

  let again = borrowing::return_book(&backend, user, borrowed.borrowing.id, ReturnRequest::default()).await;
  assert!(matches!(again, Err(AppError::AlreadyReturned)));

  let book = backend.books().find_by_id(ikigai).await.unwrap().unwrap();
  assert_eq!(book.stock, 6); // seeded count, credited exactly once
}

#[tokio::test]
async fn returning_someone_elses_borrowing_is_forbidden() {
  setup_tracing();
  let backend = demo_backend();
  let owner = some_user();
  let intruder = some_user();

  let borrowed = borrowing::borrow_book(&backend, owner, sample_book_id(5)).await.unwrap();

  let result = borrowing::return_book(&backend, intruder, borrowed.borrowing.id, ReturnRequest::default()).await;
  assert!(matches!(result, Err(AppError::Forbidden(_))));

  // Still open for the rightful owner.
  let active = borrowing::check_active_borrowing(&backend, owner.unwrap(), sample_book_id(5))
    .await
    .unwrap();
  assert!(active);
}

#[tokio::test]
async fn return_of_unknown_borrowing_is_not_found() {
  setup_tracing();
  let backend = demo_backend();

  let result = borrowing::return_book(&backend, some_user(), Uuid::new_v4(), ReturnRequest::default()).await;
  assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn damage_report_is_recorded_on_return() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();

  let borrowed = borrowing::borrow_book(&backend, user, sample_book_id(1)).await.unwrap();
  let request = ReturnRequest {
    damage_count: 2,
    damage_note: "Sampul sobek".to_string(),
  };
  let outcome = borrowing::return_book(&backend, user, borrowed.borrowing.id, request)
    .await
    .unwrap();

  assert_eq!(outcome.borrowing.damage_count, 2);
  assert_eq!(outcome.borrowing.damage_note, "Sampul sobek");
}

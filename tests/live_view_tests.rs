// tests/live_view_tests.rs
//
// Live views: full-snapshot subscriptions over the stores, and the
// notification projection derived from them.

mod common;

use chrono::{Duration, Utc};
use common::*;
use librify::models::{Borrowing, DueStatus};
use librify::services::borrowing::{self, ReturnRequest};
use librify::services::cart;
use librify::services::notifications::{build_alerts, NotificationFeed};
use uuid::Uuid;

fn handmade_borrowing(title: &str, due_in_days: i64, is_returned: bool) -> Borrowing {
  let now = Utc::now();
  Borrowing {
    id: Uuid::new_v4(),
    user_id: Uuid::new_v4(),
    book_id: Uuid::new_v4(),
    title: title.to_string(),
    borrow_date: now - Duration::days(7 - due_in_days),
    return_due_date: now + Duration::days(due_in_days),
    is_returned,
    returned_at: is_returned.then(|| now),
    days_late: 0,
    damage_count: 0,
    damage_note: String::new(),
    fine_cents: 0,
  }
}

#[tokio::test]
async fn borrowing_subscription_redelivers_full_set_on_change() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();

  let mut sub = backend.borrowings().subscribe(user.unwrap()).await.unwrap();
  assert!(sub.snapshot().is_empty());

  let borrowed = borrowing::borrow_book(&backend, user, sample_book_id(2)).await.unwrap();
  let after_borrow = sub.changed().await.unwrap();
  assert_eq!(after_borrow.len(), 1);
  assert!(!after_borrow[0].is_returned);

  borrowing::return_book(&backend, user, borrowed.borrowing.id, ReturnRequest::default())
    .await
    .unwrap();
  let after_return = sub.changed().await.unwrap();
  assert_eq!(after_return.len(), 1); // history is kept
  assert!(after_return[0].is_returned);
}

#[tokio::test]
async fn borrowing_subscription_is_scoped_to_its_user() {
  setup_tracing();
  let backend = demo_backend();
  let watcher = some_user();

  let sub = backend.borrowings().subscribe(watcher.unwrap()).await.unwrap();

  // Someone else borrowing must not show up in this user's view.
  borrowing::borrow_book(&backend, some_user(), sample_book_id(4)).await.unwrap();
  assert!(sub.snapshot().is_empty());
}

#[tokio::test]
async fn catalog_subscription_sees_stock_movement() {
  setup_tracing();
  let backend = demo_backend();
  let atomic_habits = sample_book_id(2);

  let mut sub = backend.books().subscribe_all().await.unwrap();
  let initial = sub.snapshot();
  let seeded = initial.iter().find(|b| b.id == atomic_habits).unwrap().stock;

  borrowing::borrow_book(&backend, some_user(), atomic_habits).await.unwrap();

  let updated = sub.changed().await.unwrap();
  let now_stock = updated.iter().find(|b| b.id == atomic_habits).unwrap().stock;
  assert_eq!(now_stock, seeded - 1);
}

#[tokio::test]
async fn cart_subscription_redelivers_on_add_and_remove() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();

  let mut sub = backend.cart().subscribe(user.unwrap()).await.unwrap();

  cart::add_to_cart(&backend, user, sample_book_id(1)).await.unwrap();
  assert_eq!(sub.changed().await.unwrap().len(), 1);

  cart::remove_from_cart(&backend, user, sample_book_id(1)).await.unwrap();
  assert!(sub.changed().await.unwrap().is_empty());
}

#[tokio::test]
async fn notification_feed_tracks_borrow_and_return() {
  setup_tracing();
  let backend = demo_backend();
  let user = some_user();

  let mut feed = NotificationFeed::open(&backend, user.unwrap()).await.unwrap();
  assert!(feed.current(Utc::now()).is_empty());

  let borrowed = borrowing::borrow_book(&backend, user, sample_book_id(2)).await.unwrap();
  let alerts = feed.changed(Utc::now()).await.unwrap();
  assert_eq!(alerts.len(), 1);
  assert_eq!(alerts[0].title, "Atomic Habits");
  assert_eq!(alerts[0].status, DueStatus::DueIn { days_remaining: 7 });

  borrowing::return_book(&backend, user, borrowed.borrowing.id, ReturnRequest::default())
    .await
    .unwrap();
  let after_return = feed.changed(Utc::now()).await.unwrap();
  assert!(after_return.is_empty());
}

#[test]
fn alerts_skip_returned_and_untitled_records() {
  let now = Utc::now();
  let borrowings = vec![
    handmade_borrowing("Sapiens", 3, false),
    handmade_borrowing("", 1, false),        // no title snapshot, nothing to show
    handmade_borrowing("Deep Work", 2, true), // already returned
  ];

  let alerts = build_alerts(&borrowings, now);
  assert_eq!(alerts.len(), 1);
  assert_eq!(alerts[0].title, "Sapiens");
}

#[test]
fn alerts_are_ordered_by_due_date_and_flag_overdue() {
  let now = Utc::now();
  let mut late = handmade_borrowing("Ikigai", 0, false);
  late.return_due_date = now - Duration::days(1);
  let soon = handmade_borrowing("Sapiens", 4, false);

  let alerts = build_alerts(&[soon, late], now);
  assert_eq!(alerts.len(), 2);
  assert_eq!(alerts[0].title, "Ikigai");
  assert_eq!(alerts[0].status, DueStatus::Overdue { days_late: 1 });
  assert_eq!(alerts[1].title, "Sapiens");
  assert!(!alerts[1].status.is_overdue());
}

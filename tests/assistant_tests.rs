// tests/assistant_tests.rs
mod common;

use common::*;
use librify::assistant::Assistant;
use librify::services::borrowing;

#[tokio::test]
async fn policy_rule_answers_without_touching_the_catalog() {
  setup_tracing();
  let assistant = Assistant::new(&demo_backend());

  let reply = assistant.respond("Boleh bawa makanan ke perpustakaan?").await;
  assert!(reply.contains("tidak diperbolehkan membawa"));
}

#[tokio::test]
async fn stock_query_reads_the_live_catalog() {
  setup_tracing();
  let backend = demo_backend();
  let assistant = Assistant::new(&backend);

  let before = assistant.respond("stok buku ikigai").await;
  assert!(before.ends_with(": 6"), "unexpected reply: {before}");

  borrowing::borrow_book(&backend, some_user(), sample_book_id(6))
    .await
    .unwrap();

  let after = assistant.respond("stok buku ikigai").await;
  assert!(after.ends_with(": 5"), "unexpected reply: {after}");
}

#[tokio::test]
async fn greetings_are_matched_in_both_languages() {
  setup_tracing();
  let assistant = Assistant::new(&demo_backend());

  assert!(assistant.respond("Selamat pagi").await.starts_with("Halo!"));
  assert!(assistant.respond("good morning").await.starts_with("Hello!"));
}

#[tokio::test]
async fn unknown_chatter_falls_back_politely() {
  setup_tracing();
  let assistant = Assistant::new(&demo_backend());

  let reply = assistant.respond("quantum flux capacitors").await;
  assert!(reply.contains("rephrase"));
}

#[tokio::test]
async fn empty_message_never_panics() {
  setup_tracing();
  let assistant = Assistant::new(&demo_backend());

  let reply = assistant.respond("   ").await;
  assert!(!reply.is_empty());
}

#[tokio::test]
async fn borrowing_policy_is_quoted_from_library_info() {
  setup_tracing();
  let assistant = Assistant::new(&demo_backend());

  let reply = assistant.respond("how long can I borrow a book?").await;
  assert!(reply.contains("7 days"), "unexpected reply: {reply}");
}

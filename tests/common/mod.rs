// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use librify::store::Backend;
use once_cell::sync::Lazy;
use tracing::Level;
use uuid::Uuid;

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// In-memory backend pre-seeded with the sample catalog and demo account.
pub fn demo_backend() -> Backend {
  Backend::demo().expect("demo backend should seed")
}

/// Id of the n-th sample book (1 = The Psychology of Money, 2 = Atomic
/// Habits, 3 = Deep Work, 4 = Sapiens, 5 = The Lean Startup, 6 = Ikigai).
pub fn sample_book_id(n: u128) -> Uuid {
  Uuid::from_u128(n)
}

pub fn some_user() -> Option<Uuid> {
  Some(Uuid::new_v4())
}

// src/models/borrowing.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Loan period applied to every new borrowing.
pub const LOAN_PERIOD_DAYS: i64 = 7;

/// Late fee charged per started day past the due date, in cents.
pub const LATE_FEE_CENTS_PER_DAY: i32 = 50;

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// One user's loan of one book, active while `is_returned` is false.
/// Rows are never deleted; returned borrowings are the lending history.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Borrowing {
  pub id: Uuid,
  pub user_id: Uuid,
  pub book_id: Uuid,
  /// Title snapshot taken at borrow time. The book record may change or
  /// disappear afterwards; display falls back to this copy.
  pub title: String,
  pub borrow_date: DateTime<Utc>,
  pub return_due_date: DateTime<Utc>,
  pub is_returned: bool,
  pub returned_at: Option<DateTime<Utc>>,
  pub days_late: i32,
  pub damage_count: i32,
  pub damage_note: String,
  pub fine_cents: i32,
}

impl Borrowing {
  pub fn due_date_for(borrow_date: DateTime<Utc>) -> DateTime<Utc> {
    borrow_date + Duration::days(LOAN_PERIOD_DAYS)
  }

  pub fn status_at(&self, now: DateTime<Utc>) -> DueStatus {
    due_status(self.return_due_date, now)
  }
}

/// Position of a borrowing relative to its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DueStatus {
  #[serde(rename_all = "camelCase")]
  Overdue { days_late: i64 },
  #[serde(rename_all = "camelCase")]
  DueIn { days_remaining: i64 },
}

impl DueStatus {
  pub fn is_overdue(&self) -> bool {
    matches!(self, DueStatus::Overdue { .. })
  }
}

/// Shared due-date computation used by both the history and the notification
/// views, so the two can never drift apart.
///
/// Overdue once `now` is strictly past the due date; day counts round up, so
/// one second past the deadline already counts as one day late.
pub fn due_status(return_due_date: DateTime<Utc>, now: DateTime<Utc>) -> DueStatus {
  if now > return_due_date {
    DueStatus::Overdue {
      days_late: ceil_days(now - return_due_date),
    }
  } else {
    DueStatus::DueIn {
      days_remaining: ceil_days(return_due_date - now),
    }
  }
}

/// Fine for returning `days_late` days past the due date.
pub fn late_fee_cents(days_late: i64) -> i32 {
  i32::try_from(days_late).unwrap_or(i32::MAX / LATE_FEE_CENTS_PER_DAY) * LATE_FEE_CENTS_PER_DAY
}

fn ceil_days(delta: Duration) -> i64 {
  let secs = delta.num_seconds().max(0);
  (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
}

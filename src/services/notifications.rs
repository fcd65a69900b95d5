// src/services/notifications.rs

//! Due-date notifications: a read-only projection over the borrowing
//! subscription. No state of its own; dropping the feed cancels the
//! underlying subscription.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Borrowing, DueStatus};
use crate::store::subscription::Subscription;
use crate::store::Backend;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueAlert {
  pub borrowing_id: Uuid,
  pub title: String,
  pub return_due_date: DateTime<Utc>,
  pub status: DueStatus,
}

/// Alerts for the active borrowings in `borrowings`, newest due date last.
/// Records without a title snapshot carry nothing to display and are
/// skipped, as are returned borrowings.
pub fn build_alerts(borrowings: &[Borrowing], now: DateTime<Utc>) -> Vec<DueAlert> {
  let mut alerts: Vec<DueAlert> = borrowings
    .iter()
    .filter(|b| !b.is_returned && !b.title.is_empty())
    .map(|b| DueAlert {
      borrowing_id: b.id,
      title: b.title.clone(),
      return_due_date: b.return_due_date,
      status: b.status_at(now),
    })
    .collect();
  alerts.sort_by(|a, b| a.return_due_date.cmp(&b.return_due_date));
  alerts
}

/// Live alert view for one user.
pub struct NotificationFeed {
  sub: Subscription<Vec<Borrowing>>,
}

impl NotificationFeed {
  pub async fn open(backend: &Backend, user_id: Uuid) -> Result<Self> {
    let sub = backend.borrowings().subscribe(user_id).await?;
    Ok(Self { sub })
  }

  /// Alerts derived from the current snapshot.
  pub fn current(&self, now: DateTime<Utc>) -> Vec<DueAlert> {
    build_alerts(&self.sub.snapshot(), now)
  }

  /// Waits for the next borrowing change and returns the recomputed alerts.
  /// `None` once the backing store has gone away.
  pub async fn changed(&mut self, now: DateTime<Utc>) -> Option<Vec<DueAlert>> {
    let borrowings = self.sub.changed().await?;
    Some(build_alerts(&borrowings, now))
  }
}

// src/store/subscription.rs

//! Full-snapshot pub/sub used by the stores for live views.
//!
//! Every delivery carries the complete current result set; consumers replace
//! their snapshot wholesale rather than applying diffs. Dropping a
//! [`Subscription`] is the unsubscribe: the publisher prunes closed channels
//! on its next publish, so cancellation needs no explicit call and cannot be
//! forgotten on an exit path.

use parking_lot::Mutex;
use tokio::sync::watch;

/// Receiving half of a live view.
#[derive(Debug)]
pub struct Subscription<T> {
  rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
  /// The most recently published full set.
  pub fn snapshot(&self) -> T {
    self.rx.borrow().clone()
  }

  /// Waits for the next re-delivery and returns the new full set.
  /// `None` once the publishing store has gone away.
  pub async fn changed(&mut self) -> Option<T> {
    self.rx.changed().await.ok()?;
    Some(self.rx.borrow_and_update().clone())
  }
}

/// Keyed registry of subscribers held by a store. `K` is the filter the
/// subscriber asked for (a user id, or `()` for unfiltered views).
pub struct SubscriberSet<K, T> {
  senders: Mutex<Vec<(K, watch::Sender<T>)>>,
}

impl<K, T> SubscriberSet<K, T>
where
  K: Clone + PartialEq,
  T: Clone,
{
  pub fn new() -> Self {
    Self {
      senders: Mutex::new(Vec::new()),
    }
  }

  /// Registers a subscriber for `key`, seeded with the current set.
  pub fn subscribe(&self, key: K, initial: T) -> Subscription<T> {
    let (tx, rx) = watch::channel(initial);
    self.senders.lock().push((key, tx));
    Subscription { rx }
  }

  /// Distinct keys that still have a live subscriber. Closed channels are
  /// pruned as a side effect.
  pub fn live_keys(&self) -> Vec<K> {
    let mut guard = self.senders.lock();
    guard.retain(|(_, tx)| !tx.is_closed());
    let mut keys: Vec<K> = Vec::new();
    for (key, _) in guard.iter() {
      if !keys.contains(key) {
        keys.push(key.clone());
      }
    }
    keys
  }

  /// Re-delivers `value` to every live subscriber registered under `key`.
  pub fn push(&self, key: &K, value: T) {
    let mut guard = self.senders.lock();
    guard.retain(|(k, tx)| {
      if k != key {
        return !tx.is_closed();
      }
      tx.send(value.clone()).is_ok()
    });
  }

  #[cfg(test)]
  pub fn subscriber_count(&self) -> usize {
    self.senders.lock().len()
  }
}

impl<K, T> Default for SubscriberSet<K, T>
where
  K: Clone + PartialEq,
  T: Clone,
{
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn subscriber_sees_initial_snapshot_then_redeliveries() {
    let set: SubscriberSet<u32, Vec<i32>> = SubscriberSet::new();
    let mut sub = set.subscribe(7, vec![1]);
    assert_eq!(sub.snapshot(), vec![1]);

    set.push(&7, vec![1, 2]);
    assert_eq!(sub.changed().await, Some(vec![1, 2]));
  }

  #[tokio::test]
  async fn push_only_reaches_matching_key() {
    let set: SubscriberSet<u32, Vec<i32>> = SubscriberSet::new();
    let other = set.subscribe(1, vec![]);
    let mut target = set.subscribe(2, vec![]);

    set.push(&2, vec![9]);
    assert_eq!(target.changed().await, Some(vec![9]));
    assert_eq!(other.snapshot(), Vec::<i32>::new());
  }

  #[tokio::test]
  async fn dropped_subscribers_are_pruned_on_publish() {
    let set: SubscriberSet<u32, Vec<i32>> = SubscriberSet::new();
    let sub = set.subscribe(1, vec![]);
    let _keep = set.subscribe(1, vec![]);
    assert_eq!(set.subscriber_count(), 2);

    drop(sub);
    set.push(&1, vec![1]);
    assert_eq!(set.subscriber_count(), 1);
  }

  #[tokio::test]
  async fn live_keys_are_deduplicated() {
    let set: SubscriberSet<u32, Vec<i32>> = SubscriberSet::new();
    let _a = set.subscribe(1, vec![]);
    let _b = set.subscribe(1, vec![]);
    let _c = set.subscribe(2, vec![]);
    assert_eq!(set.live_keys(), vec![1, 2]);
  }
}

// File: rusty-forms-live/src/debounce.rs
// Purpose: Per-field cancel-and-restart debounce for remote checks

use crate::document::FieldId;
use crate::outcome::ValidationOutcome;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Outcome of one debounced run, tagged with the run that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub generation: u64,
    pub outcome: ValidationOutcome,
}

struct Slot {
    generation: u64,
    timer: Option<JoinHandle<()>>,
    results: Arc<watch::Sender<Option<Settled>>>,
}

impl Slot {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            generation: 0,
            timer: None,
            results: Arc::new(tx),
        }
    }
}

/// Keeps at most one live timer per field.
///
/// Each [`Debouncer::run`] bumps the field's generation and aborts the
/// previous timer task, which also drops any request that task had in
/// flight. Every waiter resolves to the first published result whose
/// generation is at least its own, so callers that were superseded resolve
/// to the newest result and an older result is never published over a newer
/// one.
#[derive(Clone, Default)]
pub struct Debouncer {
    slots: Arc<Mutex<HashMap<FieldId, Slot>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait `delay` of quiet time for `field`, then run `check`.
    ///
    /// Returns `None` if the field's pending work was cancelled outright
    /// (see [`Debouncer::cancel`]) before any result at least this new was
    /// published.
    pub async fn run<F>(&self, field: &FieldId, delay: Duration, check: F) -> Option<Settled>
    where
        F: Future<Output = ValidationOutcome> + Send + 'static,
    {
        let (generation, mut results) = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(field.clone()).or_insert_with(Slot::new);

            slot.generation += 1;
            let generation = slot.generation;

            if let Some(previous) = slot.timer.take() {
                if !previous.is_finished() {
                    tracing::trace!("Superseding pending check for {} (run {})", field, generation);
                }
                previous.abort();
            }

            let publisher = Arc::clone(&slot.results);
            let results = publisher.subscribe();
            slot.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let outcome = check.await;
                publisher.send_if_modified(|latest| {
                    let newer = latest.as_ref().map_or(true, |s| s.generation < generation);
                    if newer {
                        *latest = Some(Settled { generation, outcome });
                    }
                    newer
                });
            }));

            (generation, results)
        };

        let latest = results
            .wait_for(|latest| latest.as_ref().map_or(false, |s| s.generation >= generation))
            .await
            .ok()?;
        latest.as_ref().cloned()
    }

    /// Whether `generation` is still the newest run for `field`
    pub fn is_current(&self, field: &FieldId, generation: u64) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(field).map_or(false, |slot| slot.generation == generation)
    }

    /// Whether a timer or request is still outstanding for `field`
    pub fn is_pending(&self, field: &FieldId) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(field)
            .and_then(|slot| slot.timer.as_ref())
            .map_or(false, |timer| !timer.is_finished())
    }

    /// Drop the field's timer and wake its waiters with `None`
    pub fn cancel(&self, field: &FieldId) {
        let removed = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.remove(field)
        };

        // Dropping the slot aborts its timer
        if removed.is_some() {
            tracing::debug!("Cancelled pending checks for {}", field);
        }
    }

    pub fn cancel_all(&self) {
        let drained: Vec<Slot> = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.drain().map(|(_, slot)| slot).collect()
        };

        if !drained.is_empty() {
            tracing::debug!("Cancelled pending checks for {} fields", drained.len());
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

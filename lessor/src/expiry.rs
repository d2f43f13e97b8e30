use std::sync::Arc;

use lessor_engine::Backend;
use tokio::sync::{mpsc::error::TrySendError, watch};

use crate::{inner::Inner, range_deleter::RangeDeleter, role::Role};

/// Spawn the long-lived expiry scanner. Wakes on `inner.tick`; each tick,
/// while primary, walks the table once and publishes every lease whose
/// expiry has passed onto the bounded outbound queue. A non-blocking send
/// means a full queue simply drops the batch — nothing here mutates the
/// table, so a dropped lease is rediscovered on the next tick.
///
/// Stops when `cancel_rx` observes `true`, or when the outbound queue's
/// last receiver is dropped.
pub(crate) fn spawn<B, D>(inner: Arc<Inner<B, D>>, mut cancel_rx: watch::Receiver<bool>)
where
    B: Backend,
    D: RangeDeleter,
{
    let _handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(inner.tick);
        // The first tick fires immediately; that's fine, it just means the
        // very first scan runs right after construction instead of after
        // one full period.
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = cancel_rx.changed() => {
                    if changed.is_err() || *cancel_rx.borrow() {
                        tracing::debug!("expiry loop shutting down");
                        return;
                    }
                }
            }

            let batch = {
                let state = inner.state.lock();
                if state.role == Role::Primary {
                    state
                        .table
                        .values()
                        .filter(|lease| lease.expired())
                        .cloned()
                        .collect::<Vec<_>>()
                } else {
                    Vec::new()
                }
            };

            if batch.is_empty() {
                continue;
            }

            match inner.expired_tx.try_send(batch) {
                Ok(()) => tracing::debug!("published expired lease batch"),
                Err(TrySendError::Full(dropped)) => {
                    tracing::warn!(
                        count = dropped.len(),
                        "expired-lease queue full, dropping batch for this tick"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("expired-lease consumer gone, stopping expiry loop");
                    return;
                }
            }
        }
    });
}

use std::{
    collections::HashSet,
    time::{Duration, Instant},
};

use getset::CopyGetters;

/// A far-future expiry used while a lease is not under active primary
/// management. 100 years is long enough that no real process lifetime, nor
/// any realistic clock skew, will ever cause a scan to treat it as expired.
const FOREVER: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// In-memory state for a single lease.
///
/// `items` and `expiry` are never persisted: `expiry` is recomputed on
/// every `Promote` / `Renew`, and `items` are rebuilt by the surrounding
/// system scanning the main key-value store on recovery.
#[derive(Debug, Clone, CopyGetters)]
pub struct Lease {
    /// Unique, non-zero lease identifier.
    #[getset(get_copy = "pub")]
    id: i64,
    /// Nominal inter-renewal interval.
    #[getset(get_copy = "pub")]
    ttl: Duration,
    /// Absolute instant at which this lease is next eligible for expiry.
    expiry: Instant,
    /// Application keys attached to this lease.
    items: HashSet<Vec<u8>>,
}

impl Lease {
    /// Create a new lease with an empty item set and a far-future expiry;
    /// callers refresh the expiry immediately afterwards if the lessor is
    /// primary.
    pub(crate) fn new(id: i64, ttl: Duration) -> Self {
        Self {
            id,
            ttl,
            expiry: Instant::now() + FOREVER,
            items: HashSet::new(),
        }
    }

    /// Recreate a lease from a persisted `(id, ttl)` pair during recovery.
    /// Expiry is always `forever` and the item set is always empty: both
    /// are reconstructed by the caller, not by this constructor.
    pub(crate) fn recovered(id: i64, ttl: Duration) -> Self {
        Self::new(id, ttl)
    }

    /// Reset `expiry` to `max(now + min_term, now + ttl)` and return it.
    pub(crate) fn refresh(&mut self, min_term: Duration) -> Instant {
        let now = Instant::now();
        let expiry = (now + min_term).max(now + self.ttl);
        self.expiry = expiry;
        expiry
    }

    /// Push `expiry` out to the far-future sentinel.
    pub(crate) fn forever(&mut self) {
        self.expiry = Instant::now() + FOREVER;
    }

    /// Whether this lease's expiry has already passed.
    pub(crate) fn expired(&self) -> bool {
        Instant::now() >= self.expiry
    }

    /// Time remaining until expiry, saturating at zero.
    pub(crate) fn remaining(&self) -> Duration {
        self.expiry.saturating_duration_since(Instant::now())
    }

    /// Attach `item`, collapsing duplicates.
    pub(crate) fn insert_item(&mut self, item: Vec<u8>) {
        let _ = self.items.insert(item);
    }

    /// Detach `item`. Removing an absent item is a no-op.
    pub(crate) fn remove_item(&mut self, item: &[u8]) {
        let _ = self.items.remove(item);
    }

    /// The set of application keys currently attached to this lease.
    #[must_use]
    pub fn items(&self) -> &HashSet<Vec<u8>> {
        &self.items
    }
}

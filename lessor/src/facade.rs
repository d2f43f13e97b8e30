use std::{collections::HashMap, sync::Arc, time::Duration};

use lessor_engine::Backend;
use lessor_utils::LessorConfig;
use tokio::sync::{mpsc, watch};

use crate::{
    codec,
    error::LessorError,
    expiry,
    id_gen::IdGenerator,
    inner::{Inner, State},
    lease::Lease,
    range_deleter::RangeDeleter,
    role::Role,
};

/// The lease manager: issues leases, tracks their attached items, expires
/// them while primary, and publishes expired batches for an external
/// consumer to revoke.
///
/// Cloning a `Lessor` shares the same underlying table and expiry task —
/// it is a cheap handle, not a deep copy.
pub struct Lessor<B, D>
where
    B: Backend,
    D: RangeDeleter,
{
    inner: Arc<Inner<B, D>>,
}

impl<B, D> Clone for Lessor<B, D>
where
    B: Backend,
    D: RangeDeleter,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, D> Lessor<B, D>
where
    B: Backend,
    D: RangeDeleter,
{
    /// Construct a lessor over `backend` and `range_deleter`, rehydrating
    /// the table from any persisted records, and fork the expiry loop.
    /// Starts `NonPrimary`.
    ///
    /// # Panics
    ///
    /// Panics if the persisted store is corrupt (a record fails to decode,
    /// or contains a duplicate ID) — see the fatal-on-corruption policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial backend read fails.
    pub fn new(config: &LessorConfig, backend: B, range_deleter: D) -> Result<Self, LessorError> {
        let table = load_table(&backend)?;
        backend.force_commit()?;
        let (expired_tx, expired_rx) = mpsc::channel(*config.expired_queue_capacity());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let inner = Arc::new(Inner {
            state: parking_lot::Mutex::new(State {
                role: Role::NonPrimary,
                table,
                backend,
                range_deleter,
            }),
            id_gen: IdGenerator::new(*config.replica_tag()),
            min_lease_term: config.min_lease_term(),
            tick: config.tick_interval(),
            expired_tx,
            expired_rx: parking_lot::Mutex::new(Some(expired_rx)),
            cancel_tx,
        });

        expiry::spawn(Arc::clone(&inner), cancel_rx);
        Ok(Self { inner })
    }

    /// Grant a new lease with the given TTL, in seconds.
    ///
    /// The effective expiry is clamped to at least `min_lease_term` from
    /// now; a non-primary lessor still creates the record (with a
    /// far-future expiry) so a later `Promote` can pick it up.
    ///
    /// # Panics
    ///
    /// Panics if the ID generator produces an ID already present in the
    /// table — an invariant violation indicating a broken generator.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new record fails.
    pub fn grant(&self, ttl_secs: i64) -> Result<Lease, LessorError> {
        let ttl = Duration::from_secs(ttl_secs.max(1).unsigned_abs());
        let id = self.inner.id_gen.next();

        let mut state = self.inner.state.lock();
        assert!(
            !state.table.contains_key(&id),
            "lessor: id generator produced a colliding lease id {id}",
        );

        let mut lease = Lease::new(id, ttl);
        if state.role == Role::Primary {
            let _expiry = lease.refresh(self.inner.min_lease_term);
        }
        codec::put(&state.backend, id, ttl_secs)?;
        let _prev = state.table.insert(id, lease.clone());

        tracing::debug!(lease_id = id, ttl_secs, "granted lease");
        Ok(lease)
    }

    /// Revoke a lease: delete every attached item, then the persisted
    /// record itself. Legal in any role.
    ///
    /// # Errors
    ///
    /// Returns [`LessorError::NotFound`] if `id` is unknown, or a backend /
    /// range-deleter error if a delete fails.
    pub fn revoke(&self, id: i64) -> Result<(), LessorError> {
        let mut state = self.inner.state.lock();
        let lease = state
            .table
            .get(&id)
            .cloned()
            .ok_or(LessorError::NotFound(id))?;

        for item in lease.items() {
            let _discarded = state.range_deleter.delete_range(item, &[])?;
        }
        codec::delete(&state.backend, id)?;
        let _removed = state.table.remove(&id);

        tracing::debug!(lease_id = id, "revoked lease");
        Ok(())
    }

    /// Reset a lease's expiry to a fresh full term. Only valid while
    /// primary.
    ///
    /// # Errors
    ///
    /// Returns [`LessorError::NotPrimary`] if this lessor is not primary
    /// (checked before the lookup), or [`LessorError::NotFound`] if `id`
    /// is unknown.
    pub fn renew(&self, id: i64) -> Result<Duration, LessorError> {
        let mut state = self.inner.state.lock();
        if state.role != Role::Primary {
            return Err(LessorError::NotPrimary);
        }
        let lease = state.table.get_mut(&id).ok_or(LessorError::NotFound(id))?;
        let _expiry = lease.refresh(self.inner.min_lease_term);
        Ok(lease.ttl())
    }

    /// Become primary: every surviving lease gets a fresh full TTL,
    /// tolerating the gap in which the previous primary was responsible
    /// for renewals.
    pub fn promote(&self) {
        let mut state = self.inner.state.lock();
        state.role = Role::Primary;
        let min_lease_term = self.inner.min_lease_term;
        for lease in state.table.values_mut() {
            let _expiry = lease.refresh(min_lease_term);
        }
        tracing::debug!("promoted to primary");
    }

    /// Step down: push every lease's expiry to the far-future sentinel
    /// before flipping the role, so a concurrent expiry scan can never
    /// observe `NonPrimary` alongside a near-past expiry.
    pub fn demote(&self) {
        let mut state = self.inner.state.lock();
        for lease in state.table.values_mut() {
            lease.forever();
        }
        state.role = Role::NonPrimary;
        tracing::debug!("demoted to non-primary");
    }

    /// Attach `item` to a lease's item set. Not persisted: attachments are
    /// reconstructed on recovery by scanning the main store.
    ///
    /// # Errors
    ///
    /// Returns [`LessorError::NotFound`] if `id` is unknown.
    pub fn attach(&self, id: i64, item: Vec<u8>) -> Result<(), LessorError> {
        let mut state = self.inner.state.lock();
        let lease = state.table.get_mut(&id).ok_or(LessorError::NotFound(id))?;
        lease.insert_item(item);
        Ok(())
    }

    /// Detach `item` from a lease's item set. Removing an absent item is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LessorError::NotFound`] if `id` is unknown.
    pub fn detach(&self, id: i64, item: &[u8]) -> Result<(), LessorError> {
        let mut state = self.inner.state.lock();
        let lease = state.table.get_mut(&id).ok_or(LessorError::NotFound(id))?;
        lease.remove_item(item);
        Ok(())
    }

    /// Replace the backend and range-deleter handles, drop the in-memory
    /// table, and rehydrate it from the new backend. Used after a snapshot
    /// install. Resets to `NonPrimary`, matching construction-time
    /// behavior — loaded leases always come back with a far-future
    /// expiry, and leaving the role at `Primary` would otherwise violate
    /// the expiry invariant until the next `Promote`.
    ///
    /// # Panics
    ///
    /// Panics if the new backend's persisted store is corrupt.
    ///
    /// # Errors
    ///
    /// Returns an error if the new backend's initial read fails.
    pub fn recover(&self, backend: B, range_deleter: D) -> Result<(), LessorError> {
        let table = load_table(&backend)?;
        backend.force_commit()?;
        let mut state = self.inner.state.lock();
        state.backend = backend;
        state.range_deleter = range_deleter;
        state.table = table;
        state.role = Role::NonPrimary;
        tracing::debug!(lease_count = state.table.len(), "recovered lessor state");
        Ok(())
    }

    /// Take the receiving end of the expired-lease outbound queue. Returns
    /// `None` if already taken — this stream supports at most one logical
    /// consumer.
    pub fn expired_leases(&self) -> Option<mpsc::Receiver<Vec<Lease>>> {
        self.inner.expired_rx.lock().take()
    }

    /// Snapshot every currently tracked lease, ordered by soonest-to-expire
    /// first.
    #[must_use]
    pub fn leases(&self) -> Vec<Lease> {
        let state = self.inner.state.lock();
        let mut leases: Vec<Lease> = state.table.values().cloned().collect();
        leases.sort_by_key(Lease::remaining);
        leases
    }

    /// Look up a lease by ID without mutating anything.
    #[must_use]
    pub fn lookup(&self, id: i64) -> Option<Lease> {
        self.inner.state.lock().table.get(&id).cloned()
    }

    /// Stop the background expiry loop. Safe to call more than once; the
    /// loop observes the signal on its next wake and returns.
    pub fn shutdown(&self) {
        let _ignored = self.inner.cancel_tx.send(true);
    }
}

/// Rehydrate the table from a backend: every persisted `(id, ttl)` gets an
/// empty item set and a far-future expiry, per the recovery contract.
fn load_table<B: Backend>(backend: &B) -> Result<HashMap<i64, Lease>, LessorError> {
    let records = codec::load_all(backend)?;
    let mut table = HashMap::with_capacity(records.len());
    for (id, ttl) in records {
        let ttl = Duration::from_secs(ttl.max(0).unsigned_abs());
        assert!(
            table.insert(id, Lease::recovered(id, ttl)).is_none(),
            "lessor: duplicate lease id {id} found in persisted store",
        );
    }
    Ok(table)
}

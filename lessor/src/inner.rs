use std::{collections::HashMap, time::Duration};

use lessor_engine::Backend;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::{id_gen::IdGenerator, lease::Lease, range_deleter::RangeDeleter, role::Role};

/// Everything guarded by the lessor's single exclusive lock: the table,
/// the primary/non-primary role, and the backend handles — grouped
/// together so `Recover` can swap the backend and range-deleter references
/// atomically with dropping the table.
pub(crate) struct State<B, D> {
    pub(crate) role: Role,
    pub(crate) table: HashMap<i64, Lease>,
    pub(crate) backend: B,
    pub(crate) range_deleter: D,
}

/// Shared lessor state, reference-counted between the public handle and
/// the background expiry task.
pub(crate) struct Inner<B, D>
where
    B: Backend,
    D: RangeDeleter,
{
    pub(crate) state: Mutex<State<B, D>>,
    pub(crate) id_gen: IdGenerator,
    pub(crate) min_lease_term: Duration,
    pub(crate) tick: Duration,
    pub(crate) expired_tx: mpsc::Sender<Vec<Lease>>,
    pub(crate) expired_rx: Mutex<Option<mpsc::Receiver<Vec<Lease>>>>,
    pub(crate) cancel_tx: watch::Sender<bool>,
}

//! Persistent storage layer used by the lessor core.
//!
//! Exposes a small `Backend` capability — bucketed byte-key/byte-value
//! storage with a batch-transaction lock, ranged reads, and a durable
//! commit — backed by RocksDB column families. The lessor crate depends
//! only on the `Backend` / `BatchTx` traits, not on this module directly.

/// Error type
mod error;
/// `Backend` / `BatchTx` traits and the RocksDB-backed implementation
mod rocks;

pub use error::EngineError;
pub use rocks::RocksBackend;

/// A transactional write/read handle into a single bucket-addressed store.
///
/// Implementations must serialize all calls through a single
/// batch-transaction lock: every `Backend::with_batch_tx` call observes a
/// consistent view and commits (or has committed) atomically before the
/// closure returns.
pub trait BatchTx {
    /// Create a bucket if it does not already exist. Idempotent.
    fn create_bucket(&self, bucket: &[u8]) -> Result<(), EngineError>;

    /// Write a key/value pair into a bucket.
    fn put(&self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<(), EngineError>;

    /// Delete a key from a bucket. Deleting an absent key is not an error.
    fn delete(&self, bucket: &[u8], key: &[u8]) -> Result<(), EngineError>;

    /// Range over `[start, end)` in a bucket, at most `limit` entries
    /// (`limit == 0` means unbounded). Entries are returned key-ascending.
    fn range(
        &self,
        bucket: &[u8],
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, EngineError>;
}

/// The persistent backend capability consumed by the lessor core.
pub trait Backend: Send + Sync + 'static + std::fmt::Debug {
    /// Acquire the batch-transaction lock for the duration of `f`, run `f`
    /// against the resulting handle, then commit and release the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails or `f` itself fails.
    fn with_batch_tx<R>(
        &self,
        f: impl FnOnce(&dyn BatchTx) -> Result<R, EngineError>,
    ) -> Result<R, EngineError>;

    /// Flush outstanding writes durably.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails to flush.
    fn force_commit(&self) -> Result<(), EngineError>;
}

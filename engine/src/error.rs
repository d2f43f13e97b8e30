/// Errors surfaced by the `Backend` capability.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The underlying RocksDB instance returned an error.
    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// A bucket was referenced that does not exist and could not be
    /// implicitly created (e.g. during a read-only range).
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
}

use std::{cell::RefCell, path::Path};

use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch};

use crate::{BatchTx, Backend, EngineError};

/// Thread-mode alias matching the `multi-threaded-cf` feature: column
/// families may be created and dropped from any thread while other threads
/// hold handles into the same database.
type Db = DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed `Backend`.
///
/// Buckets map 1:1 onto column families, created lazily on first use. Every
/// `with_batch_tx` call buffers its writes into a single `WriteBatch` and
/// commits it atomically on success; `batch_lock` serializes these
/// transactions.
#[derive(Debug)]
pub struct RocksBackend {
    db: Db,
    batch_lock: Mutex<()>,
}

impl RocksBackend {
    /// Open (or create) a RocksDB database at `path`, picking up any
    /// column families left over from a previous run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_names = Db::list_cf(&opts, &path).unwrap_or_else(|_| vec!["default".to_owned()]);
        let cfs = cf_names
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = Db::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self {
            db,
            batch_lock: Mutex::new(()),
        })
    }

    /// Bucket names are arbitrary bytes on the wire but RocksDB column
    /// families are named by `str`; the lessor only ever uses ASCII bucket
    /// names, so a lossy conversion is adequate here.
    fn bucket_name(bucket: &[u8]) -> String {
        String::from_utf8_lossy(bucket).into_owned()
    }
}

impl Backend for RocksBackend {
    fn with_batch_tx<R>(
        &self,
        f: impl FnOnce(&dyn BatchTx) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let _guard = self.batch_lock.lock();
        let tx = RocksTx {
            db: &self.db,
            batch: RefCell::new(WriteBatch::default()),
        };
        let result = f(&tx)?;
        self.db.write(tx.batch.into_inner())?;
        Ok(result)
    }

    fn force_commit(&self) -> Result<(), EngineError> {
        self.db.flush()?;
        Ok(())
    }
}

/// A single batch-transaction's worth of buffered writes.
struct RocksTx<'a> {
    db: &'a Db,
    batch: RefCell<WriteBatch>,
}

impl RocksTx<'_> {
    fn cf(&self, bucket: &[u8]) -> Result<&ColumnFamily, EngineError> {
        let name = RocksBackend::bucket_name(bucket);
        self.db
            .cf_handle(&name)
            .ok_or(EngineError::BucketNotFound(name))
    }
}

impl BatchTx for RocksTx<'_> {
    fn create_bucket(&self, bucket: &[u8]) -> Result<(), EngineError> {
        let name = RocksBackend::bucket_name(bucket);
        if self.db.cf_handle(&name).is_none() {
            self.db.create_cf(&name, &Options::default())?;
        }
        Ok(())
    }

    fn put(&self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        let cf = self.cf(bucket)?;
        self.batch.borrow_mut().put_cf(cf, key, value);
        Ok(())
    }

    fn delete(&self, bucket: &[u8], key: &[u8]) -> Result<(), EngineError> {
        let cf = self.cf(bucket)?;
        self.batch.borrow_mut().delete_cf(cf, key);
        Ok(())
    }

    fn range(
        &self,
        bucket: &[u8],
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, EngineError> {
        let cf = self.cf(bucket)?;
        let mode = IteratorMode::From(start, Direction::Forward);
        let mut out = Vec::new();
        for item in self.db.iterator_cf(cf, mode) {
            let (key, value) = item?;
            if !end.is_empty() && key.as_ref() >= end {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
            if limit != 0 && out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }
}

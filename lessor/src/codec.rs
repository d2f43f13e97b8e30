use lessor_engine::Backend;
use prost::Message;

use crate::error::LessorError;

/// Bucket holding persisted lease records.
pub(crate) const LEASE_BUCKET: &[u8] = b"lease";

/// Wire representation of a persisted lease record: `{id: int64, ttl:
/// int64}`, field-tagged little-endian varints — the protobuf wire format,
/// matching the legacy layout this store is compatible with.
#[derive(Clone, PartialEq, Message)]
pub(crate) struct PbLease {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub ttl: i64,
}

/// Big-endian 8-byte key encoding so ranged scans enumerate leases in ID
/// order.
pub(crate) fn encode_key(id: i64) -> [u8; 8] {
    (id as u64).to_be_bytes()
}

/// Persist a lease's `(id, ttl)` pair.
///
/// # Errors
///
/// Returns an error if the backend write fails.
pub(crate) fn put<B: Backend>(backend: &B, id: i64, ttl: i64) -> Result<(), LessorError> {
    let value = PbLease { id, ttl }.encode_to_vec();
    backend.with_batch_tx(|tx| {
        tx.create_bucket(LEASE_BUCKET)?;
        tx.put(LEASE_BUCKET, &encode_key(id), &value)
    })?;
    Ok(())
}

/// Delete a persisted lease record by ID.
///
/// # Errors
///
/// Returns an error if the backend write fails.
pub(crate) fn delete<B: Backend>(backend: &B, id: i64) -> Result<(), LessorError> {
    backend.with_batch_tx(|tx| tx.delete(LEASE_BUCKET, &encode_key(id)))?;
    Ok(())
}

/// Load every persisted `(id, ttl)` pair, creating the bucket if it does
/// not yet exist.
///
/// # Errors
///
/// Returns [`LessorError::Corrupt`] if any record fails to decode — this is
/// a fatal condition the caller must not swallow — or a backend error if
/// the underlying read fails.
pub(crate) fn load_all<B: Backend>(backend: &B) -> Result<Vec<(i64, i64)>, LessorError> {
    let raw = backend.with_batch_tx(|tx| {
        tx.create_bucket(LEASE_BUCKET)?;
        tx.range(LEASE_BUCKET, &encode_key(0), &[], 0)
    })?;
    raw.into_iter()
        .map(|(_, value)| {
            PbLease::decode(value.as_slice())
                .map(|lease| (lease.id, lease.ttl))
                .map_err(|e| LessorError::Corrupt(format!("failed to decode lease record: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_encoding_is_big_endian_and_orders_by_id() {
        let low = encode_key(1);
        let high = encode_key(2);
        assert!(low < high);
        assert_eq!(encode_key(0x0102_0304_0506_0708), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn pb_lease_roundtrips_through_the_wire_format() {
        let original = PbLease { id: 42, ttl: 7 };
        let bytes = original.clone().encode_to_vec();
        let decoded = PbLease::decode(bytes.as_slice()).expect("decode");
        assert_eq!(original, decoded);
    }

    #[test]
    fn put_delete_load_all_roundtrip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let backend = lessor_engine::RocksBackend::open(dir.path()).expect("open backend");

        put(&backend, 1, 10).expect("put");
        put(&backend, 2, 20).expect("put");
        let mut all = load_all(&backend).expect("load_all");
        all.sort_unstable();
        assert_eq!(all, vec![(1, 10), (2, 20)]);

        delete(&backend, 1).expect("delete");
        let all = load_all(&backend).expect("load_all");
        assert_eq!(all, vec![(2, 20)]);
    }

    #[test]
    fn load_all_on_empty_store_creates_bucket_and_returns_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let backend = lessor_engine::RocksBackend::open(dir.path()).expect("open backend");
        assert!(load_all(&backend).expect("load_all").is_empty());
    }

    #[test]
    fn decode_failure_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().expect("temp dir");
        let backend = lessor_engine::RocksBackend::open(dir.path()).expect("open backend");
        backend
            .with_batch_tx(|tx| {
                tx.create_bucket(LEASE_BUCKET)?;
                tx.put(LEASE_BUCKET, &encode_key(9), &[0xff_u8; 5])
            })
            .expect("write garbage");
        let err = load_all(&backend).unwrap_err();
        assert!(matches!(err, LessorError::Corrupt(_)));
    }
}

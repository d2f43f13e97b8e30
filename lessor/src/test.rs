use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use lessor_engine::RocksBackend;
use lessor_utils::LessorConfig;

use crate::{error::LessorError, Lessor, RangeDeleter};

/// Records every key it was asked to delete; never actually deletes
/// anything outside this process.
#[derive(Debug, Default)]
struct MockRangeDeleter {
    calls: StdMutex<Vec<Vec<u8>>>,
}

impl MockRangeDeleter {
    fn calls(&self) -> Vec<Vec<u8>> {
        self.calls.lock().unwrap().clone()
    }
}

impl RangeDeleter for MockRangeDeleter {
    fn delete_range(&self, key: &[u8], _end: &[u8]) -> Result<(u64, i64), LessorError> {
        self.calls.lock().unwrap().push(key.to_vec());
        Ok((1, 0))
    }
}

type TestLessor = Lessor<RocksBackend, MockRangeDeleter>;

fn new_lessor(dir: &std::path::Path) -> TestLessor {
    let backend = RocksBackend::open(dir).expect("open backend");
    let config = LessorConfig::new(dir).with_tick_millis(20);
    Lessor::new(&config, backend, MockRangeDeleter::default()).expect("construct lessor")
}

#[tokio::test(flavor = "multi_thread")]
async fn grant_revoke_happy_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lessor = new_lessor(dir.path());

    let lease = lessor.grant(10).expect("grant");
    assert_eq!(lease.ttl(), Duration::from_secs(10));
    assert!(lease.id() > 0);
    assert!(lessor.lookup(lease.id()).is_some());

    lessor.revoke(lease.id()).expect("revoke");
    assert!(lessor.lookup(lease.id()).is_none());
    assert!(lessor.leases().is_empty());
}

#[tokio::test(flavor = "multi_thread", start_paused = true)]
async fn expiry_after_promote() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lessor = new_lessor(dir.path());
    let mut expired = lessor.expired_leases().expect("take expired stream once");

    // ttl=1 clamps to the 5s minimum lease term.
    let lease = lessor.grant(1).expect("grant");
    lessor.promote();

    tokio::time::advance(Duration::from_secs(6)).await;
    tokio::time::sleep(Duration::from_millis(1)).await; // let the scan tick run

    let batch = tokio::time::timeout(Duration::from_secs(1), expired.recv())
        .await
        .expect("batch arrives within one scan period")
        .expect("channel stays open");
    assert!(batch.iter().any(|l| l.id() == lease.id()));
}

#[tokio::test(flavor = "multi_thread", start_paused = true)]
async fn no_expiry_while_non_primary() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lessor = new_lessor(dir.path());
    let mut expired = lessor.expired_leases().expect("take expired stream once");

    let _lease = lessor.grant(1).expect("grant");
    // Deliberately no promote().

    tokio::time::advance(Duration::from_secs(60)).await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    let result = tokio::time::timeout(Duration::from_millis(200), expired.recv()).await;
    assert!(result.is_err(), "no batch should ever be published while non-primary");
}

#[tokio::test(flavor = "multi_thread", start_paused = true)]
async fn renew_resets_expiry() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lessor = new_lessor(dir.path());
    let mut expired = lessor.expired_leases().expect("take expired stream once");

    let lease = lessor.grant(10).expect("grant");
    lessor.promote();

    tokio::time::advance(Duration::from_secs(8)).await;
    lessor.renew(lease.id()).expect("renew");

    tokio::time::advance(Duration::from_secs(4)).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(lessor.lookup(lease.id()).is_some(), "lease survives past its original deadline");
    let not_yet = tokio::time::timeout(Duration::from_millis(50), expired.recv()).await;
    assert!(not_yet.is_err(), "renewed lease must not expire at t=12s");

    tokio::time::advance(Duration::from_secs(7)).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    let batch = tokio::time::timeout(Duration::from_secs(1), expired.recv())
        .await
        .expect("batch arrives once the renewed term elapses")
        .expect("channel stays open");
    assert!(batch.iter().any(|l| l.id() == lease.id()));
}

#[tokio::test(flavor = "multi_thread")]
async fn recovery_rehydrates_table() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lease_id;
    {
        let lessor = new_lessor(dir.path());
        let lease = lessor.grant(30).expect("grant");
        lease_id = lease.id();
        lessor.shutdown();
    }

    let lessor = new_lessor(dir.path());
    let recovered = lessor.lookup(lease_id).expect("lease recovered");
    assert_eq!(recovered.ttl(), Duration::from_secs(30));
    assert!(recovered.items().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn not_primary_on_renew_until_promoted() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lessor = new_lessor(dir.path());

    let lease = lessor.grant(10).expect("grant");
    assert!(matches!(lessor.renew(lease.id()), Err(LessorError::NotPrimary)));

    lessor.promote();
    assert!(lessor.renew(lease.id()).is_ok());

    lessor.demote();
    assert!(matches!(lessor.renew(lease.id()), Err(LessorError::NotPrimary)));
}

#[tokio::test(flavor = "multi_thread")]
async fn attach_is_reconstructible_as_a_union() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lessor = new_lessor(dir.path());
    let lease = lessor.grant(10).expect("grant");

    lessor.attach(lease.id(), b"a".to_vec()).expect("attach a");
    lessor.attach(lease.id(), b"b".to_vec()).expect("attach b");
    lessor.attach(lease.id(), b"a".to_vec()).expect("attach a again");

    let items = lessor.lookup(lease.id()).expect("lease present").items().clone();
    assert_eq!(items.len(), 2);
    assert!(items.contains(b"a".as_slice()));
    assert!(items.contains(b"b".as_slice()));

    lessor.detach(lease.id(), b"a").expect("detach a");
    let items = lessor.lookup(lease.id()).expect("lease present").items().clone();
    assert_eq!(items.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn revoke_deletes_every_attached_item_exactly_once() {
    let dir = tempfile::tempdir().expect("temp dir");
    let backend = RocksBackend::open(dir.path()).expect("open backend");
    let config = LessorConfig::new(dir.path()).with_tick_millis(20);
    let deleter = Arc::new(MockRangeDeleter::default());
    let lessor: Lessor<RocksBackend, Arc<MockRangeDeleter>> =
        Lessor::new(&config, backend, Arc::clone(&deleter)).expect("construct lessor");

    let lease = lessor.grant(10).expect("grant");
    lessor.attach(lease.id(), b"k1".to_vec()).expect("attach");
    lessor.attach(lease.id(), b"k2".to_vec()).expect("attach");

    lessor.revoke(lease.id()).expect("revoke");
    let mut calls = deleter.calls();
    calls.sort();
    assert_eq!(calls, vec![b"k1".to_vec(), b"k2".to_vec()]);

    // Revoking again must not re-trigger any deletes — the lease is gone.
    assert!(matches!(lessor.revoke(lease.id()), Err(LessorError::NotFound(_))));
    assert_eq!(deleter.calls().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn not_found_on_unknown_lease() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lessor = new_lessor(dir.path());

    assert!(matches!(lessor.revoke(42), Err(LessorError::NotFound(42))));
    assert!(matches!(
        lessor.attach(42, b"x".to_vec()),
        Err(LessorError::NotFound(42))
    ));
    assert!(matches!(lessor.detach(42, b"x"), Err(LessorError::NotFound(42))));
    assert_eq!(lessor.lookup(42).map(|l| l.id()), None);
}

//! Build Lock Tests
//!
//! Builders are serialized through `<field>.rail.lock`; a blocked builder
//! reuses the file produced while it waited.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::common::*;
use railstat::{
    BuildLock, IndexSnapshot, LockPolicy, RailConfig, RailError, RailOrigin, RailStore,
};

fn fail_fast() -> RailConfig {
    RailConfig {
        lock_policy: "fail_fast".to_string(),
        ..RailConfig::default()
    }
}

#[test]
fn fail_fast_reports_contention() {
    let corpus = TestCorpus::synthetic(1, CorpusShape::default());
    let rail_path = corpus.dir.path().join(format!("{FIELD}.rail"));
    let held = BuildLock::acquire(&BuildLock::path_for(&rail_path), LockPolicy::Block).unwrap();

    let err = RailStore::for_field_with_config(FIELD, &corpus.index, &fail_fast()).unwrap_err();
    assert!(matches!(err, RailError::LockContention { .. }));
    assert!(!rail_path.exists());

    drop(held);
    let store = RailStore::for_field_with_config(FIELD, &corpus.index, &fail_fast()).unwrap();
    assert_eq!(store.origin(), RailOrigin::Built);
}

#[test]
fn fail_fast_does_not_lock_valid_files() {
    let corpus = TestCorpus::synthetic(2, CorpusShape::default());
    RailStore::for_field(FIELD, &corpus.index).unwrap();
    let rail_path = corpus.dir.path().join(format!("{FIELD}.rail"));
    let _held = BuildLock::acquire(&BuildLock::path_for(&rail_path), LockPolicy::Block).unwrap();

    // fast path never touches the lock
    let store = RailStore::for_field_with_config(FIELD, &corpus.index, &fail_fast()).unwrap();
    assert_eq!(store.origin(), RailOrigin::Loaded);
}

#[test]
fn blocked_builder_reuses_file_built_meanwhile() {
    let corpus = TestCorpus::synthetic(4, CorpusShape::default());
    let rail_path = corpus.dir.path().join(format!("{FIELD}.rail"));
    let held = BuildLock::acquire(&BuildLock::path_for(&rail_path), LockPolicy::Block).unwrap();

    let (tx, rx) = mpsc::channel();
    let index = corpus.index.clone();
    let waiter = thread::spawn(move || {
        let store = RailStore::for_field(FIELD, &index).unwrap();
        tx.send(()).unwrap();
        store.origin()
    });
    assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());

    // while holding the lock, build the file the way another process would
    let field = corpus.index.field(FIELD).unwrap();
    railstat::RailBuilder::new(
        FIELD,
        field,
        corpus.index.doc_count(),
        corpus.index.generation(),
    )
    .build(&rail_path)
    .unwrap();
    drop(held);

    assert_eq!(waiter.join().unwrap(), RailOrigin::Loaded);
}

#[test]
fn concurrent_builders_produce_one_valid_file() {
    let corpus = TestCorpus::synthetic(6, CorpusShape::default());
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let index = corpus.index.clone();
            thread::spawn(move || RailStore::for_field(FIELD, &index).unwrap().origin())
        })
        .collect();
    let origins: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(
        origins.iter().filter(|o| **o == RailOrigin::Built).count(),
        1,
        "{origins:?}"
    );
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    for doc in 0..store.doc_count() {
        assert_eq!(store.rail_slice(doc).to_vec(), corpus.tokens(doc));
    }
}

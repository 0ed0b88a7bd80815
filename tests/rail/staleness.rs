//! Staleness Tests
//!
//! A new index generation triggers exactly one rebuild, and no reader ever
//! sees a rail from another generation.

use std::sync::Arc;
use std::thread;

use crate::common::*;
use railstat::{
    Generation, IndexSnapshot, RailCache, RailError, RailOrigin, RailStore,
};

#[test]
fn generation_bump_rebuilds_exactly_once() {
    let mut corpus = TestCorpus::synthetic(5, CorpusShape::default());
    let first = RailStore::for_field(FIELD, &corpus.index).unwrap();
    assert_eq!(first.origin(), RailOrigin::Built);

    corpus.append(&streams(&[&["w1", "w2", "w3"]]));
    assert!(first.is_stale(&corpus.index));

    let mut origins = Vec::new();
    for _ in 0..3 {
        let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
        assert_eq!(store.generation(), corpus.index.generation());
        assert_eq!(store.doc_count(), corpus.index.doc_count());
        origins.push(store.origin());
    }
    assert_eq!(
        origins,
        vec![RailOrigin::Built, RailOrigin::Loaded, RailOrigin::Loaded]
    );
}

#[test]
fn stale_file_is_never_served() {
    let mut corpus = TestCorpus::from_streams(&streams(&[&["a", "b"]]));
    RailStore::for_field(FIELD, &corpus.index).unwrap();
    corpus.append(&streams(&[&["c"]]));

    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    assert_eq!(store.doc_count(), 2);
    assert_eq!(store.rail_slice(1).to_vec(), corpus.tokens(1));
}

#[test]
fn open_rejects_other_generation() {
    let corpus = TestCorpus::from_streams(&streams(&[&["a"]]));
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let path = store.path().unwrap().to_path_buf();

    let live = corpus.index.generation();
    assert!(RailStore::open(&path, live, corpus.dictionary_size()).is_ok());
    match RailStore::open(&path, Generation::new(live.as_u64() + 10), 2) {
        Err(RailError::VersionMismatch { stored, live: other }) => {
            assert_eq!(stored, live);
            assert_eq!(other.as_u64(), live.as_u64() + 10);
        }
        other => panic!("expected version mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn cache_serves_fresh_generation_under_concurrency() {
    let mut corpus = TestCorpus::synthetic(9, CorpusShape::default());
    let cache = Arc::new(RailCache::default());
    cache.get(FIELD, &corpus.index).unwrap();

    corpus.append(&streams(&[&["w0"]]));
    let index = Arc::new(corpus.index.clone());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let index = Arc::clone(&index);
            thread::spawn(move || {
                let store = cache.get(FIELD, &*index).unwrap();
                assert_eq!(store.generation(), index.generation());
                (Arc::as_ptr(&store) as usize, store.origin())
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // one store instance, built by exactly one caller
    assert!(results.iter().all(|(ptr, _)| *ptr == results[0].0));
    assert!(results.iter().all(|(_, origin)| *origin == RailOrigin::Built));
    assert_eq!(cache.len(), 1);
}

//! Property tests: scans over arbitrary small corpora agree with brute force.

use proptest::prelude::*;

use crate::common::*;
use railstat::{
    CooccurrenceScanner, FrequencyScanner, IndexSnapshot, PairKey, RailStore, ScanOptions,
    ScanStrategy, TermDictionary, TermId,
};

/// Streams over a tiny vocabulary; rank 0 is a hole.
fn corpus_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(0u8..6, 0..24), 1..24).prop_map(|docs| {
        docs.into_iter()
            .map(|doc| {
                doc.into_iter()
                    .map(|t| if t == 0 { String::new() } else { format!("t{t}") })
                    .collect()
            })
            .collect()
    })
}

/// Real term ids (holes excluded) of the test field.
fn real_terms(corpus: &TestCorpus) -> Vec<TermId> {
    (1..corpus.dictionary_size() as TermId).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn frequency_matches_brute_force(docs in corpus_strategy(), keep in 0u32..=100) {
        let corpus = TestCorpus::from_streams(&docs);
        let store = RailStore::in_memory(FIELD, &corpus.index).unwrap();
        let filter = random_filter(keep as u64, docs.len(), keep);
        let freqs = FrequencyScanner::scan(&store, &ScanOptions::new().with_filter(&filter)).unwrap();
        prop_assert_eq!(freqs, brute_force_freqs(&corpus.index, Some(&filter)));
    }

    #[test]
    fn cooccurrence_matches_brute_force(
        docs in corpus_strategy(),
        pick in 0usize..64,
        left in 0usize..6,
        right in 0usize..6,
    ) {
        let corpus = TestCorpus::from_streams(&docs);
        let terms = real_terms(&corpus);
        prop_assume!(!terms.is_empty());
        let pivots = [terms[pick % terms.len()]];

        let store = RailStore::in_memory(FIELD, &corpus.index).unwrap();
        let postings = corpus.index.field(FIELD).unwrap();
        let result = CooccurrenceScanner::scan(
            &store, postings, &pivots, left, right, &ScanOptions::new(),
        ).unwrap();
        prop_assert_eq!(result.counts[pivots[0] as usize], 0);
        prop_assert_eq!(result.counts, brute_force_cooc(&corpus.index, &pivots, left, right, None));
    }

    #[test]
    fn partitioned_cooccurrence_matches_sequential(
        docs in corpus_strategy(),
        partitions in 1usize..9,
        window in 0usize..4,
    ) {
        let corpus = TestCorpus::from_streams(&docs);
        let terms = real_terms(&corpus);
        prop_assume!(terms.len() >= 2);
        let pivots = &terms[..2];

        let store = RailStore::in_memory(FIELD, &corpus.index).unwrap();
        let postings = corpus.index.field(FIELD).unwrap();
        let sequential = CooccurrenceScanner::scan(
            &store, postings, pivots, window, window, &ScanOptions::new(),
        ).unwrap();
        let parallel = CooccurrenceScanner::scan(
            &store,
            postings,
            pivots,
            window,
            window,
            &ScanOptions::new().with_strategy(ScanStrategy::PartitionedParallel { partitions }),
        ).unwrap();
        prop_assert_eq!(parallel, sequential);
    }

    #[test]
    fn stored_rails_equal_token_streams(docs in corpus_strategy()) {
        let corpus = TestCorpus::from_streams(&docs);
        let store = RailStore::in_memory(FIELD, &corpus.index).unwrap();
        let dictionary = corpus.index.field(FIELD).unwrap().dictionary();
        for (doc, tokens) in docs.iter().enumerate() {
            let rail = store.rail_slice(doc as u32);
            prop_assert_eq!(rail.len(), tokens.len());
            for (term, token) in rail.iter().zip(tokens) {
                prop_assert_eq!(dictionary.bytes_of(term), Some(token.as_bytes()));
            }
        }
    }

    #[test]
    fn pair_key_keeps_both_halves(a in any::<u32>(), b in any::<u32>()) {
        let key = PairKey::from_ids(a, b);
        prop_assert_eq!((key.first(), key.second()), (a, b));
        prop_assert_eq!(PairKey::from_u64(key.as_u64()), key);
    }
}

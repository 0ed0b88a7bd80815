//! Co-occurrence Scan Tests

use crate::common::*;
use railstat::{
    score, AssocMeasure, CooccurrenceScanner, Cooccurrences, FrequencyScanner, IndexSnapshot,
    RailError, RailStore, ScanOptions, ScanStrategy, TermId,
};

fn scan(
    corpus: &TestCorpus,
    pivots: &[TermId],
    left: usize,
    right: usize,
    options: &ScanOptions<'_>,
) -> Cooccurrences {
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let postings = corpus.index.field(FIELD).unwrap();
    CooccurrenceScanner::scan(&store, postings, pivots, left, right, options).unwrap()
}

#[test]
fn single_doc_windows_merge() {
    let corpus = TestCorpus::from_streams(&streams(&[&["5", "2", "2", "7", "9", "2"]]));
    let result = scan(&corpus, &[corpus.id("2")], 1, 1, &ScanOptions::new());

    assert_eq!(result.counts[corpus.id("5") as usize], 1);
    assert_eq!(result.counts[corpus.id("7") as usize], 1);
    assert_eq!(result.counts[corpus.id("9") as usize], 1);
    assert_eq!(result.counts[corpus.id("2") as usize], 0);
    assert_eq!(result.pivot_occurrences, 3);
    assert_eq!(result.context_tokens, 3);
    assert_eq!(result.docs_matched, 1);
}

#[test]
fn matches_brute_force() {
    let corpus = TestCorpus::synthetic(59, CorpusShape::default());
    let cases: &[(&[&str], usize, usize)] = &[
        (&["w0"], 1, 1),
        (&["w0"], 0, 0),
        (&["w1"], 5, 0),
        (&["w2"], 0, 5),
        (&["w0", "w3"], 3, 2),
        (&["w4", "w5", "w6"], 10, 10),
        (&["w10"], 100, 100),
    ];
    for &(names, left, right) in cases {
        let pivots: Vec<TermId> = names.iter().map(|n| corpus.id(n)).collect();
        let result = scan(&corpus, &pivots, left, right, &ScanOptions::new());
        let expected = brute_force_cooc(&corpus.index, &pivots, left, right, None);
        assert_eq!(result.counts, expected, "{names:?} -{left}/+{right}");
        assert_eq!(result.context_tokens, expected.iter().sum::<u64>());
    }
}

#[test]
fn pivots_never_count_themselves() {
    let corpus = TestCorpus::from_streams(&streams(&[&["a", "a", "b", "a"], &["b", "a"]]));
    let (a, b) = (corpus.id("a"), corpus.id("b"));
    let result = scan(&corpus, &[a, b], 10, 10, &ScanOptions::new());
    assert!(result.counts.iter().all(|&c| c == 0));
    assert_eq!(result.pivot_occurrences, 6);
    assert_eq!(result.docs_matched, 2);
}

#[test]
fn windows_clamp_at_rail_edges() {
    let corpus = TestCorpus::from_streams(&streams(&[&["p", "x", "y"], &["y", "x", "p"]]));
    let (p, x, y) = (corpus.id("p"), corpus.id("x"), corpus.id("y"));
    let result = scan(&corpus, &[p], usize::MAX, usize::MAX, &ScanOptions::new());
    assert_eq!(result.counts[x as usize], 2);
    assert_eq!(result.counts[y as usize], 2);
}

#[test]
fn hits_count_documents() {
    let corpus = TestCorpus::from_streams(&streams(&[
        &["p", "x", "x", "p", "x"],
        &["x", "p"],
        &["x", "y"],
    ]));
    let (p, x) = (corpus.id("p"), corpus.id("x"));
    let result = scan(&corpus, &[p], 1, 1, &ScanOptions::new());
    assert_eq!(result.counts[x as usize], 4);
    assert_eq!(result.hits[x as usize], 2);
    assert_eq!(result.hits[corpus.id("y") as usize], 0);
}

#[test]
fn holes_inside_windows_count_as_hole_id() {
    let corpus = TestCorpus::from_streams(&streams(&[&["", "p", "", "x"]]));
    let result = scan(&corpus, &[corpus.id("p")], 1, 1, &ScanOptions::new());
    assert_eq!(result.counts[railstat::HOLE_TERM_ID as usize], 2);
    assert_eq!(result.counts[corpus.id("x") as usize], 0);
}

#[test]
fn filter_and_live_docs() {
    let mut corpus = TestCorpus::synthetic(61, CorpusShape::default());
    for doc in (0..corpus.index.doc_count()).step_by(7) {
        corpus.builder.delete(doc);
    }
    corpus.index = corpus.builder.commit();
    let pivots = [corpus.id("w0"), corpus.id("w2")];
    let filter = random_filter(5, corpus.index.doc_count() as usize, 60);

    let filtered = scan(&corpus, &pivots, 2, 2, &ScanOptions::new().with_filter(&filter));
    assert_eq!(
        filtered.counts,
        brute_force_cooc(&corpus.index, &pivots, 2, 2, Some(&filter))
    );

    let mut live_and_filtered = filter.clone();
    live_and_filtered.intersect_with(corpus.index.live_docs().unwrap());
    let both = scan(
        &corpus,
        &pivots,
        2,
        2,
        &ScanOptions::new().with_filter(&filter).live_in(&corpus.index),
    );
    assert_eq!(
        both.counts,
        brute_force_cooc(&corpus.index, &pivots, 2, 2, Some(&live_and_filtered))
    );
}

#[test]
fn partitioned_matches_sequential() {
    let corpus = TestCorpus::synthetic(67, CorpusShape { docs: 400, ..CorpusShape::default() });
    let pivots = [corpus.id("w1"), corpus.id("w7")];
    let sequential = scan(&corpus, &pivots, 4, 3, &ScanOptions::new());
    for partitions in [0, 2, 7, 64] {
        let options =
            ScanOptions::new().with_strategy(ScanStrategy::PartitionedParallel { partitions });
        assert_eq!(scan(&corpus, &pivots, 4, 3, &options), sequential);
    }
}

#[test]
fn sparse_agrees_with_dense() {
    let corpus = TestCorpus::synthetic(71, CorpusShape::default());
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let postings = corpus.index.field(FIELD).unwrap();
    let pivots = [corpus.id("w0")];
    let options = ScanOptions::new();
    let dense = CooccurrenceScanner::scan(&store, postings, &pivots, 2, 2, &options).unwrap();
    let sparse =
        CooccurrenceScanner::scan_sparse(&store, postings, &pivots, 2, 2, &options).unwrap();

    assert_eq!(sparse.context_tokens, dense.context_tokens);
    assert_eq!(sparse.docs_matched, dense.docs_matched);
    for (term, &count) in dense.counts.iter().enumerate() {
        if count > 0 {
            assert_eq!(sparse.counts.get(term as u64), count as i64);
        } else {
            assert!(!sparse.counts.contains_key(term as u64));
        }
    }
}

#[test]
fn rejects_bad_pivots() {
    let corpus = TestCorpus::from_streams(&streams(&[&["a", "b"]]));
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let postings = corpus.index.field(FIELD).unwrap();
    let options = ScanOptions::new();

    let empty = CooccurrenceScanner::scan(&store, postings, &[], 1, 1, &options);
    assert!(matches!(empty, Err(RailError::InvalidInput(_))));

    let outside = CooccurrenceScanner::scan(&store, postings, &[999], 1, 1, &options);
    assert!(matches!(outside, Err(RailError::InvalidInput(_))));
}

#[test]
fn absent_pivot_matches_nothing() {
    let mut corpus = TestCorpus::from_streams(&streams(&[&["a", "b"], &["c"]]));
    // "c" only occurs in a deleted document
    corpus.builder.delete(1);
    corpus.index = corpus.builder.commit();
    let result = scan(
        &corpus,
        &[corpus.id("c")],
        3,
        3,
        &ScanOptions::new().live_in(&corpus.index),
    );
    assert_eq!(result.docs_matched, 0);
    assert!(result.counts.iter().all(|&c| c == 0));
}

#[test]
fn scores_follow_counts_and_frequencies() {
    let corpus = TestCorpus::synthetic(97, CorpusShape::default());
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let options = ScanOptions::new();
    let pivots = [corpus.id("w0")];
    let cooc = scan(&corpus, &pivots, 3, 3, &options);
    let freqs = FrequencyScanner::scan(&store, &options).unwrap();
    let n = freqs.iter().sum::<u64>() as f64;
    let ob = cooc.pivot_occurrences;
    assert_eq!(ob, freqs[pivots[0] as usize]);

    let dice = score(&cooc, &freqs, AssocMeasure::Dice).unwrap();
    let g = score(&cooc, &freqs, AssocMeasure::LogLikelihood).unwrap();
    assert_eq!(dice.len(), corpus.dictionary_size());
    for term in 1..dice.len() {
        let oab = cooc.counts[term];
        if oab == 0 {
            assert_eq!(dice[term], 0.0);
            continue;
        }
        let (oab, oa) = (oab.min(ob) as f64, freqs[term] as f64);
        let expected = AssocMeasure::Dice.score(oab, oa, ob as f64, n);
        assert!((dice[term] - expected).abs() < 1e-9, "term {term}");
        assert!(g[term].is_finite(), "term {term}");
    }
    assert_eq!(dice[pivots[0] as usize], 0.0);
}

//! Association scores for co-occurrence counts
//!
//! Each context term `a` of a [`Cooccurrences`] result is scored from four
//! counts:
//!
//! | name  | meaning                                                   |
//! |-------|-----------------------------------------------------------|
//! | `Oab` | occurrences of `a` inside the pivot windows               |
//! | `Oa`  | occurrences of `a` in the scanned documents               |
//! | `Ob`  | pivot occurrences in the scanned documents                |
//! | `N`   | tokens in the scanned documents                           |
//!
//! `Oa` and `N` come from a frequency scan over the same selection. A term
//! repeated inside a large window can exceed the pivot count, so `Oab` is
//! clamped to `Ob` before scoring.

use railstat_core::{try_zeroed, RailError, RailResult, HOLE_TERM_ID};

use super::Cooccurrences;

/// Association measure between a context term and the pivots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssocMeasure {
    /// Raw `Oab`
    Occurrences,
    /// `Oab / (Oa + Ob - Oab)`
    Jaccard,
    /// `2·Oab / (Oa + Ob)`
    Dice,
    /// `14 + log2(Dice)`
    DiceLog,
    /// Positive pointwise mutual information, normalized; rare counts score 0
    Ppmi,
    /// Pearson's χ², negative when `Oab` is below expectation
    Chi2,
    /// Log-likelihood ratio `G = 2 Σ O·ln(O/E)`
    #[default]
    LogLikelihood,
}

/// Smoothing and rarity threshold of [`AssocMeasure::Ppmi`].
const PPMI_K: f64 = 4.0;

impl AssocMeasure {
    /// Score one term. Counts are taken as given; see [`score`] for the clamp.
    pub fn score(self, oab: f64, oa: f64, ob: f64, n: f64) -> f64 {
        match self {
            AssocMeasure::Occurrences => oab,
            AssocMeasure::Jaccard => oab / ((oa - oab) + (ob - oab) + oab),
            AssocMeasure::Dice => 2.0 * oab / (oa + ob),
            AssocMeasure::DiceLog => 14.0 + (2.0 * oab / (oa + ob)).log2(),
            AssocMeasure::Ppmi => {
                if oa <= PPMI_K || ob <= PPMI_K || oab <= PPMI_K {
                    return 0.0;
                }
                let pmi = (((oab + PPMI_K) / n) / ((oa / n) * (ob / n))).ln();
                if pmi < 0.0 {
                    0.0
                } else {
                    pmi / -(oab / n).ln()
                }
            }
            AssocMeasure::Chi2 => {
                let (observed, expected) = contingency(oab, oa, ob, n);
                let sum: f64 = observed
                    .iter()
                    .zip(&expected)
                    .filter(|&(&o, &e)| o != 0.0 && e != 0.0)
                    .map(|(&o, &e)| (o - e) * (o - e) / e)
                    .sum();
                if oab < expected[0] {
                    -sum
                } else {
                    sum
                }
            }
            AssocMeasure::LogLikelihood => {
                let (observed, expected) = contingency(oab, oa, ob, n);
                let sum: f64 = observed
                    .iter()
                    .zip(&expected)
                    .filter(|&(&o, &e)| o != 0.0 && e != 0.0)
                    .map(|(&o, &e)| o * (o / e).ln())
                    .sum();
                2.0 * sum
            }
        }
    }
}

/// Observed and expected counts of the 2×2 table `{ab, a¬b, ¬ab, ¬a¬b}`.
fn contingency(oab: f64, oa: f64, ob: f64, n: f64) -> ([f64; 4], [f64; 4]) {
    let observed = [oab, oa - oab, ob - oab, n - oa - ob + oab];
    let expected = [
        oa * ob / n,
        oa * (n - ob) / n,
        ob * (n - oa) / n,
        (n - oa) * (n - ob) / n,
    ];
    (observed, expected)
}

/// Score every context term of `cooc` against the pivots.
///
/// `global_freqs` holds per-term occurrences over the same document
/// selection as the co-occurrence scan, typically from
/// [`FrequencyScanner::scan`](super::FrequencyScanner::scan) with the same
/// options. The result is indexed by term id; terms never seen in a window
/// and the hole term score 0.
///
/// # Errors
///
/// - [`RailError::InvalidInput`] if `global_freqs` and the counts disagree
///   on the dictionary size
/// - [`RailError::CapacityOverflow`] if the result cannot be allocated
pub fn score(
    cooc: &Cooccurrences,
    global_freqs: &[u64],
    measure: AssocMeasure,
) -> RailResult<Vec<f64>> {
    if global_freqs.len() != cooc.counts.len() {
        return Err(RailError::invalid_input(format!(
            "{} global frequencies for a dictionary of size {}",
            global_freqs.len(),
            cooc.counts.len()
        )));
    }
    let n = global_freqs.iter().sum::<u64>() as f64;
    let ob = cooc.pivot_occurrences;

    let mut scores = try_zeroed::<f64>(cooc.counts.len())?;
    for (term, (&oab, &oa)) in cooc.counts.iter().zip(global_freqs).enumerate() {
        if oab == 0 || term == HOLE_TERM_ID as usize {
            continue;
        }
        let oab = oab.min(ob);
        scores[term] = measure.score(oab as f64, oa as f64, ob as f64, n);
    }
    Ok(scores)
}

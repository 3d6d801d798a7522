//! Laplace (add-one) smoothing of bigram counts into a [`ProbabilityTable`].
//!
//! With `V` = observed current tokens ∪ {`UNKNOWN`} and `S = |V|`, every
//! previous token `p` in observed previous tokens ∪ {`INIT`, `UNKNOWN`} gets
//! a row over all of `V`:
//!
//! ```text
//! P(c | p) = (count(p, c) + 1) / (total(p) + S)
//! ```
//!
//! so every row sums to one and no entry is zero.

use ahash::AHashMap;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::corpus::CorpusReader;
use crate::counts::BigramCounts;
use crate::table::{ProbabilityTable, Row, Vocabulary, INIT, UNKNOWN};

/// Build the smoothed table for a set of counts.
pub fn laplace(counts: &BigramCounts) -> ProbabilityTable {
    // Sorted so token ids do not depend on hash order
    let mut current: Vec<&str> = counts.vocabulary().chain([UNKNOWN]).collect();
    current.sort_unstable();
    current.dedup();

    let mut vocab = Vocabulary::new();
    for tok in &current {
        vocab.intern(tok);
    }
    let smooth = vocab.len() as f64;

    let mut previous: Vec<&str> = counts.previous_tokens().chain([INIT, UNKNOWN]).collect();
    previous.sort_unstable();
    previous.dedup();

    let mut rows = AHashMap::with_capacity(previous.len());
    for prev in previous {
        let denom = counts.total(prev) as f64 + smooth;
        let mut dense = vec![Some(1.0 / denom); vocab.len()];

        if let Some(successors) = counts.successors(prev) {
            for (curr, &count) in successors {
                // every observed successor is in the vocabulary
                if let Some(id) = vocab.id(curr) {
                    dense[id as usize] = Some((count as f64 + 1.0) / denom);
                }
            }
        }

        rows.insert(prev.to_string(), Row::from_dense(dense, &vocab));
    }

    debug!(
        vocabulary = vocab.len(),
        rows = rows.len(),
        "built laplace-smoothed bigram table"
    );
    ProbabilityTable::new(vocab, rows)
}

/// Read a corpus file and build its smoothed bigram table.
///
/// Any I/O failure (missing file, unreadable bytes, invalid UTF-8) is
/// returned unchanged and no table is produced.
pub fn bigram_model<P: AsRef<Path>>(path: P) -> io::Result<ProbabilityTable> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading corpus");
    let counts = BigramCounts::from_corpus(CorpusReader::open(path)?)?;
    Ok(laplace(&counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table_of(text: &str) -> ProbabilityTable {
        let counts = BigramCounts::from_corpus(CorpusReader::new(Cursor::new(text))).unwrap();
        laplace(&counts)
    }

    #[test]
    fn test_worked_example() {
        let t = table_of("the cat sat\nthe dog ran\n");

        assert_eq!(t.vocabulary_size(), 6);
        assert!((t.get_probability("the", "cat") - 0.25).abs() < 1e-12);
        assert!((t.get_probability("the", "sat") - 0.125).abs() < 1e-12);
        assert!((t.get_probability(INIT, "the") - 3.0 / 8.0).abs() < 1e-12);
        assert!((t.get_probability("cat", "sat") - 2.0 / 7.0).abs() < 1e-12);

        // INIT, UNKNOWN, the, cat, dog (sat and ran never precede anything)
        assert_eq!(t.row_count(), 5);
        assert!(!t.contains_row("sat"));
        assert!((t.get_probability("sat", "the") - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_normalized_and_positive() {
        let t = table_of("a b c a\nb , c .\n\nc c c\n");
        for prev in t.previous_tokens() {
            let row = t.get_row(prev);
            assert_eq!(row.len(), t.vocabulary_size());
            assert!((row.total() - 1.0).abs() < 1e-9, "row {:?} sums to {}", prev, row.total());
            assert!(row.ranked().iter().all(|(_, p)| *p > 0.0));
        }
    }

    #[test]
    fn test_empty_corpus_is_degenerate_not_error() {
        let t = table_of("");
        assert_eq!(t.vocabulary_size(), 1);
        assert_eq!(t.row_count(), 2);
        assert!(t.contains_row(INIT));
        assert!(t.contains_row(UNKNOWN));
        assert_eq!(t.get_probability(INIT, UNKNOWN), 1.0);
        assert_eq!(t.get_probability("anything", "else"), 1.0);
    }

    #[test]
    fn test_missing_file_propagates_io_error() {
        let err = bigram_model("/definitely/not/here/corpus.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}

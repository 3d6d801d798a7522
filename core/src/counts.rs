// core/src/counts.rs
//
// Raw bigram counts accumulated from a corpus.
// Stores count(prev -> curr), total(prev) and the set of tokens seen as `curr`.

use ahash::{AHashMap, AHashSet};
use std::io::{self, BufRead};
use tracing::debug;

use crate::corpus::{CorpusReader, Tokenizer};
use crate::table::INIT;

/// Bigram occurrence counts.
///
/// Every line starts from `INIT`, so the first token of a line is counted as
/// a successor of `INIT` and nothing carries over from the previous line.
#[derive(Debug, Clone, Default)]
pub struct BigramCounts {
    /// prev -> (curr -> count)
    pairs: AHashMap<String, AHashMap<String, u64>>,
    /// prev -> sum of its successor counts
    totals: AHashMap<String, u64>,
    /// Tokens observed in the `curr` position
    vocabulary: AHashSet<String>,
    lines: usize,
    tokens: usize,
}

impl BigramCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every line a corpus reader yields.
    ///
    /// The first read error aborts counting and is returned unchanged.
    pub fn from_corpus<R, T>(corpus: CorpusReader<R, T>) -> io::Result<Self>
    where
        R: BufRead,
        T: Tokenizer,
    {
        let mut counts = Self::new();
        for sentence in corpus {
            counts.add_line(&sentence?.tokens);
        }
        debug!(
            lines = counts.lines,
            tokens = counts.tokens,
            vocabulary = counts.vocabulary.len(),
            previous = counts.totals.len(),
            "counted corpus bigrams"
        );
        Ok(counts)
    }

    /// Add the bigrams of one tokenized line.
    pub fn add_line<S: AsRef<str>>(&mut self, tokens: &[S]) {
        if tokens.is_empty() {
            return;
        }

        let mut prev = INIT;
        for curr in tokens {
            let curr = curr.as_ref();
            self.vocabulary.insert(curr.to_string());

            *self
                .pairs
                .entry(prev.to_string())
                .or_default()
                .entry(curr.to_string())
                .or_insert(0) += 1;
            *self.totals.entry(prev.to_string()).or_insert(0) += 1;

            prev = curr;
        }

        self.lines += 1;
        self.tokens += tokens.len();
    }

    /// count(prev, curr); 0 when never observed.
    pub fn count(&self, prev: &str, curr: &str) -> u64 {
        self.pairs
            .get(prev)
            .and_then(|row| row.get(curr))
            .copied()
            .unwrap_or(0)
    }

    /// Number of bigrams starting at `prev`; 0 when never observed.
    pub fn total(&self, prev: &str) -> u64 {
        self.totals.get(prev).copied().unwrap_or(0)
    }

    /// Observed successors of `prev` with their counts.
    pub fn successors(&self, prev: &str) -> Option<&AHashMap<String, u64>> {
        self.pairs.get(prev)
    }

    /// Tokens observed in the `prev` position (includes `INIT` once any line was added).
    pub fn previous_tokens(&self) -> impl Iterator<Item = &str> {
        self.totals.keys().map(String::as_str)
    }

    /// Tokens observed in the `curr` position.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.iter().map(String::as_str)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Non-empty lines counted.
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Tokens counted across all lines.
    pub fn token_count(&self) -> usize {
        self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }
}

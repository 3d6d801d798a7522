//! Bigram probability table and its fallback lookups.
//!
//! A `ProbabilityTable` maps a previous token to a `Row`, the distribution
//! over current tokens. Rows are materialized once, ranked once, and never
//! mutated afterwards, so a table can be shared freely between generation
//! calls (including across threads).
//!
//! Missing keys are resolved through exactly two functions:
//! - [`ProbabilityTable::get_row`]: unseen previous token -> `UNKNOWN` row
//! - [`ProbabilityTable::get_probability`]: unseen current token -> `UNKNOWN` column

use ahash::AHashMap;
use std::cmp::Ordering;

/// Start-of-line context. Only ever used as a previous token.
pub const INIT: &str = "[INIT]";

/// Out-of-vocabulary fallback, valid as previous and current token.
pub const UNKNOWN: &str = "";

/// Dense index of a token inside a [`Vocabulary`].
pub type TokenId = u32;

/// Natural log with `ln(0) = -inf` (and anything non-positive mapped there too).
pub(crate) fn ln_prob(p: f64) -> f64 {
    if p > 0.0 {
        p.ln()
    } else {
        f64::NEG_INFINITY
    }
}

/// Interned token strings.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: Vec<String>,
    ids: AHashMap<String, TokenId>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `token`, assigning the next free one if needed.
    pub fn intern(&mut self, token: &str) -> TokenId {
        if let Some(&id) = self.ids.get(token) {
            return id;
        }
        let id = self.tokens.len() as TokenId;
        self.tokens.push(token.to_string());
        self.ids.insert(token.to_string(), id);
        id
    }

    pub fn id(&self, token: &str) -> Option<TokenId> {
        self.ids.get(token).copied()
    }

    /// Token text for an id handed out by this vocabulary.
    pub fn token(&self, id: TokenId) -> &str {
        &self.tokens[id as usize]
    }

    pub fn contains(&self, token: &str) -> bool {
        self.ids.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// All tokens in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &str)> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (i as TokenId, t.as_str()))
    }
}

/// Distribution over current tokens for one previous token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Indexed by `TokenId`; `None` where the row has no entry.
    probs: Vec<Option<f64>>,
    /// Entries by probability descending, ties by token text ascending.
    ranked: Vec<(TokenId, f64)>,
}

impl Row {
    pub(crate) fn from_dense(probs: Vec<Option<f64>>, vocab: &Vocabulary) -> Self {
        let mut ranked: Vec<(TokenId, f64)> = probs
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (i as TokenId, p)))
            .collect();
        ranked.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => vocab.token(a.0).cmp(vocab.token(b.0)),
            other => other,
        });
        Self { probs, ranked }
    }

    /// Probability stored for `id`, if the row has that column.
    pub fn get(&self, id: TokenId) -> Option<f64> {
        self.probs.get(id as usize).copied().flatten()
    }

    /// Candidates in deterministic selection order.
    pub fn ranked(&self) -> &[(TokenId, f64)] {
        &self.ranked
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Sum of all entries.
    pub fn total(&self) -> f64 {
        self.ranked.iter().map(|(_, p)| p).sum()
    }
}

/// Immutable bigram model: previous token -> [`Row`].
#[derive(Debug, Clone, Default)]
pub struct ProbabilityTable {
    vocab: Vocabulary,
    rows: AHashMap<String, Row>,
    empty: Row,
}

impl ProbabilityTable {
    pub(crate) fn new(vocab: Vocabulary, rows: AHashMap<String, Row>) -> Self {
        Self {
            vocab,
            rows,
            empty: Row::default(),
        }
    }

    /// Assemble a table from explicit rows.
    ///
    /// Entries are taken as given: rows need not be normalized, need not
    /// share columns, and no `INIT`/`UNKNOWN` rows are added. Useful for
    /// fixtures and for models estimated elsewhere.
    ///
    /// # Example
    /// ```
    /// # use libbigram_core::{ProbabilityTable, INIT};
    /// let table = ProbabilityTable::from_rows([
    ///     (INIT, vec![("hello", 1.0)]),
    ///     ("hello", vec![("world", 0.75), ("there", 0.25)]),
    /// ]);
    /// assert_eq!(table.get_probability("hello", "world"), 0.75);
    /// ```
    pub fn from_rows<I, P, E, T>(rows: I) -> Self
    where
        I: IntoIterator<Item = (P, E)>,
        P: Into<String>,
        E: IntoIterator<Item = (T, f64)>,
        T: AsRef<str>,
    {
        let mut vocab = Vocabulary::new();
        let sparse: Vec<(String, Vec<(TokenId, f64)>)> = rows
            .into_iter()
            .map(|(prev, entries)| {
                let entries: Vec<(TokenId, f64)> = entries
                    .into_iter()
                    .map(|(tok, p)| (vocab.intern(tok.as_ref()), p))
                    .collect();
                let prev: String = prev.into();
                (prev, entries)
            })
            .collect();

        let mut table_rows = AHashMap::with_capacity(sparse.len());
        for (prev, entries) in sparse {
            let mut dense = vec![None; vocab.len()];
            for (id, p) in entries {
                dense[id as usize] = Some(p);
            }
            table_rows.insert(prev, Row::from_dense(dense, &vocab));
        }

        Self::new(vocab, table_rows)
    }

    /// Row for `prev`, else the `UNKNOWN` row, else an empty row.
    pub fn get_row(&self, prev: &str) -> &Row {
        self.rows
            .get(prev)
            .or_else(|| self.rows.get(UNKNOWN))
            .unwrap_or(&self.empty)
    }

    /// P(curr | prev) with the two-level fallback.
    ///
    /// The row comes from [`get_row`](Self::get_row); inside it, a missing
    /// `curr` reads the `UNKNOWN` column, and a missing `UNKNOWN` column
    /// reads as `0.0`.
    pub fn get_probability(&self, prev: &str, curr: &str) -> f64 {
        let row = self.get_row(prev);
        self.vocab
            .id(curr)
            .and_then(|id| row.get(id))
            .or_else(|| self.vocab.id(UNKNOWN).and_then(|id| row.get(id)))
            .unwrap_or(0.0)
    }

    /// Natural-log probability of a whole token sequence, starting from `INIT`.
    ///
    /// Any zero-probability step makes the result `-inf`. An empty sequence
    /// scores `0.0`.
    pub fn score_sequence<S: AsRef<str>>(&self, tokens: &[S]) -> f64 {
        let mut prev = INIT;
        let mut score = 0.0;
        for tok in tokens {
            let tok = tok.as_ref();
            score += ln_prob(self.get_probability(prev, tok));
            prev = tok;
        }
        score
    }

    /// Whether `prev` has its own materialized row.
    pub fn contains_row(&self, prev: &str) -> bool {
        self.rows.contains_key(prev)
    }

    /// Previous tokens that own a row.
    pub fn previous_tokens(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Token text for an id found in one of this table's rows.
    pub fn token(&self, id: TokenId) -> &str {
        self.vocab.token(id)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

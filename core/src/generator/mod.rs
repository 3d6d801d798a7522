//! Constrained sequence generation over a [`ProbabilityTable`].
//!
//! Two strategies share one contract and one set of constraints:
//! - [`Greedy`]: take the most probable admissible next token
//! - [`Lookahead`]: score each admissible next token by its own log-probability
//!   plus the best admissible step after it, and take the best score
//!
//! Constraints applied to every position after the seed:
//! - at most `length / 5` punctuation tokens in the whole sequence (seed included)
//! - a non-punctuation token may appear only once (seed included)
//! - `INIT` is never produced
//! - `UNKNOWN` is used only when nothing else is admissible

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::table::{ln_prob, ProbabilityTable, Row, TokenId, INIT, UNKNOWN};

mod greedy;
mod lookahead;

pub use greedy::Greedy;
pub use lookahead::Lookahead;

/// A generated sequence and its natural-log joint probability.
///
/// `log_prob` may be `-inf` when a step had probability zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub tokens: Vec<String>,
    pub log_prob: f64,
}

impl Generation {
    /// The `([], 0.0)` result returned for a zero length request.
    pub fn empty() -> Self {
        Self {
            tokens: Vec::new(),
            log_prob: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    pub fn into_parts(self) -> (Vec<String>, f64) {
        (self.tokens, self.log_prob)
    }
}

/// A strategy that extends a seed token into a sequence of fixed length.
pub trait SequenceGenerator {
    /// Produce exactly `length` tokens starting with `seed`.
    ///
    /// `length == 0` yields [`Generation::empty`]. The seed is never checked
    /// against the constraints, but it does count toward them. An empty
    /// `seed` starts at log-probability `0.0` and is recorded as a used word
    /// like any other seed.
    fn generate(&self, table: &ProbabilityTable, seed: &str, length: usize) -> Generation;
}

/// Strategy selector used by configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Greedy,
    #[default]
    Lookahead,
}

impl Strategy {
    pub fn generate(self, table: &ProbabilityTable, seed: &str, length: usize) -> Generation {
        match self {
            Strategy::Greedy => Greedy.generate(table, seed, length),
            Strategy::Lookahead => Lookahead.generate(table, seed, length),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Greedy => "greedy",
            Strategy::Lookahead => "lookahead",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" => Ok(Strategy::Greedy),
            "lookahead" => Ok(Strategy::Lookahead),
            other => Err(format!(
                "unknown strategy '{}', expected 'greedy' or 'lookahead'",
                other
            )),
        }
    }
}

/// True for non-empty tokens made only of ASCII punctuation (`.`, `?!`, `--`, ...).
pub fn is_punctuation(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_punctuation())
}

/// Per-call generation state: output so far plus constraint bookkeeping.
pub(crate) struct GenerationState<'t> {
    table: &'t ProbabilityTable,
    tokens: Vec<String>,
    log_prob: f64,
    length: usize,
    max_punct: usize,
    punct_used: usize,
    used: AHashSet<String>,
}

impl<'t> GenerationState<'t> {
    /// Start a sequence of `length` (> 0) tokens with `seed` already placed.
    pub(crate) fn start(table: &'t ProbabilityTable, seed: &str, length: usize) -> Self {
        let log_prob = if seed.is_empty() {
            0.0
        } else {
            ln_prob(table.get_probability(INIT, seed))
        };

        let mut state = Self {
            table,
            tokens: Vec::with_capacity(length),
            log_prob,
            length,
            max_punct: length / 5,
            punct_used: 0,
            used: AHashSet::new(),
        };
        state.record(seed);
        state.tokens.push(seed.to_string());
        state
    }

    pub(crate) fn is_done(&self) -> bool {
        self.tokens.len() >= self.length
    }

    /// The token the next step is conditioned on.
    pub(crate) fn prev(&self) -> &str {
        self.tokens.last().map(String::as_str).unwrap_or(INIT)
    }

    /// Whether `token` may be placed next.
    pub(crate) fn admits(&self, token: &str) -> bool {
        if token == INIT {
            return false;
        }
        if is_punctuation(token) {
            self.punct_used < self.max_punct
        } else {
            !self.used.contains(token)
        }
    }

    /// Whether `token` would be admissible right after placing `first`.
    pub(crate) fn admits_after(&self, first: &str, token: &str) -> bool {
        if token == INIT {
            return false;
        }
        let first_punct = is_punctuation(first);
        if is_punctuation(token) {
            self.punct_used + usize::from(first_punct) < self.max_punct
        } else {
            !self.used.contains(token) && (first_punct || token != first)
        }
    }

    /// First admissible entry of `row` in ranked order.
    pub(crate) fn first_admissible(&self, row: &Row, allow_unknown: bool) -> Option<TokenId> {
        row.ranked()
            .iter()
            .map(|&(id, _)| id)
            .find(|&id| {
                let token = self.table.token(id);
                (allow_unknown || token != UNKNOWN) && self.admits(token)
            })
    }

    /// Append `token`, charging `ln P(token | prev)` to the running total.
    pub(crate) fn push(&mut self, token: &str) {
        let p = self.table.get_probability(self.prev(), token);
        self.log_prob += ln_prob(p);
        trace!(prev = self.prev(), token, p, log_prob = self.log_prob, "step");

        self.record(token);
        self.tokens.push(token.to_string());
    }

    fn record(&mut self, token: &str) {
        if is_punctuation(token) {
            self.punct_used += 1;
        } else {
            self.used.insert(token.to_string());
        }
    }

    pub(crate) fn finish(self) -> Generation {
        Generation {
            tokens: self.tokens,
            log_prob: self.log_prob,
        }
    }
}

use tracing::debug;

use super::{Generation, GenerationState, SequenceGenerator};
use crate::table::{ln_prob, ProbabilityTable, TokenId, UNKNOWN};

/// Depth-one lookahead generation.
///
/// Each admissible candidate `tok` (other than `UNKNOWN`) is scored as
/// `ln P(tok | prev) + best_next(tok)`, where `best_next` is the log
/// probability of the first admissible entry of `tok`'s row under the state
/// as it would be after placing `tok`. Only the winning token is committed;
/// the next step starts over.
///
/// `UNKNOWN` counts as a continuation; `INIT` never does. A candidate with
/// no admissible continuation, or whose first one has probability 0, gets
/// `best_next = 0`, not `-inf`. Such dead ends can therefore outscore
/// candidates with a weak continuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lookahead;

impl Lookahead {
    /// Log-probability of the best admissible step after `first`, or 0.0.
    fn best_next(table: &ProbabilityTable, state: &GenerationState<'_>, first: &str) -> f64 {
        let next = table
            .get_row(first)
            .ranked()
            .iter()
            .find(|&&(id, _)| state.admits_after(first, table.token(id)));

        match next {
            Some(&(_, p)) if p > 0.0 => p.ln(),
            _ => 0.0,
        }
    }
}

impl SequenceGenerator for Lookahead {
    fn generate(&self, table: &ProbabilityTable, seed: &str, length: usize) -> Generation {
        if length == 0 {
            return Generation::empty();
        }

        let mut state = GenerationState::start(table, seed, length);
        while !state.is_done() {
            let row = table.get_row(state.prev());

            let mut best: Option<TokenId> = None;
            let mut best_score = f64::NEG_INFINITY;
            for &(id, p) in row.ranked() {
                let token = table.token(id);
                if token == UNKNOWN || !state.admits(token) {
                    continue;
                }
                let score = ln_prob(p) + Self::best_next(table, &state, token);
                if score > best_score {
                    best_score = score;
                    best = Some(id);
                }
            }

            let chosen = best.or_else(|| state.first_admissible(row, true));
            let token = match chosen {
                Some(id) => table.token(id),
                None => {
                    debug!(prev = state.prev(), "lookahead: no admissible candidate, emitting UNKNOWN");
                    UNKNOWN
                }
            };
            state.push(token);
        }

        state.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Greedy;
    use crate::table::INIT;

    /// "b" is the locally best step after "a", but its strong continuation
    /// leads back to the already used "a"; "c" continues strongly to "d".
    fn trap() -> ProbabilityTable {
        ProbabilityTable::from_rows([
            (INIT, vec![("a", 1.0)]),
            ("a", vec![("b", 0.5), ("c", 0.4), ("d", 0.1)]),
            ("b", vec![("a", 0.9), ("d", 0.1)]),
            ("c", vec![("d", 0.9), ("b", 0.1)]),
            ("d", vec![("b", 0.5), ("c", 0.5)]),
        ])
    }

    #[test]
    fn test_lookahead_beats_greedy_on_trap() {
        let t = trap();
        let greedy = Greedy.generate(&t, "a", 3);
        let look = Lookahead.generate(&t, "a", 3);

        assert_eq!(greedy.tokens, vec!["a", "b", "d"]);
        assert_eq!(look.tokens, vec!["a", "c", "d"]);
        assert!((greedy.log_prob - (0.5f64.ln() + 0.1f64.ln())).abs() < 1e-12);
        assert!((look.log_prob - (0.4f64.ln() + 0.9f64.ln())).abs() < 1e-12);
        assert!(look.log_prob > greedy.log_prob);
    }

    #[test]
    fn test_dead_end_scores_neutral() {
        // "x" has no admissible continuation and so scores ln(0.4) + 0,
        // which beats "y" at ln(0.6) + ln(0.1).
        let t = ProbabilityTable::from_rows([
            (INIT, vec![("s", 1.0)]),
            ("s", vec![("y", 0.6), ("x", 0.4)]),
            ("x", vec![("s", 1.0)]),
            ("y", vec![("z", 0.1), ("s", 0.9)]),
        ]);
        let g = Lookahead.generate(&t, "s", 2);
        assert_eq!(g.tokens, vec!["s", "x"]);
    }

    #[test]
    fn test_unknown_continuation_counts() {
        // "x" is only reachable at 0.45 but continues to UNKNOWN at 0.9;
        // "y" only has a weak real continuation left once "s" is used.
        let t = ProbabilityTable::from_rows([
            (INIT, vec![("s", 1.0)]),
            ("s", vec![("y", 0.5), ("x", 0.45)]),
            ("x", vec![(UNKNOWN, 0.9), ("s", 0.05), ("w", 0.05)]),
            ("y", vec![("s", 0.9), ("z", 0.1)]),
        ]);
        let g = Lookahead.generate(&t, "s", 2);
        assert_eq!(g.tokens, vec!["s", "x"]);
        assert!((g.log_prob - 0.45f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_probability_continuation_is_neutral() {
        // "x" continues to "q" with probability 0, which scores like a dead
        // end: ln(0.4) + 0 beats ln(0.6) + ln(0.1).
        let t = ProbabilityTable::from_rows([
            (INIT, vec![("s", 1.0)]),
            ("s", vec![("y", 0.6), ("x", 0.4)]),
            ("x", vec![("q", 0.0)]),
            ("y", vec![("s", 0.9), ("z", 0.1)]),
        ]);
        let g = Lookahead.generate(&t, "s", 2);
        assert_eq!(g.tokens, vec!["s", "x"]);
    }

    #[test]
    fn test_ties_keep_ranked_order() {
        let t = ProbabilityTable::from_rows([
            (INIT, vec![("s", 1.0)]),
            ("s", vec![("q", 0.5), ("p", 0.5)]),
            ("p", vec![("r", 1.0)]),
            ("q", vec![("r", 1.0)]),
        ]);
        let g = Lookahead.generate(&t, "s", 2);
        assert_eq!(g.tokens, vec!["s", "p"]);
    }

    #[test]
    fn test_unknown_relaxation_and_absolute_fallback() {
        let t = ProbabilityTable::from_rows([
            (INIT, vec![("a", 1.0)]),
            ("a", vec![("a", 0.7), (UNKNOWN, 0.3)]),
        ]);
        let g = Lookahead.generate(&t, "a", 4);
        // second pass takes UNKNOWN, then nothing is left and there is no
        // row for "" so the absolute fallback kicks in
        assert_eq!(g.tokens, vec!["a", "", "", ""]);
        assert_eq!(g.log_prob, f64::NEG_INFINITY);
    }

    #[test]
    fn test_zero_length() {
        assert_eq!(Lookahead.generate(&trap(), "a", 0), Generation::empty());
    }
}

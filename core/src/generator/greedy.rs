use tracing::debug;

use super::{Generation, GenerationState, SequenceGenerator};
use crate::table::{ProbabilityTable, UNKNOWN};

/// Non-backtracking greedy generation.
///
/// At every step the current row is walked in ranked order and the first
/// admissible token wins. `UNKNOWN` is only considered in a second pass,
/// and emitted unconditionally when even that pass finds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl SequenceGenerator for Greedy {
    fn generate(&self, table: &ProbabilityTable, seed: &str, length: usize) -> Generation {
        if length == 0 {
            return Generation::empty();
        }

        let mut state = GenerationState::start(table, seed, length);
        while !state.is_done() {
            let row = table.get_row(state.prev());
            let chosen = state
                .first_admissible(row, false)
                .or_else(|| state.first_admissible(row, true));

            let token = match chosen {
                Some(id) => table.token(id),
                None => {
                    debug!(prev = state.prev(), "greedy: no admissible candidate, emitting UNKNOWN");
                    UNKNOWN
                }
            };
            state.push(token);
        }

        state.finish()
    }
}

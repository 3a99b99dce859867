//! Group standings with cascading, tie-scoped tie-breaks.
//!
//! Entrants are ranked by tournament points (win 2, played loss 1,
//! walkover loss 0). Entrants level on points are separated by
//! [`TieResolver`] using only the matches played among them: sets ratio,
//! then points ratio, then seed.

pub mod calculator;
pub mod tiebreak;

pub use calculator::{StandingEntry, StandingsCalculator, compare_across_groups};
pub use tiebreak::{
    DEFAULT_CRITERIA, Ratio, Tally, TieResolver, TiebreakCriterion, TiebreakDetail, head_to_head,
};

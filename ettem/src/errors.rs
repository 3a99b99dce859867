//! Engine error types.
//!
//! Errors fall into three families that callers handle differently:
//! - [`ValidationError`]: the submitted input is malformed. Reject it and let
//!   the operator retry with corrected data.
//! - [`ConsistencyError`]: the operation would break bracket or group
//!   integrity. Nothing is changed and the message says what to do first.
//! - [`ConfigurationError`]: group or bracket creation is impossible with the
//!   given settings. Raised before any state is touched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{CategoryId, EntrantId, GroupId, MatchId, MatchStatus};

/// Malformed result input
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("best-of format must be 3, 5 or 7, got {0}")]
    InvalidFormat(u8),

    #[error("a scored result needs at least one set")]
    NoSets,

    #[error("set {set}: a set cannot end tied ({points}-{points})")]
    TiedSet { set: usize, points: u16 },

    #[error("set {set}: the winner must reach at least 11 points (got {winner_points})")]
    WinnerBelowEleven { set: usize, winner_points: u16 },

    #[error("set {set}: at deuce (10-10 or later) the winner must lead by exactly 2 (difference {difference})")]
    InvalidDeuce { set: usize, difference: u16 },

    #[error("set {set}: the winner must lead by at least 2 (difference {difference})")]
    MarginTooSmall { set: usize, difference: u16 },

    #[error("best of {best_of} needs between {min} and {max} sets, got {got}")]
    WrongSetCount {
        best_of: u8,
        min: usize,
        max: usize,
        got: usize,
    },

    #[error("match incomplete: nobody won {needed} sets (best of {best_of})")]
    Incomplete { best_of: u8, needed: usize },

    #[error("set {set} was played after the match had already been decided")]
    SetAfterDecision { set: usize },

    #[error("declared format best of {declared} differs from the configured best of {configured}")]
    FormatMismatch { declared: u8, configured: u8 },

    #[error("declared winner {declared} does not match the set scores")]
    WinnerMismatch { declared: EntrantId },

    #[error("entrant {entrant} is not playing in match {match_id}")]
    NotAParticipant {
        match_id: MatchId,
        entrant: EntrantId,
    },

    #[error("entrant name must not be empty")]
    EmptyName,
}

/// Operations refused because they would break integrity
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConsistencyError {
    #[error(
        "entrant {entrant} already played match {downstream} in the next round; delete the downstream result first"
    )]
    DownstreamResultExists {
        match_id: MatchId,
        downstream: MatchId,
        entrant: EntrantId,
    },

    #[error("round {round} slot {slot} already holds entrant {occupant}, refusing to overwrite with {incoming}")]
    SlotOccupied {
        round: u8,
        slot: usize,
        occupant: EntrantId,
        incoming: EntrantId,
    },

    #[error("round {round} slot {slot} is a BYE and cannot receive entrant {incoming}")]
    SlotIsBye {
        round: u8,
        slot: usize,
        incoming: EntrantId,
    },

    #[error("entrant {entrant} already occupies slot {existing}, cannot also take slot {requested}")]
    DuplicateEntrant {
        entrant: EntrantId,
        existing: usize,
        requested: usize,
    },

    #[error("entrants {entrant} and {other} of group {group} would share the same {section} of the bracket")]
    SameGroupSameSection {
        group: GroupId,
        entrant: EntrantId,
        other: EntrantId,
        section: BracketSection,
    },

    #[error("no slot left for entrant {entrant} of group {group} outside its groupmates' {section}")]
    PlacementInfeasible {
        group: GroupId,
        entrant: EntrantId,
        section: BracketSection,
    },

    #[error("match {0} does not have both entrants yet")]
    EntrantsUndetermined(MatchId),

    #[error("match {match_id} cannot move from {from} to {to}")]
    InvalidTransition {
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    },

    #[error("match {0} has no recorded result to clear")]
    NoResultToClear(MatchId),

    #[error("match {0} was decided by a BYE and has no result of its own")]
    DecidedByBye(MatchId),

    #[error("groups already exist for category {0}; rebuild the category to change its entrants")]
    GroupsFrozen(CategoryId),

    #[error("groups have not been formed for category {0}")]
    GroupsNotFormed(CategoryId),

    #[error("{pending} group match(es) still have no result")]
    GroupStageIncomplete { pending: usize },

    #[error("the bracket for category {0} already exists; discard it before changing group results")]
    BracketExists(CategoryId),

    #[error("the bracket for category {0} has not been built")]
    BracketMissing(CategoryId),

    #[error("knockout match {0} already has a result; the draw can no longer change")]
    BracketInProgress(MatchId),
}

/// Part of the bracket a placement rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketSection {
    Half,
    Quarter,
}

impl std::fmt::Display for BracketSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketSection::Half => write!(f, "half"),
            BracketSection::Quarter => write!(f, "quarter"),
        }
    }
}

/// Settings that make group or bracket creation impossible
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConfigurationError {
    #[error("group size preference must be 3 or 4, got {0}")]
    InvalidGroupSize(u8),

    #[error("{entrants} entrants cannot be split into groups of 3 and 4 (preference {preference})")]
    InfeasibleGroups { entrants: usize, preference: u8 },

    #[error("qualifiers per group must be 1, 2 or 3, got {0}")]
    InvalidQualifiers(u8),

    #[error("{qualifiers} qualifiers per group exceeds the size of group {group} ({group_size})")]
    QualifiersExceedGroupSize {
        qualifiers: u8,
        group: GroupId,
        group_size: usize,
    },

    #[error("a knockout bracket needs at least 2 qualifiers, got {0}")]
    NotEnoughQualifiers(usize),
}

/// Top-level engine error
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("category already exists: {0}")]
    CategoryExists(CategoryId),

    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("entrant not found: {0}")]
    EntrantNotFound(EntrantId),

    #[error("bracket slot not found: {0}")]
    SlotNotFound(usize),

    #[error("category {0} is unavailable: a previous writer panicked")]
    LockPoisoned(CategoryId),
}

impl EngineError {
    /// Whether the caller can simply retry with corrected input
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downstream_message_is_actionable() {
        let err = ConsistencyError::DownstreamResultExists {
            match_id: 3,
            downstream: 9,
            entrant: 12,
        };
        assert!(err.to_string().contains("delete the downstream result first"));
    }

    #[test]
    fn test_only_validation_errors_are_recoverable() {
        let validation: EngineError = ValidationError::NoSets.into();
        let consistency: EngineError = ConsistencyError::EntrantsUndetermined(4).into();
        let configuration: EngineError = ConfigurationError::InvalidGroupSize(5).into();

        assert!(validation.is_recoverable());
        assert!(!consistency.is_recoverable());
        assert!(!configuration.is_recoverable());
    }

    #[test]
    fn test_transparent_display() {
        let err: EngineError = ConfigurationError::InfeasibleGroups {
            entrants: 5,
            preference: 4,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "5 entrants cannot be split into groups of 3 and 4 (preference 4)"
        );
    }
}

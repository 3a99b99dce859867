//! Result submissions and score validation.
//!
//! Set scores follow the ITTF rules: the winner reaches at least 11 points,
//! leads by 2 or more, and once the loser has 10 or more points the lead
//! must be exactly 2. A match consists of between `sets_to_win` and
//! `best_of` sets, and no set may follow the one that decided it.

use serde::{Deserialize, Serialize};

use crate::entities::{EntrantId, Match, MatchFormat, MatchStatus, SetResult, Side};
use crate::errors::{ConsistencyError, EngineResult, ValidationError};

/// Points a set winner must reach
pub const SET_POINTS: u16 = 11;

/// A result as submitted by the operator or a scoring device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Played match with set scores as (entrant A, entrant B) pairs
    Scored {
        sets: Vec<(u16, u16)>,
        /// Declared format; must match the match's configured format when present
        #[serde(default)]
        format: Option<MatchFormat>,
        /// Declared winner, checked against the sets when present
        #[serde(default)]
        winner: Option<EntrantId>,
    },
    /// Opponent did not appear
    Walkover { winner: EntrantId },
}

impl MatchOutcome {
    pub fn scored(sets: Vec<(u16, u16)>) -> Self {
        MatchOutcome::Scored {
            sets,
            format: None,
            winner: None,
        }
    }

    pub fn walkover(winner: EntrantId) -> Self {
        MatchOutcome::Walkover { winner }
    }

    /// Attach a declared format to a scored outcome
    pub fn with_format(self, declared: MatchFormat) -> Self {
        match self {
            MatchOutcome::Scored { sets, winner, .. } => MatchOutcome::Scored {
                sets,
                format: Some(declared),
                winner,
            },
            walkover => walkover,
        }
    }

    /// Attach a declared winner to a scored outcome
    pub fn with_winner(self, declared: EntrantId) -> Self {
        match self {
            MatchOutcome::Scored { sets, format, .. } => MatchOutcome::Scored {
                sets,
                format,
                winner: Some(declared),
            },
            walkover => walkover,
        }
    }
}

/// A validated result ready to be applied to its match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub sets: Vec<SetResult>,
    pub winner: EntrantId,
    pub walkover: bool,
}

impl MatchResult {
    /// Write the result into `fixture`, marking it terminal
    pub fn apply_to(self, fixture: &mut Match) {
        fixture.sets = self.sets;
        fixture.winner = Some(self.winner);
        fixture.decided_by_bye = false;
        fixture.status = if self.walkover {
            MatchStatus::Walkover
        } else {
            MatchStatus::Completed
        };
    }
}

/// Validate one set score; `set` is the 1-based set number used in errors.
///
/// Returns the side that won the set.
pub fn validate_set(set: usize, points_a: u16, points_b: u16) -> Result<Side, ValidationError> {
    if points_a == points_b {
        return Err(ValidationError::TiedSet {
            set,
            points: points_a,
        });
    }

    let (side, winner_points, loser_points) = if points_a > points_b {
        (Side::A, points_a, points_b)
    } else {
        (Side::B, points_b, points_a)
    };
    let difference = winner_points - loser_points;

    if winner_points < SET_POINTS {
        return Err(ValidationError::WinnerBelowEleven { set, winner_points });
    }

    if loser_points >= SET_POINTS - 1 {
        if difference != 2 {
            return Err(ValidationError::InvalidDeuce { set, difference });
        }
    } else if difference < 2 {
        return Err(ValidationError::MarginTooSmall { set, difference });
    }

    Ok(side)
}

/// Validate the full list of set scores for `format`.
///
/// Returns the side that won the match.
pub fn validate_match_sets(
    sets: &[(u16, u16)],
    format: MatchFormat,
) -> Result<Side, ValidationError> {
    if sets.is_empty() {
        return Err(ValidationError::NoSets);
    }

    let needed = format.sets_to_win();
    let max = usize::from(format.best_of());
    if sets.len() < needed || sets.len() > max {
        return Err(ValidationError::WrongSetCount {
            best_of: format.best_of(),
            min: needed,
            max,
            got: sets.len(),
        });
    }

    let (mut won_a, mut won_b) = (0, 0);
    let mut decided = None;
    for (idx, &(points_a, points_b)) in sets.iter().enumerate() {
        let set = idx + 1;
        if decided.is_some() {
            return Err(ValidationError::SetAfterDecision { set });
        }

        match validate_set(set, points_a, points_b)? {
            Side::A => won_a += 1,
            Side::B => won_b += 1,
        }

        if won_a == needed {
            decided = Some(Side::A);
        } else if won_b == needed {
            decided = Some(Side::B);
        }
    }

    decided.ok_or(ValidationError::Incomplete {
        best_of: format.best_of(),
        needed,
    })
}

/// Check `outcome` against `fixture` and produce the result to apply.
///
/// # Errors
///
/// - [`ConsistencyError::InvalidTransition`] if the match already has a result
/// - [`ConsistencyError::EntrantsUndetermined`] if either entrant is unknown
/// - [`ValidationError`] for bad scores, an inconsistent declared winner or a
///   walkover winner who is not playing
pub fn validate_outcome(fixture: &Match, outcome: &MatchOutcome) -> EngineResult<MatchResult> {
    if fixture.status.is_terminal() {
        return Err(ConsistencyError::InvalidTransition {
            match_id: fixture.id,
            from: fixture.status,
            to: match outcome {
                MatchOutcome::Walkover { .. } => MatchStatus::Walkover,
                MatchOutcome::Scored { .. } => MatchStatus::Completed,
            },
        }
        .into());
    }

    let (Some(entrant_a), Some(entrant_b)) = (fixture.entrant_a, fixture.entrant_b) else {
        return Err(ConsistencyError::EntrantsUndetermined(fixture.id).into());
    };

    match outcome {
        MatchOutcome::Walkover { winner } => {
            if *winner != entrant_a && *winner != entrant_b {
                return Err(ValidationError::NotAParticipant {
                    match_id: fixture.id,
                    entrant: *winner,
                }
                .into());
            }
            Ok(MatchResult {
                sets: Vec::new(),
                winner: *winner,
                walkover: true,
            })
        }
        MatchOutcome::Scored {
            sets,
            format,
            winner,
        } => {
            if let Some(declared) = format.filter(|declared| *declared != fixture.format) {
                return Err(ValidationError::FormatMismatch {
                    declared: declared.best_of(),
                    configured: fixture.format.best_of(),
                }
                .into());
            }
            let side = validate_match_sets(sets, fixture.format)?;
            let actual = match side {
                Side::A => entrant_a,
                Side::B => entrant_b,
            };

            if let Some(declared) = *winner {
                if declared != entrant_a && declared != entrant_b {
                    return Err(ValidationError::NotAParticipant {
                        match_id: fixture.id,
                        entrant: declared,
                    }
                    .into());
                }
                if declared != actual {
                    return Err(ValidationError::WinnerMismatch { declared }.into());
                }
            }

            let sets = sets
                .iter()
                .enumerate()
                .map(|(idx, &(points_a, points_b))| SetResult {
                    ordinal: idx as u8 + 1,
                    points_a,
                    points_b,
                })
                .collect();

            Ok(MatchResult {
                sets,
                winner: actual,
                walkover: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::MatchContext;
    use crate::errors::EngineError;

    fn fixture() -> Match {
        let mut m = Match::new(
            5,
            MatchContext::Group { group: 1, round: 1 },
            MatchFormat::BestOf5,
        );
        m.entrant_a = Some(1);
        m.entrant_b = Some(2);
        m
    }

    #[test]
    fn test_valid_sets() {
        assert_eq!(validate_set(1, 11, 9), Ok(Side::A));
        assert_eq!(validate_set(1, 10, 12), Ok(Side::B));
        assert_eq!(validate_set(1, 15, 13), Ok(Side::A));
        assert_eq!(validate_set(1, 11, 0), Ok(Side::A));
    }

    #[test]
    fn test_invalid_sets() {
        assert_eq!(
            validate_set(2, 11, 10),
            Err(ValidationError::InvalidDeuce {
                set: 2,
                difference: 1
            })
        );
        assert_eq!(
            validate_set(1, 14, 10),
            Err(ValidationError::InvalidDeuce {
                set: 1,
                difference: 4
            })
        );
        assert_eq!(
            validate_set(1, 10, 8),
            Err(ValidationError::WinnerBelowEleven {
                set: 1,
                winner_points: 10
            })
        );
        assert_eq!(
            validate_set(3, 7, 7),
            Err(ValidationError::TiedSet { set: 3, points: 7 })
        );
    }

    #[test]
    fn test_match_sets() {
        assert_eq!(
            validate_match_sets(&[(11, 9), (8, 11), (12, 10), (11, 6)], MatchFormat::BestOf5),
            Ok(Side::A)
        );
        assert_eq!(
            validate_match_sets(&[(11, 9), (11, 7)], MatchFormat::BestOf5),
            Err(ValidationError::WrongSetCount {
                best_of: 5,
                min: 3,
                max: 5,
                got: 2
            })
        );
        assert_eq!(
            validate_match_sets(&[(11, 9), (11, 7), (11, 5), (5, 11)], MatchFormat::BestOf5),
            Err(ValidationError::SetAfterDecision { set: 4 })
        );
        assert_eq!(
            validate_match_sets(&[(11, 9), (7, 11), (11, 5), (5, 11)], MatchFormat::BestOf5),
            Err(ValidationError::Incomplete {
                best_of: 5,
                needed: 3
            })
        );
        assert_eq!(
            validate_match_sets(&[], MatchFormat::BestOf3),
            Err(ValidationError::NoSets)
        );
    }

    #[test]
    fn test_declared_format_must_match_configured() {
        // Best of 5 match: declaring best of 3 cannot shorten it
        let outcome = MatchOutcome::scored(vec![(11, 3), (11, 4)]).with_format(MatchFormat::BestOf3);
        assert!(matches!(
            validate_outcome(&fixture(), &outcome),
            Err(EngineError::Validation(ValidationError::FormatMismatch {
                declared: 3,
                configured: 5
            }))
        ));

        let outcome = MatchOutcome::scored(vec![(11, 3), (11, 4), (11, 5)])
            .with_format(MatchFormat::BestOf5);
        let result = validate_outcome(&fixture(), &outcome).unwrap();
        assert_eq!(result.winner, 1);
        assert_eq!(result.sets[2].ordinal, 3);
    }

    #[test]
    fn test_outcome_winner_mismatch() {
        let outcome = MatchOutcome::scored(vec![(11, 3), (11, 4), (11, 5)]).with_winner(2);
        assert!(matches!(
            validate_outcome(&fixture(), &outcome),
            Err(EngineError::Validation(ValidationError::WinnerMismatch { declared: 2 }))
        ));
    }

    #[test]
    fn test_walkover_winner_must_play() {
        assert!(matches!(
            validate_outcome(&fixture(), &MatchOutcome::walkover(9)),
            Err(EngineError::Validation(ValidationError::NotAParticipant { entrant: 9, .. }))
        ));

        let result = validate_outcome(&fixture(), &MatchOutcome::walkover(2)).unwrap();
        assert!(result.walkover);
        assert!(result.sets.is_empty());
    }

    #[test]
    fn test_undetermined_entrants() {
        let mut m = fixture();
        m.entrant_b = None;
        assert!(matches!(
            validate_outcome(&m, &MatchOutcome::walkover(1)),
            Err(EngineError::Consistency(ConsistencyError::EntrantsUndetermined(5)))
        ));
    }

    #[test]
    fn test_terminal_match_must_be_cleared_first() {
        let mut m = fixture();
        m.status = MatchStatus::Completed;
        m.winner = Some(1);
        assert!(matches!(
            validate_outcome(&m, &MatchOutcome::walkover(2)),
            Err(EngineError::Consistency(ConsistencyError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn test_apply_marks_terminal() {
        let mut m = fixture();
        validate_outcome(&m, &MatchOutcome::walkover(2))
            .unwrap()
            .apply_to(&mut m);
        assert_eq!(m.status, MatchStatus::Walkover);
        assert_eq!(m.winner, Some(2));
        assert!(m.has_played_result());
    }
}

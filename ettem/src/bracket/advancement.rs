//! Knockout state machine: results, winner propagation and rollback.
//!
//! Every public operation works on a staged copy of the bracket and
//! replaces `self` only when all steps succeed, so a completing match, the
//! slot it feeds and the next-round match always change together.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use super::models::{Bracket, SlotOccupant};
use crate::entities::{EntrantId, MatchContext, MatchId, MatchStatus};
use crate::errors::{ConsistencyError, EngineError, EngineResult};
use crate::results::{MatchOutcome, validate_outcome};

/// Observable effect of a knockout result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AdvancementEvent {
    /// `entrant` moved from `from_match` into `slot` of `round`
    Advanced {
        entrant: EntrantId,
        from_match: MatchId,
        round: u8,
        slot: usize,
        by_bye: bool,
    },
    /// `entrant` won the final
    Champion {
        entrant: EntrantId,
        final_match: MatchId,
    },
}

impl fmt::Display for AdvancementEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvancementEvent::Advanced {
                entrant,
                from_match,
                round,
                slot,
                by_bye,
            } => {
                write!(f, "Entrant {entrant} advanced from match {from_match} to round {round} slot {slot}")?;
                if *by_bye {
                    write!(f, " (BYE)")?;
                }
                Ok(())
            }
            AdvancementEvent::Champion {
                entrant,
                final_match,
            } => write!(f, "Entrant {entrant} won the final (match {final_match})"),
        }
    }
}

impl Bracket {
    /// Move a ready match to in-progress
    pub fn start_match(&mut self, match_id: MatchId) -> EngineResult<()> {
        let idx = self
            .index_of(match_id)
            .ok_or(EngineError::MatchNotFound(match_id))?;
        self.matches[idx].start()?;
        Ok(())
    }

    /// Record a result and advance the winner as far as BYEs allow.
    ///
    /// # Errors
    ///
    /// Validation errors for malformed scores; consistency errors when the
    /// match is not ready, already decided, or the next slot is held by a
    /// different entrant.
    pub fn record_result(
        &mut self,
        match_id: MatchId,
        outcome: &MatchOutcome,
    ) -> EngineResult<Vec<AdvancementEvent>> {
        let idx = self
            .index_of(match_id)
            .ok_or(EngineError::MatchNotFound(match_id))?;
        let result = validate_outcome(&self.matches[idx], outcome)?;

        let mut staged = self.clone();
        result.apply_to(&mut staged.matches[idx]);

        let mut events = Vec::new();
        let mut worklist = VecDeque::new();
        if let Some(next_idx) = staged.advance_winner(idx, false, &mut events)? {
            worklist.push_back(next_idx);
        }
        staged.settle_byes(worklist, &mut events)?;

        *self = staged;
        Ok(events)
    }

    /// Remove a result, pulling its winner back out of later rounds.
    ///
    /// Slots the winner reached through BYEs are cleared along the way.
    ///
    /// # Errors
    ///
    /// [`ConsistencyError::DownstreamResultExists`] when the winner already
    /// has a played result in a later round.
    pub fn clear_result(&mut self, match_id: MatchId) -> EngineResult<()> {
        let idx = self
            .index_of(match_id)
            .ok_or(EngineError::MatchNotFound(match_id))?;
        let fixture = &self.matches[idx];
        if fixture.decided_by_bye {
            return Err(ConsistencyError::DecidedByBye(match_id).into());
        }
        let Some(winner) = fixture.winner.filter(|_| fixture.is_decided()) else {
            return Err(ConsistencyError::NoResultToClear(match_id).into());
        };

        let mut staged = self.clone();
        let mut current = idx;
        while let Some(next) = staged.matches[current].next {
            let next_idx = staged
                .index_of(next.match_id)
                .ok_or(EngineError::MatchNotFound(next.match_id))?;

            if staged.matches[next_idx].has_played_result() {
                warn!(
                    "Refusing to clear match {}: entrant {} already played match {}",
                    match_id, winner, next.match_id
                );
                return Err(ConsistencyError::DownstreamResultExists {
                    match_id,
                    downstream: next.match_id,
                    entrant: winner,
                }
                .into());
            }

            if let Some(slot) = staged.slot_mut(next.round, next.slot) {
                slot.occupant = SlotOccupant::Empty;
                slot.advanced_by_bye = false;
            }
            let downstream = &mut staged.matches[next_idx];
            downstream.set_entrant(next.side, None);
            debug!(
                "Rolled back entrant {} from round {} slot {}",
                winner, next.round, next.slot
            );

            if downstream.decided_by_bye {
                downstream.clear_result();
                current = next_idx;
            } else {
                downstream.status = MatchStatus::Pending;
                break;
            }
        }

        staged.matches[idx].clear_result();
        *self = staged;
        info!("Cleared result of knockout match {}", match_id);
        Ok(())
    }

    /// Place the winner of match `idx` into the slot it feeds.
    ///
    /// Returns the arena index of the next match when there is one.
    fn advance_winner(
        &mut self,
        idx: usize,
        by_bye: bool,
        events: &mut Vec<AdvancementEvent>,
    ) -> Result<Option<usize>, ConsistencyError> {
        let fixture = &self.matches[idx];
        let (from_match, next) = (fixture.id, fixture.next);
        let Some(winner) = fixture.winner else {
            return Ok(None);
        };

        let Some(next) = next else {
            info!("Entrant {} won the {} final", winner, self.category);
            events.push(AdvancementEvent::Champion {
                entrant: winner,
                final_match: from_match,
            });
            return Ok(None);
        };

        let Some(slot) = self.slot_mut(next.round, next.slot) else {
            return Ok(None);
        };
        match slot.occupant {
            SlotOccupant::Empty => {
                slot.occupant = SlotOccupant::Entrant(winner);
                slot.advanced_by_bye = by_bye;
            }
            SlotOccupant::Entrant(existing) if existing == winner => {}
            SlotOccupant::Entrant(existing) => {
                return Err(ConsistencyError::SlotOccupied {
                    round: next.round,
                    slot: next.slot,
                    occupant: existing,
                    incoming: winner,
                });
            }
            SlotOccupant::Bye => {
                return Err(ConsistencyError::SlotIsBye {
                    round: next.round,
                    slot: next.slot,
                    incoming: winner,
                });
            }
        }

        let next_idx = self.index_of(next.match_id);
        if let Some(next_idx) = next_idx {
            self.matches[next_idx].set_entrant(next.side, Some(winner));
        }

        debug!(
            "Entrant {} advanced from match {} to round {} slot {}{}",
            winner,
            from_match,
            next.round,
            next.slot,
            if by_bye { " by BYE" } else { "" }
        );
        events.push(AdvancementEvent::Advanced {
            entrant: winner,
            from_match,
            round: next.round,
            slot: next.slot,
            by_bye,
        });

        Ok(next_idx)
    }

    /// Resolve BYE pairings until nothing changes.
    ///
    /// An entrant facing a BYE wins without playing and moves on; two BYEs
    /// facing each other send a BYE forward. Each filled slot puts the match
    /// it feeds back on the worklist, so chains of BYEs resolve fully.
    pub(crate) fn settle_byes(
        &mut self,
        mut worklist: VecDeque<usize>,
        events: &mut Vec<AdvancementEvent>,
    ) -> Result<(), ConsistencyError> {
        while let Some(idx) = worklist.pop_front() {
            let fixture = &self.matches[idx];
            if fixture.status.is_terminal() {
                continue;
            }
            let MatchContext::Knockout { round, number } = fixture.context else {
                continue;
            };
            let next = fixture.next;

            let top = self.occupant(round, 2 * number - 1);
            let bottom = self.occupant(round, 2 * number);

            match (top, bottom) {
                (SlotOccupant::Entrant(entrant), SlotOccupant::Bye)
                | (SlotOccupant::Bye, SlotOccupant::Entrant(entrant)) => {
                    let fixture = &mut self.matches[idx];
                    fixture.sets.clear();
                    fixture.status = MatchStatus::Completed;
                    fixture.winner = Some(entrant);
                    fixture.decided_by_bye = true;

                    if let Some(next_idx) = self.advance_winner(idx, true, events)? {
                        worklist.push_back(next_idx);
                    }
                }
                (SlotOccupant::Bye, SlotOccupant::Bye) => {
                    let Some(next) = next else {
                        continue;
                    };
                    let Some(slot) = self.slot_mut(next.round, next.slot) else {
                        continue;
                    };
                    if slot.occupant.is_empty() {
                        slot.occupant = SlotOccupant::Bye;
                        debug!("BYE carried into round {} slot {}", next.round, next.slot);
                        if let Some(next_idx) = self.index_of(next.match_id) {
                            worklist.push_back(next_idx);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Re-run BYE resolution over the whole first round
    pub(crate) fn settle_first_round(&mut self) -> Result<Vec<AdvancementEvent>, ConsistencyError> {
        let mut events = Vec::new();
        let worklist = (0..self.match_count(1)).collect();
        self.settle_byes(worklist, &mut events)?;
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::MatchFormat;
    use crate::errors::ValidationError;

    /// 4-slot bracket with slots filled as given, BYEs settled
    fn bracket(occupants: [SlotOccupant; 4]) -> Bracket {
        let mut bracket = Bracket::new("U13", 4, 1, MatchFormat::BestOf3);
        for (slot, occupant) in occupants.into_iter().enumerate() {
            bracket.rounds[0].slots[slot].occupant = occupant;
        }
        bracket.sync_round_entrants(1);
        bracket.settle_first_round().unwrap();
        bracket
    }

    /// Entrant A wins in two sets
    fn straight() -> MatchOutcome {
        MatchOutcome::scored(vec![(11, 5), (11, 6)])
    }

    #[test]
    fn test_bye_advances_at_build() {
        use SlotOccupant::*;
        let bracket = bracket([Entrant(10), Bye, Entrant(20), Entrant(30)]);

        let first = &bracket.matches[0];
        assert!(first.decided_by_bye);
        assert_eq!(first.winner, Some(10));
        assert_eq!(bracket.occupant(2, 1), Entrant(10));
        assert!(bracket.slot(2, 1).unwrap().advanced_by_bye);
        assert_eq!(bracket.matches[2].entrant_a, Some(10));
        assert_eq!(bracket.matches[2].entrant_b, None);
    }

    #[test]
    fn test_result_advances_and_crowns() {
        use SlotOccupant::*;
        let mut bracket = bracket([Entrant(10), Entrant(20), Entrant(30), Entrant(40)]);

        let events = bracket.record_result(1, &straight()).unwrap();
        assert_eq!(
            events,
            vec![AdvancementEvent::Advanced {
                entrant: 10,
                from_match: 1,
                round: 2,
                slot: 1,
                by_bye: false
            }]
        );

        bracket
            .record_result(2, &MatchOutcome::walkover(40))
            .unwrap();
        assert_eq!(bracket.matches[2].entrant_b, Some(40));

        let events = bracket
            .record_result(3, &MatchOutcome::scored(vec![(5, 11), (11, 9), (9, 11)]))
            .unwrap();
        assert_eq!(
            events,
            vec![AdvancementEvent::Champion {
                entrant: 40,
                final_match: 3
            }]
        );
        assert_eq!(bracket.champion(), Some(40));
    }

    #[test]
    fn test_bad_score_leaves_bracket_untouched() {
        use SlotOccupant::*;
        let mut bracket = bracket([Entrant(10), Entrant(20), Entrant(30), Entrant(40)]);
        let before = bracket.clone();

        let err = bracket
            .record_result(1, &MatchOutcome::scored(vec![(11, 10), (11, 5)]))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::InvalidDeuce { set: 1, .. })
        ));
        assert_eq!(bracket, before);
    }

    #[test]
    fn test_occupied_slot_is_not_overwritten() {
        use SlotOccupant::*;
        let mut bracket = bracket([Entrant(10), Entrant(20), Entrant(30), Entrant(40)]);
        bracket.rounds[1].slots[0].occupant = Entrant(99);
        let before = bracket.clone();

        let err = bracket.record_result(1, &straight()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Consistency(ConsistencyError::SlotOccupied {
                occupant: 99,
                incoming: 10,
                ..
            })
        ));
        assert_eq!(bracket, before);
    }

    #[test]
    fn test_clear_then_record_is_idempotent() {
        use SlotOccupant::*;
        let mut bracket = bracket([Entrant(10), Entrant(20), Entrant(30), Entrant(40)]);
        bracket.record_result(1, &straight()).unwrap();
        let recorded = bracket.clone();

        bracket.clear_result(1).unwrap();
        assert_eq!(bracket.occupant(2, 1), Empty);
        assert_eq!(bracket.matches[2].entrant_a, None);
        assert_eq!(bracket.matches[0].status, MatchStatus::Pending);

        bracket.record_result(1, &straight()).unwrap();
        assert_eq!(bracket, recorded);
    }

    #[test]
    fn test_clear_refused_after_downstream_result() {
        use SlotOccupant::*;
        let mut bracket = bracket([Entrant(10), Entrant(20), Entrant(30), Entrant(40)]);
        bracket.record_result(1, &straight()).unwrap();
        bracket.record_result(2, &straight()).unwrap();
        bracket.record_result(3, &straight()).unwrap();
        let before = bracket.clone();

        let err = bracket.clear_result(1).unwrap_err();
        assert!(err.to_string().contains("delete the downstream result first"));
        assert_eq!(bracket, before);

        bracket.clear_result(3).unwrap();
        bracket.clear_result(1).unwrap();
        assert_eq!(bracket.champion(), None);
    }

    #[test]
    fn test_bye_decided_match_cannot_be_cleared() {
        use SlotOccupant::*;
        let mut bracket = bracket([Entrant(10), Bye, Entrant(20), Entrant(30)]);
        assert!(matches!(
            bracket.clear_result(1),
            Err(EngineError::Consistency(ConsistencyError::DecidedByBye(1)))
        ));
        assert!(matches!(
            bracket.clear_result(2),
            Err(EngineError::Consistency(ConsistencyError::NoResultToClear(2)))
        ));
    }

    #[test]
    fn test_start_then_record() {
        use SlotOccupant::*;
        let mut bracket = bracket([Entrant(10), Entrant(20), Entrant(30), Entrant(40)]);
        bracket.start_match(1).unwrap();
        assert_eq!(bracket.matches[0].status, MatchStatus::InProgress);
        assert!(bracket.record_result(1, &straight()).is_ok());
        assert!(matches!(
            bracket.start_match(3),
            Err(EngineError::Consistency(ConsistencyError::EntrantsUndetermined(3)))
        ));
        assert!(matches!(
            bracket.start_match(42),
            Err(EngineError::MatchNotFound(42))
        ));
    }

    #[test]
    fn test_ids_below_the_bracket_are_not_found() {
        let mut bracket = Bracket::new("U13", 4, 10, MatchFormat::BestOf3);
        assert!(matches!(
            bracket.record_result(MatchId::MIN, &MatchOutcome::walkover(1)),
            Err(EngineError::MatchNotFound(MatchId::MIN))
        ));
        assert!(matches!(
            bracket.clear_result(MatchId::MIN),
            Err(EngineError::MatchNotFound(MatchId::MIN))
        ));
        assert!(matches!(
            bracket.start_match(MatchId::MAX),
            Err(EngineError::MatchNotFound(MatchId::MAX))
        ));
    }
}

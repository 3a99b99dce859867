//! Bracket models.
//!
//! A bracket is an arena: every slot of every round and every match is
//! created when the bracket is built. Match `k` of round `r` is fed by slots
//! `2k - 1` and `2k` of round `r` and feeds slot `k` of round `r + 1`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::entities::{
    CategoryId, EntrantId, GroupId, Match, MatchContext, MatchFormat, MatchId, NextSlot, RoundType,
    Side,
};

/// What a slot holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entrant", rename_all = "snake_case")]
pub enum SlotOccupant {
    /// To be determined
    #[default]
    Empty,
    Entrant(EntrantId),
    Bye,
}

impl SlotOccupant {
    pub fn entrant(self) -> Option<EntrantId> {
        match self {
            SlotOccupant::Entrant(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_bye(self) -> bool {
        self == SlotOccupant::Bye
    }

    pub fn is_empty(self) -> bool {
        self == SlotOccupant::Empty
    }
}

impl fmt::Display for SlotOccupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotOccupant::Empty => write!(f, "TBD"),
            SlotOccupant::Entrant(id) => write!(f, "#{id}"),
            SlotOccupant::Bye => write!(f, "BYE"),
        }
    }
}

/// One position in a bracket round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlot {
    pub round: u8,
    /// 1-based, top to bottom
    pub slot: usize,
    pub occupant: SlotOccupant,
    /// First-round opponent shares the country code (review only)
    pub same_country_warning: bool,
    /// Entrant arrived here without playing
    pub advanced_by_bye: bool,
}

/// All slots of one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRound {
    /// 1 = first round
    pub round: u8,
    pub round_type: RoundType,
    pub slots: Vec<BracketSlot>,
}

/// An entrant that advanced from the group stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    pub entrant: EntrantId,
    pub group: GroupId,
    /// Finishing position in the group (1 = winner)
    pub finish: u32,
    pub country: String,
    pub seed: Option<u32>,
}

/// A knockout bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub category: CategoryId,
    /// First-round slot count, a power of two
    pub size: usize,
    pub rounds: Vec<BracketRound>,
    /// Every match of every round, round by round, top to bottom
    pub matches: Vec<Match>,
    /// Entrants eligible for the first round, best first
    pub qualifiers: Vec<Qualifier>,
    base_id: MatchId,
}

impl Bracket {
    /// Materialize an empty bracket of `size` slots.
    ///
    /// Match ids run from `base_id` in arena order. `size` must be a power
    /// of two and at least 2.
    pub fn new(category: &str, size: usize, base_id: MatchId, format: MatchFormat) -> Self {
        let round_count = size.max(2).trailing_zeros() as u8;

        let rounds: Vec<BracketRound> = (1..=round_count)
            .map(|round| {
                let slot_count = size >> (round - 1);
                BracketRound {
                    round,
                    round_type: RoundType::for_slots(slot_count),
                    slots: (1..=slot_count)
                        .map(|slot| BracketSlot {
                            round,
                            slot,
                            occupant: SlotOccupant::Empty,
                            same_country_warning: false,
                            advanced_by_bye: false,
                        })
                        .collect(),
                }
            })
            .collect();

        let mut bracket = Self {
            category: CategoryId::from(category),
            size,
            rounds,
            matches: Vec::with_capacity(size.saturating_sub(1)),
            qualifiers: Vec::new(),
            base_id,
        };

        for round in 1..=round_count {
            for number in 1..=bracket.match_count(round) {
                let id = base_id + bracket.matches.len() as MatchId;
                let mut fixture = Match::new(id, MatchContext::Knockout { round, number }, format);
                if round < round_count {
                    let next_number = number.div_ceil(2);
                    fixture.next = Some(NextSlot {
                        match_id: base_id + (bracket.offset(round + 1) + next_number - 1) as MatchId,
                        round: round + 1,
                        slot: number,
                        side: if number % 2 == 1 { Side::A } else { Side::B },
                    });
                }
                bracket.matches.push(fixture);
            }
        }

        bracket
    }

    pub fn round_count(&self) -> u8 {
        self.rounds.len() as u8
    }

    /// Matches in `round`
    pub fn match_count(&self, round: u8) -> usize {
        self.size >> round
    }

    /// Arena index of the first match of `round`
    fn offset(&self, round: u8) -> usize {
        (1..round).map(|r| self.match_count(r)).sum()
    }

    /// Arena index of match `number` of `round`
    pub fn match_index(&self, round: u8, number: usize) -> Option<usize> {
        if round == 0 || round > self.round_count() || number == 0 || number > self.match_count(round) {
            return None;
        }
        Some(self.offset(round) + number - 1)
    }

    /// Arena index of a match id
    pub fn index_of(&self, match_id: MatchId) -> Option<usize> {
        let idx = usize::try_from(match_id.checked_sub(self.base_id)?).ok()?;
        (idx < self.matches.len()).then_some(idx)
    }

    pub fn get_match(&self, match_id: MatchId) -> Option<&Match> {
        self.index_of(match_id).map(|idx| &self.matches[idx])
    }

    pub fn match_at(&self, round: u8, number: usize) -> Option<&Match> {
        self.match_index(round, number).map(|idx| &self.matches[idx])
    }

    /// Id range used by this bracket's matches
    pub fn id_range(&self) -> std::ops::Range<MatchId> {
        self.base_id..self.base_id + self.matches.len() as MatchId
    }

    pub fn slot(&self, round: u8, slot: usize) -> Option<&BracketSlot> {
        self.rounds
            .get(usize::from(round).checked_sub(1)?)?
            .slots
            .get(slot.checked_sub(1)?)
    }

    pub fn slot_mut(&mut self, round: u8, slot: usize) -> Option<&mut BracketSlot> {
        self.rounds
            .get_mut(usize::from(round).checked_sub(1)?)?
            .slots
            .get_mut(slot.checked_sub(1)?)
    }

    pub fn occupant(&self, round: u8, slot: usize) -> SlotOccupant {
        self.slot(round, slot).map_or(SlotOccupant::Empty, |s| s.occupant)
    }

    /// First-round slot numbers holding a BYE
    pub fn bye_slots(&self) -> Vec<usize> {
        self.first_round_slots()
            .filter(|s| s.occupant.is_bye())
            .map(|s| s.slot)
            .collect()
    }

    /// First-round slot holding `entrant`
    pub fn slot_of(&self, entrant: EntrantId) -> Option<usize> {
        self.first_round_slots()
            .find(|s| s.occupant == SlotOccupant::Entrant(entrant))
            .map(|s| s.slot)
    }

    pub fn first_round_slots(&self) -> impl Iterator<Item = &BracketSlot> {
        self.rounds.iter().take(1).flat_map(|r| r.slots.iter())
    }

    /// The final match
    pub fn final_match(&self) -> Option<&Match> {
        self.matches.last()
    }

    /// Winner of the final, once decided
    pub fn champion(&self) -> Option<EntrantId> {
        self.final_match()
            .filter(|m| m.is_decided())
            .and_then(|m| m.winner)
    }

    /// First knockout match that has a played result
    pub fn first_played(&self) -> Option<&Match> {
        self.matches.iter().find(|m| m.has_played_result())
    }

    pub fn qualifier(&self, entrant: EntrantId) -> Option<&Qualifier> {
        self.qualifiers.iter().find(|q| q.entrant == entrant)
    }

    /// Copy slot occupants of `round` into the entrant fields of its matches
    pub(crate) fn sync_round_entrants(&mut self, round: u8) {
        let Some(offset) = self.match_index(round, 1) else {
            return;
        };
        for number in 1..=self.match_count(round) {
            let a = self.occupant(round, 2 * number - 1).entrant();
            let b = self.occupant(round, 2 * number).entrant();
            let fixture = &mut self.matches[offset + number - 1];
            fixture.entrant_a = a;
            fixture.entrant_b = b;
        }
    }

    /// Recompute same-country flags of first-round pairs.
    ///
    /// Returns the flagged slot pairs.
    pub(crate) fn refresh_country_warnings(&mut self) -> Vec<(usize, usize)> {
        let countries: HashMap<EntrantId, &str> = self
            .qualifiers
            .iter()
            .map(|q| (q.entrant, q.country.as_str()))
            .collect();

        let mut flagged = Vec::new();
        let Some(first) = self.rounds.first_mut() else {
            return flagged;
        };

        for pair in first.slots.chunks_mut(2) {
            let [top, bottom] = pair else {
                continue;
            };
            let same = match (top.occupant.entrant(), bottom.occupant.entrant()) {
                (Some(a), Some(b)) => {
                    let (ca, cb) = (countries.get(&a), countries.get(&b));
                    ca.is_some() && ca == cb
                }
                _ => false,
            };
            top.same_country_warning = same;
            bottom.same_country_warning = same;
            if same {
                flagged.push((top.slot, bottom.slot));
            }
        }

        flagged
    }

    /// Reset every round after the first and every match.
    ///
    /// First-round occupants are kept and copied into the first-round matches.
    pub(crate) fn reset_from_first_round(&mut self) {
        for round in self.rounds.iter_mut().skip(1) {
            for slot in &mut round.slots {
                slot.occupant = SlotOccupant::Empty;
                slot.advanced_by_bye = false;
            }
        }
        for fixture in &mut self.matches {
            fixture.clear_result();
            fixture.entrant_a = None;
            fixture.entrant_b = None;
        }
        self.sync_round_entrants(1);
    }
}

//! Placement rules shared by the automatic draw and manual slot assignment.
//!
//! Hard rules: an entrant occupies at most one first-round slot, group
//! winners and runners-up of the same group sit in opposite halves, and a
//! third-placed qualifier does not share a quarter with its groupmates.
//! Same-country first-round pairs are only flagged.

use log::{info, warn};

use super::models::{Bracket, Qualifier, SlotOccupant};
use crate::entities::MatchStatus;
use crate::errors::{BracketSection, ConsistencyError, EngineError, EngineResult};

/// 0-based half of a first-round slot
pub fn half_of(slot: usize, size: usize) -> usize {
    (slot - 1) / (size / 2).max(1)
}

/// 0-based quarter of a first-round slot
pub fn quarter_of(slot: usize, size: usize) -> usize {
    (slot - 1) / (size / 4).max(1)
}

/// Section two groupmates must not share
pub fn section_between(a: &Qualifier, b: &Qualifier) -> BracketSection {
    if a.finish <= 2 && b.finish <= 2 {
        BracketSection::Half
    } else {
        BracketSection::Quarter
    }
}

/// Whether two slots lie in the same section
pub fn same_section(section: BracketSection, a: usize, b: usize, size: usize) -> bool {
    match section {
        BracketSection::Half => half_of(a, size) == half_of(b, size),
        BracketSection::Quarter => quarter_of(a, size) == quarter_of(b, size),
    }
}

/// Check that `candidate` may take first-round `slot` given the current
/// occupants of the other slots.
pub fn check_slot(
    bracket: &Bracket,
    candidate: &Qualifier,
    slot: usize,
) -> Result<(), ConsistencyError> {
    if let Some(existing) = bracket.slot_of(candidate.entrant) {
        if existing != slot {
            return Err(ConsistencyError::DuplicateEntrant {
                entrant: candidate.entrant,
                existing,
                requested: slot,
            });
        }
    }

    for placed in bracket.first_round_slots().filter(|s| s.slot != slot) {
        let Some(other) = placed
            .occupant
            .entrant()
            .and_then(|id| bracket.qualifier(id))
        else {
            continue;
        };
        if other.group != candidate.group || other.entrant == candidate.entrant {
            continue;
        }

        let section = section_between(candidate, other);
        if same_section(section, slot, placed.slot, bracket.size) {
            return Err(ConsistencyError::SameGroupSameSection {
                group: candidate.group,
                entrant: candidate.entrant,
                other: other.entrant,
                section,
            });
        }
    }

    Ok(())
}

impl Bracket {
    /// Manually set a first-round slot to an entrant, a BYE or empty.
    ///
    /// The hard rules of the automatic draw apply; nothing is redrawn to make
    /// room. Later rounds are rebuilt from the new first round and BYEs are
    /// resolved again. Refused once any knockout match has started.
    pub fn assign_slot(&mut self, slot: usize, occupant: SlotOccupant) -> EngineResult<()> {
        if slot == 0 || slot > self.size {
            return Err(EngineError::SlotNotFound(slot));
        }
        if let Some(started) = self
            .matches
            .iter()
            .find(|m| m.has_played_result() || m.status == MatchStatus::InProgress)
        {
            return Err(ConsistencyError::BracketInProgress(started.id).into());
        }

        if let SlotOccupant::Entrant(entrant) = occupant {
            let candidate = self
                .qualifier(entrant)
                .ok_or(EngineError::EntrantNotFound(entrant))?;
            if let Err(err) = check_slot(self, candidate, slot) {
                warn!("Manual placement of entrant {} in slot {} refused: {}", entrant, slot, err);
                return Err(err.into());
            }
        }

        let mut staged = self.clone();
        if let Some(target) = staged.slot_mut(1, slot) {
            target.occupant = occupant;
        }
        staged.reset_from_first_round();
        for (top, bottom) in staged.refresh_country_warnings() {
            warn!("Same-country first-round pairing in slots {} and {}", top, bottom);
        }
        staged.settle_first_round()?;

        *self = staged;
        info!("Slot {} of the {} bracket set to {}", slot, self.category, occupant);
        Ok(())
    }
}

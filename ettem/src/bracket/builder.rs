//! Automatic bracket construction from group qualifiers.

use log::{info, warn};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::byes::{bracket_size, bye_slots, seeding_order};
use super::models::{Bracket, Qualifier, SlotOccupant};
use super::placement::check_slot;
use crate::entities::{MatchFormat, MatchId};
use crate::errors::{BracketSection, ConfigurationError, ConsistencyError, EngineResult};

/// Placement attempts before a draw is declared infeasible
const SEARCH_BUDGET: usize = 200_000;

/// Builds seeded knockout brackets with a deterministic draw
pub struct BracketBuilder {
    rng: ChaCha8Rng,
    format: MatchFormat,
}

impl BracketBuilder {
    /// Create a builder whose draw is fully determined by `seed`
    ///
    /// The generator is ChaCha8, whose stream for a seed does not change
    /// between rand releases.
    pub fn new(seed: u64, format: MatchFormat) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed), format)
    }

    /// Create a builder drawing from an already seeded generator
    pub fn from_rng(rng: ChaCha8Rng, format: MatchFormat) -> Self {
        Self { rng, format }
    }

    /// Build the bracket for `qualifiers`.
    ///
    /// Qualifiers are expected best first within each finishing position
    /// (group winners ranked across groups, then runners-up, then thirds).
    /// The best group winner takes slot 1 and the second best the last slot;
    /// the remaining winners are drawn into the next seed positions.
    /// Runners-up are drawn into the half opposite their group winner and
    /// thirds into a quarter free of their groupmates.
    ///
    /// BYE slots come from [`bye_slots`].
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::NotEnoughQualifiers`] below two qualifiers and
    /// [`ConsistencyError::PlacementInfeasible`] when no slot satisfies the
    /// section rules for some entrant.
    pub fn build(
        &mut self,
        category: &str,
        qualifiers: Vec<Qualifier>,
        groups: usize,
        qualifiers_per_group: u8,
        base_id: MatchId,
    ) -> EngineResult<Bracket> {
        if qualifiers.len() < 2 {
            return Err(ConfigurationError::NotEnoughQualifiers(qualifiers.len()).into());
        }

        let size = bracket_size(qualifiers.len());
        let byes = bye_slots(qualifiers.len(), groups, qualifiers_per_group);

        let mut bracket = Bracket::new(category, size, base_id, self.format);
        bracket.qualifiers = qualifiers;
        for &slot in &byes {
            set_occupant(&mut bracket, slot, SlotOccupant::Bye);
        }

        let open: Vec<usize> = seeding_order(size)
            .into_iter()
            .filter(|slot| !byes.contains(slot))
            .collect();

        self.place_group_winners(&mut bracket, &open);
        self.place_remaining(&mut bracket)?;

        bracket.reset_from_first_round();
        for (top, bottom) in bracket.refresh_country_warnings() {
            warn!(
                "Same-country first-round pairing in slots {} and {} of the {} bracket",
                top, bottom, category
            );
        }
        let events = bracket.settle_first_round()?;

        info!(
            "Built {}-slot bracket for category {}: {} qualifiers, {} BYE(s), {} advanced by BYE",
            size,
            category,
            bracket.qualifiers.len(),
            byes.len(),
            events.len()
        );

        Ok(bracket)
    }

    /// Group winners into the first seed positions: best two fixed, rest drawn
    fn place_group_winners(&mut self, bracket: &mut Bracket, open: &[usize]) {
        let winners: Vec<_> = bracket
            .qualifiers
            .iter()
            .filter(|q| q.finish == 1)
            .map(|q| q.entrant)
            .collect();
        let count = winners.len().min(open.len());

        let mut drawn = winners[..count].to_vec();
        if count > 2 {
            drawn[2..].shuffle(&mut self.rng);
        }

        for (&slot, &entrant) in open.iter().zip(&drawn) {
            set_occupant(bracket, slot, SlotOccupant::Entrant(entrant));
        }
    }

    /// Draw runners-up and thirds into slots allowed by the section rules.
    ///
    /// Candidates are tried in drawn order with backtracking, so a drawn
    /// runner-up never blocks a third when another arrangement exists.
    fn place_remaining(&mut self, bracket: &mut Bracket) -> Result<(), ConsistencyError> {
        let pending: Vec<(Qualifier, BracketSection)> = [
            (2, BracketSection::Half),
            (3, BracketSection::Quarter),
        ]
        .into_iter()
        .flat_map(|(finish, section)| {
            bracket
                .qualifiers
                .iter()
                .filter(move |q| q.finish == finish)
                .map(move |q| (q.clone(), section))
        })
        .collect();

        let mut budget = SEARCH_BUDGET;
        self.search(bracket, &pending, 0, &mut budget)
            .map_err(|stuck| {
                let (qualifier, section) = &pending[stuck];
                warn!(
                    "No legal slot for entrant {} of group {} in the {} bracket",
                    qualifier.entrant, qualifier.group, bracket.category
                );
                ConsistencyError::PlacementInfeasible {
                    group: qualifier.group,
                    entrant: qualifier.entrant,
                    section: *section,
                }
            })
    }

    /// Place `pending[idx..]`; on failure returns the deepest index reached
    fn search(
        &mut self,
        bracket: &mut Bracket,
        pending: &[(Qualifier, BracketSection)],
        idx: usize,
        budget: &mut usize,
    ) -> Result<(), usize> {
        let Some((qualifier, _)) = pending.get(idx) else {
            return Ok(());
        };

        let mut candidates: Vec<usize> = bracket
            .first_round_slots()
            .filter(|s| s.occupant.is_empty())
            .map(|s| s.slot)
            .collect();
        candidates.shuffle(&mut self.rng);

        let mut deepest = idx;
        for slot in candidates {
            if *budget == 0 {
                break;
            }
            *budget -= 1;

            if check_slot(bracket, qualifier, slot).is_err() {
                continue;
            }
            set_occupant(bracket, slot, SlotOccupant::Entrant(qualifier.entrant));
            match self.search(bracket, pending, idx + 1, budget) {
                Ok(()) => return Ok(()),
                Err(stuck) => {
                    deepest = deepest.max(stuck);
                    set_occupant(bracket, slot, SlotOccupant::Empty);
                }
            }
        }

        Err(deepest)
    }
}

fn set_occupant(bracket: &mut Bracket, slot: usize, occupant: SlotOccupant) {
    if let Some(target) = bracket.slot_mut(1, slot) {
        target.occupant = occupant;
    }
}

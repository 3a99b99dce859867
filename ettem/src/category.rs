//! One category's competition state and its operations.
//!
//! A category moves through registration, group stage and knockout stage.
//! Operations that touch several records validate first and then apply a
//! staged copy, so a failing call leaves the category unchanged.

use log::{info, warn};

use crate::bracket::{AdvancementEvent, Bracket, BracketBuilder, Qualifier, SlotOccupant};
use crate::config::CompetitionConfig;
use crate::entities::{
    CategoryId, Entrant, EntrantId, Group, GroupId, Match, MatchContext, MatchId, NewEntrant,
};
use crate::errors::{
    ConfigurationError, ConsistencyError, EngineError, EngineResult, ValidationError,
};
use crate::groups::{FixtureGenerator, GroupFormer};
use crate::results::{MatchOutcome, validate_outcome};
use crate::standings::{StandingEntry, StandingsCalculator, compare_across_groups};

/// Full state of one category
#[derive(Debug, Clone)]
pub struct Category {
    id: CategoryId,
    config: CompetitionConfig,
    entrants: Vec<Entrant>,
    groups: Vec<Group>,
    group_matches: Vec<Match>,
    bracket: Option<Bracket>,
    next_entrant_id: EntrantId,
    next_group_id: GroupId,
    next_match_id: MatchId,
}

impl Category {
    /// Create an empty category
    pub fn new(id: impl Into<CategoryId>, config: CompetitionConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            id: id.into(),
            config,
            entrants: Vec::new(),
            groups: Vec::new(),
            group_matches: Vec::new(),
            bracket: None,
            next_entrant_id: 1,
            next_group_id: 1,
            next_match_id: 1,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &CompetitionConfig {
        &self.config
    }

    pub fn entrants(&self) -> &[Entrant] {
        &self.entrants
    }

    pub fn entrant(&self, entrant: EntrantId) -> Option<&Entrant> {
        self.entrants.iter().find(|e| e.id == entrant)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, group: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group)
    }

    pub fn group_matches(&self) -> &[Match] {
        &self.group_matches
    }

    /// Fixtures of one group in round order
    pub fn fixtures(&self, group: GroupId) -> Vec<&Match> {
        self.group_matches
            .iter()
            .filter(|m| matches!(m.context, MatchContext::Group { group: id, .. } if id == group))
            .collect()
    }

    pub fn bracket(&self) -> Option<&Bracket> {
        self.bracket.as_ref()
    }

    /// Any match of the category, group or knockout
    pub fn find_match(&self, match_id: MatchId) -> Option<&Match> {
        self.group_matches
            .iter()
            .find(|m| m.id == match_id)
            .or_else(|| self.bracket.as_ref()?.get_match(match_id))
    }

    /// Winner of the final
    pub fn champion(&self) -> Option<EntrantId> {
        self.bracket.as_ref()?.champion()
    }

    /// Register an entrant; only allowed before groups are formed
    pub fn register_entrant(&mut self, entrant: NewEntrant) -> EngineResult<EntrantId> {
        if !self.groups.is_empty() {
            return Err(ConsistencyError::GroupsFrozen(self.id.clone()).into());
        }
        let name = entrant.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let id = self.next_entrant_id;
        self.entrants.push(Entrant {
            id,
            name: name.to_string(),
            country: entrant.country.trim().to_uppercase(),
            rank_score: entrant.rank_score.max(0.0),
            group: None,
            seed: None,
        });
        self.next_entrant_id += 1;
        Ok(id)
    }

    /// Seed the entrants into groups and generate every group's fixtures
    pub fn form_groups(&mut self) -> EngineResult<&[Group]> {
        if !self.groups.is_empty() {
            return Err(ConsistencyError::GroupsFrozen(self.id.clone()).into());
        }

        let mut entrants = self.entrants.clone();
        let groups = GroupFormer::new(self.config.group_size_preference).form(
            &self.id,
            &mut entrants,
            self.next_group_id,
        )?;
        self.check_qualifiers_fit(&groups)?;

        let generator = FixtureGenerator::new(self.config.group_format);
        let mut next_match_id = self.next_match_id;
        let matches: Vec<Match> = groups
            .iter()
            .flat_map(|group| generator.generate(group, &mut next_match_id))
            .collect();

        info!(
            "Category {}: {} group(s), {} group match(es)",
            self.id,
            groups.len(),
            matches.len()
        );

        self.next_group_id += groups.len() as GroupId;
        self.next_match_id = next_match_id;
        self.entrants = entrants;
        self.groups = groups;
        self.group_matches = matches;
        Ok(&self.groups)
    }

    /// Discard groups, fixtures, results and bracket, then form groups again
    pub fn rebuild_groups(&mut self) -> EngineResult<&[Group]> {
        let mut staged = self.clone();
        staged.groups.clear();
        staged.group_matches.clear();
        staged.bracket = None;
        for entrant in &mut staged.entrants {
            entrant.group = None;
            entrant.seed = None;
        }
        staged.form_groups()?;

        warn!("Category {}: groups rebuilt, previous results discarded", self.id);
        *self = staged;
        Ok(&self.groups)
    }

    fn check_qualifiers_fit(&self, groups: &[Group]) -> Result<(), ConfigurationError> {
        let qualifiers = self.config.qualifiers_per_group;
        match groups.iter().find(|g| g.size() < usize::from(qualifiers)) {
            Some(group) => Err(ConfigurationError::QualifiersExceedGroupSize {
                qualifiers,
                group: group.id,
                group_size: group.size(),
            }),
            None => Ok(()),
        }
    }

    fn group_match_index(&self, match_id: MatchId) -> Option<usize> {
        self.group_matches.iter().position(|m| m.id == match_id)
    }

    fn bracket_mut(&mut self) -> EngineResult<&mut Bracket> {
        let id = self.id.clone();
        self.bracket
            .as_mut()
            .ok_or(EngineError::Consistency(ConsistencyError::BracketMissing(id)))
    }

    /// Move a pending match to in-progress
    pub fn start_match(&mut self, match_id: MatchId) -> EngineResult<()> {
        match self.group_match_index(match_id) {
            Some(idx) => Ok(self.group_matches[idx].start()?),
            None => match self.bracket.as_mut() {
                Some(bracket) => bracket.start_match(match_id),
                None => Err(EngineError::MatchNotFound(match_id)),
            },
        }
    }

    /// Record a group or knockout result.
    ///
    /// Knockout results return the advancement they caused. Group results
    /// are refused once the bracket exists.
    pub fn record_result(
        &mut self,
        match_id: MatchId,
        outcome: &MatchOutcome,
    ) -> EngineResult<Vec<AdvancementEvent>> {
        let Some(idx) = self.group_match_index(match_id) else {
            return match self.bracket.as_mut() {
                Some(bracket) => bracket.record_result(match_id, outcome),
                None => Err(EngineError::MatchNotFound(match_id)),
            };
        };

        if self.bracket.is_some() {
            return Err(ConsistencyError::BracketExists(self.id.clone()).into());
        }
        let result = validate_outcome(&self.group_matches[idx], outcome)?;
        result.apply_to(&mut self.group_matches[idx]);
        Ok(Vec::new())
    }

    /// Delete a group or knockout result
    pub fn clear_result(&mut self, match_id: MatchId) -> EngineResult<()> {
        let Some(idx) = self.group_match_index(match_id) else {
            return match self.bracket.as_mut() {
                Some(bracket) => bracket.clear_result(match_id),
                None => Err(EngineError::MatchNotFound(match_id)),
            };
        };

        if self.bracket.is_some() {
            return Err(ConsistencyError::BracketExists(self.id.clone()).into());
        }
        let fixture = &mut self.group_matches[idx];
        if !fixture.is_decided() {
            return Err(ConsistencyError::NoResultToClear(match_id).into());
        }
        fixture.clear_result();
        Ok(())
    }

    /// Current table of one group
    pub fn standings(&self, group: GroupId) -> EngineResult<Vec<StandingEntry>> {
        let group = self.group(group).ok_or(EngineError::GroupNotFound(group))?;
        Ok(StandingsCalculator.calculate(group, &self.group_matches, &self.entrants))
    }

    /// Tables of every group, in group order
    pub fn all_standings(&self) -> Vec<(GroupId, Vec<StandingEntry>)> {
        self.groups
            .iter()
            .map(|group| {
                (
                    group.id,
                    StandingsCalculator.calculate(group, &self.group_matches, &self.entrants),
                )
            })
            .collect()
    }

    /// Group matches still without a result
    pub fn pending_group_matches(&self) -> usize {
        self.group_matches.iter().filter(|m| !m.is_decided()).count()
    }

    /// Entrants advancing to the bracket, best first within each position
    pub fn qualifiers(&self) -> EngineResult<Vec<Qualifier>> {
        if self.groups.is_empty() {
            return Err(ConsistencyError::GroupsNotFormed(self.id.clone()).into());
        }
        self.check_qualifiers_fit(&self.groups)?;

        let tables = self.all_standings();
        let mut qualifiers = Vec::new();
        for finish in 1..=u32::from(self.config.qualifiers_per_group) {
            let mut finishers: Vec<&StandingEntry> = tables
                .iter()
                .filter_map(|(_, table)| table.iter().find(|e| e.position == finish))
                .collect();
            finishers.sort_by(|a, b| compare_across_groups(a, b));

            for entry in finishers {
                let entrant = self
                    .entrant(entry.entrant)
                    .ok_or(EngineError::EntrantNotFound(entry.entrant))?;
                qualifiers.push(Qualifier {
                    entrant: entry.entrant,
                    group: entry.group,
                    finish,
                    country: entrant.country.clone(),
                    seed: entrant.seed,
                });
            }
        }

        Ok(qualifiers)
    }

    /// Build the knockout bracket from the final group standings
    pub fn build_bracket(&mut self) -> EngineResult<&Bracket> {
        if self.groups.is_empty() {
            return Err(ConsistencyError::GroupsNotFormed(self.id.clone()).into());
        }
        if self.bracket.is_some() {
            return Err(ConsistencyError::BracketExists(self.id.clone()).into());
        }
        let pending = self.pending_group_matches();
        if pending > 0 {
            return Err(ConsistencyError::GroupStageIncomplete { pending }.into());
        }

        let qualifiers = self.qualifiers()?;
        let bracket = BracketBuilder::new(self.config.random_seed, self.config.knockout_format).build(
            &self.id,
            qualifiers,
            self.groups.len(),
            self.config.qualifiers_per_group,
            self.next_match_id,
        )?;

        self.next_match_id += bracket.matches.len() as MatchId;
        Ok(self.bracket.insert(bracket))
    }

    /// Drop the bracket so group results can change again
    pub fn discard_bracket(&mut self) -> EngineResult<()> {
        let bracket = self
            .bracket
            .as_ref()
            .ok_or_else(|| ConsistencyError::BracketMissing(self.id.clone()))?;
        if let Some(played) = bracket.first_played() {
            return Err(ConsistencyError::BracketInProgress(played.id).into());
        }

        self.bracket = None;
        warn!("Category {}: bracket discarded", self.id);
        Ok(())
    }

    /// Manually set a first-round slot
    pub fn assign_slot(&mut self, slot: usize, occupant: SlotOccupant) -> EngineResult<()> {
        self.bracket_mut()?.assign_slot(slot, occupant)
    }
}

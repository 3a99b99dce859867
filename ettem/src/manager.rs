//! Competition manager: the category registry.
//!
//! Every operation names its category explicitly. Each category sits behind
//! its own mutex, so writers to one category are serialized while different
//! categories proceed independently.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::bracket::{AdvancementEvent, Bracket, Qualifier, SlotOccupant};
use crate::category::Category;
use crate::config::CompetitionConfig;
use crate::entities::{CategoryId, Entrant, EntrantId, Group, GroupId, Match, MatchId, NewEntrant};
use crate::errors::{EngineError, EngineResult};
use crate::results::MatchOutcome;
use crate::standings::StandingEntry;

/// One group with its fixtures and current table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub group: Group,
    pub fixtures: Vec<Match>,
    pub standings: Vec<StandingEntry>,
}

/// Point-in-time export of a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    pub category: CategoryId,
    pub config: CompetitionConfig,
    pub entrants: Vec<Entrant>,
    pub groups: Vec<GroupSnapshot>,
    pub bracket: Option<Bracket>,
    pub champion: Option<EntrantId>,
}

impl CategorySnapshot {
    /// Capture the current state of `category`
    pub fn capture(category: &Category) -> Self {
        let groups = category
            .groups()
            .iter()
            .map(|group| GroupSnapshot {
                group: group.clone(),
                fixtures: category.fixtures(group.id).into_iter().cloned().collect(),
                standings: category.standings(group.id).unwrap_or_default(),
            })
            .collect();

        Self {
            category: category.id().to_string(),
            config: category.config().clone(),
            entrants: category.entrants().to_vec(),
            groups,
            bracket: category.bracket().cloned(),
            champion: category.champion(),
        }
    }
}

/// Registry of independent categories
#[derive(Clone, Default)]
pub struct CompetitionManager {
    categories: Arc<RwLock<HashMap<CategoryId, Arc<Mutex<Category>>>>>,
}

impl CompetitionManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a category
    pub fn create_category(&self, id: &str, config: CompetitionConfig) -> EngineResult<()> {
        let category = Category::new(id, config)?;
        let mut categories = self
            .categories
            .write()
            .map_err(|_| EngineError::LockPoisoned(id.to_string()))?;

        if categories.contains_key(id) {
            return Err(EngineError::CategoryExists(id.to_string()));
        }
        categories.insert(id.to_string(), Arc::new(Mutex::new(category)));

        info!("Created category {}", id);
        Ok(())
    }

    /// Remove a category and all its state
    pub fn remove_category(&self, id: &str) -> EngineResult<()> {
        let mut categories = self
            .categories
            .write()
            .map_err(|_| EngineError::LockPoisoned(id.to_string()))?;
        categories
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::CategoryNotFound(id.to_string()))
    }

    /// Ids of all categories, sorted
    pub fn category_ids(&self) -> Vec<CategoryId> {
        let Ok(categories) = self.categories.read() else {
            return Vec::new();
        };
        let mut ids: Vec<CategoryId> = categories.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn category(&self, id: &str) -> EngineResult<Arc<Mutex<Category>>> {
        let categories = self
            .categories
            .read()
            .map_err(|_| EngineError::LockPoisoned(id.to_string()))?;
        categories
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::CategoryNotFound(id.to_string()))
    }

    /// Run `f` with exclusive access to one category
    pub fn with_category<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Category) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let handle = self.category(id)?;
        let mut category = handle
            .lock()
            .map_err(|_| EngineError::LockPoisoned(id.to_string()))?;
        f(&mut category)
    }

    pub fn register_entrant(&self, category: &str, entrant: NewEntrant) -> EngineResult<EntrantId> {
        self.with_category(category, |c| c.register_entrant(entrant))
    }

    pub fn form_groups(&self, category: &str) -> EngineResult<Vec<Group>> {
        self.with_category(category, |c| c.form_groups().map(<[Group]>::to_vec))
    }

    pub fn rebuild_groups(&self, category: &str) -> EngineResult<Vec<Group>> {
        self.with_category(category, |c| c.rebuild_groups().map(<[Group]>::to_vec))
    }

    pub fn fixtures(&self, category: &str, group: GroupId) -> EngineResult<Vec<Match>> {
        self.with_category(category, |c| {
            c.group(group).ok_or(EngineError::GroupNotFound(group))?;
            Ok(c.fixtures(group).into_iter().cloned().collect())
        })
    }

    pub fn start_match(&self, category: &str, match_id: MatchId) -> EngineResult<()> {
        self.with_category(category, |c| c.start_match(match_id))
    }

    pub fn record_result(
        &self,
        category: &str,
        match_id: MatchId,
        outcome: &MatchOutcome,
    ) -> EngineResult<Vec<AdvancementEvent>> {
        self.with_category(category, |c| c.record_result(match_id, outcome))
    }

    pub fn clear_result(&self, category: &str, match_id: MatchId) -> EngineResult<()> {
        self.with_category(category, |c| c.clear_result(match_id))
    }

    pub fn standings(&self, category: &str, group: GroupId) -> EngineResult<Vec<StandingEntry>> {
        self.with_category(category, |c| c.standings(group))
    }

    pub fn qualifiers(&self, category: &str) -> EngineResult<Vec<Qualifier>> {
        self.with_category(category, |c| c.qualifiers())
    }

    pub fn build_bracket(&self, category: &str) -> EngineResult<Bracket> {
        self.with_category(category, |c| c.build_bracket().cloned())
    }

    pub fn discard_bracket(&self, category: &str) -> EngineResult<()> {
        self.with_category(category, |c| c.discard_bracket())
    }

    pub fn assign_slot(
        &self,
        category: &str,
        slot: usize,
        occupant: SlotOccupant,
    ) -> EngineResult<()> {
        self.with_category(category, |c| c.assign_slot(slot, occupant))
    }

    pub fn bracket(&self, category: &str) -> EngineResult<Option<Bracket>> {
        self.with_category(category, |c| Ok(c.bracket().cloned()))
    }

    pub fn champion(&self, category: &str) -> EngineResult<Option<EntrantId>> {
        self.with_category(category, |c| Ok(c.champion()))
    }

    /// Export the category's groups, standings and bracket
    pub fn snapshot(&self, category: &str) -> EngineResult<CategorySnapshot> {
        self.with_category(category, |c| Ok(CategorySnapshot::capture(c)))
    }
}

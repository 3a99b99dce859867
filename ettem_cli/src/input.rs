//! Tournament file loading.
//!
//! A tournament file lists a category's entrants and the results entered so
//! far, with entrants referred to by name:
//!
//! ```json
//! {
//!   "category": "U13",
//!   "entrants": [{ "name": "Ana", "country": "ESP", "rank_score": 900 }],
//!   "group_results": [{ "a": "Ana", "b": "Bo", "sets": [[11, 7], [11, 8], [11, 9]] }],
//!   "knockout_results": [{ "a": "Ana", "b": "Cy", "walkover": "Ana" }]
//! }
//! ```
//!
//! Set scores are given from the point of view of `a`.

use ettem::{
    AdvancementEvent, CompetitionManager, EngineError, EntrantId, Match, MatchOutcome, NewEntrant,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Errors raised while loading or applying a tournament file
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed tournament file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Entrant name {0:?} appears more than once")]
    DuplicateName(String),

    #[error("Unknown entrant {0:?}")]
    UnknownEntrant(String),

    #[error("No open match between {a:?} and {b:?}")]
    NoSuchMatch { a: String, b: String },

    #[error("Result {a:?} vs {b:?}: {source}")]
    Rejected {
        a: String,
        b: String,
        source: EngineError,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One entrant as listed in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrantRecord {
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub rank_score: f64,
}

/// One entered result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub a: String,
    pub b: String,
    /// Set scores as (a, b) pairs
    #[serde(default)]
    pub sets: Vec<(u16, u16)>,
    /// Name of the walkover winner
    #[serde(default)]
    pub walkover: Option<String>,
}

/// Contents of a tournament file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentFile {
    pub category: String,
    pub entrants: Vec<EntrantRecord>,
    #[serde(default)]
    pub group_results: Vec<ResultRecord>,
    #[serde(default)]
    pub knockout_results: Vec<ResultRecord>,
}

impl TournamentFile {
    /// Read and parse a tournament file
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let raw = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let file: TournamentFile = serde_json::from_str(raw)?;

        let mut seen = HashSet::new();
        for entrant in &file.entrants {
            if !seen.insert(entrant.name.trim()) {
                return Err(InputError::DuplicateName(entrant.name.clone()));
            }
        }
        Ok(file)
    }
}

/// Engine ids of a category's entrants, by name
#[derive(Debug, Clone, Default)]
pub struct Roster {
    ids: HashMap<String, EntrantId>,
    names: HashMap<EntrantId, String>,
}

impl Roster {
    pub fn id(&self, name: &str) -> Result<EntrantId, InputError> {
        self.ids
            .get(name.trim())
            .copied()
            .ok_or_else(|| InputError::UnknownEntrant(name.to_string()))
    }

    /// Display name of an entrant, `#id` when unknown
    pub fn name(&self, id: EntrantId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{id}"))
    }

    fn insert(&mut self, name: &str, id: EntrantId) {
        self.ids.insert(name.trim().to_string(), id);
        self.names.insert(id, name.trim().to_string());
    }
}

/// Register every entrant of `file` into `category`
pub fn register_entrants(
    manager: &CompetitionManager,
    category: &str,
    file: &TournamentFile,
) -> Result<Roster, InputError> {
    let mut roster = Roster::default();
    for record in &file.entrants {
        let id = manager.register_entrant(
            category,
            NewEntrant::new(record.name.as_str(), record.country.as_str(), record.rank_score),
        )?;
        roster.insert(&record.name, id);
    }
    info!("Registered {} entrants in {}", file.entrants.len(), category);
    Ok(roster)
}

/// Engine outcome for `record` on `fixture`, oriented to the fixture's sides
pub fn outcome_for(
    record: &ResultRecord,
    fixture: &Match,
    roster: &Roster,
) -> Result<MatchOutcome, InputError> {
    if let Some(winner) = &record.walkover {
        return Ok(MatchOutcome::walkover(roster.id(winner)?));
    }

    let a = roster.id(&record.a)?;
    let sets = if fixture.entrant_a == Some(a) {
        record.sets.clone()
    } else {
        record.sets.iter().map(|&(x, y)| (y, x)).collect()
    };
    Ok(MatchOutcome::scored(sets))
}

/// Undecided match between the two named entrants among `candidates`
fn find_open<'a>(
    candidates: &'a [Match],
    record: &ResultRecord,
    roster: &Roster,
) -> Result<&'a Match, InputError> {
    let (a, b) = (roster.id(&record.a)?, roster.id(&record.b)?);
    candidates
        .iter()
        .find(|m| m.involves(a) && m.involves(b) && !m.is_decided())
        .ok_or_else(|| InputError::NoSuchMatch {
            a: record.a.clone(),
            b: record.b.clone(),
        })
}

fn apply_one(
    manager: &CompetitionManager,
    category: &str,
    candidates: &[Match],
    record: &ResultRecord,
    roster: &Roster,
) -> Result<Vec<AdvancementEvent>, InputError> {
    let fixture = find_open(candidates, record, roster)?;
    let outcome = outcome_for(record, fixture, roster)?;
    let events = manager
        .record_result(category, fixture.id, &outcome)
        .map_err(|source| InputError::Rejected {
            a: record.a.clone(),
            b: record.b.clone(),
            source,
        })?;
    debug!("Recorded match {}: {} vs {}", fixture.id, record.a, record.b);
    Ok(events)
}

fn group_fixtures(manager: &CompetitionManager, category: &str) -> Result<Vec<Match>, InputError> {
    Ok(manager
        .snapshot(category)?
        .groups
        .into_iter()
        .flat_map(|g| g.fixtures)
        .collect())
}

/// Record every group result of `file`
pub fn apply_group_results(
    manager: &CompetitionManager,
    category: &str,
    file: &TournamentFile,
    roster: &Roster,
) -> Result<usize, InputError> {
    for record in &file.group_results {
        let fixtures = group_fixtures(manager, category)?;
        apply_one(manager, category, &fixtures, record, roster)?;
    }
    Ok(file.group_results.len())
}

/// Record knockout results in file order; returns every advancement caused
pub fn apply_knockout_results(
    manager: &CompetitionManager,
    category: &str,
    file: &TournamentFile,
    roster: &Roster,
) -> Result<Vec<AdvancementEvent>, InputError> {
    let mut events = Vec::new();
    for record in &file.knockout_results {
        // Later rounds only get their entrants once earlier results are in
        let matches = manager
            .bracket(category)?
            .map(|b| b.matches)
            .unwrap_or_default();
        events.extend(apply_one(manager, category, &matches, record, roster)?);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ettem::CompetitionConfig;

    const FILE: &str = r#"{
        "category": "U13",
        "entrants": [
            { "name": "Ana", "country": "ESP", "rank_score": 900 },
            { "name": "Bo", "country": "SWE", "rank_score": 800 },
            { "name": "Cy", "country": "FRA", "rank_score": 700 },
            { "name": "Di", "country": "ESP" }
        ],
        "group_results": [
            { "a": "Di", "b": "Ana", "sets": [[5, 11], [6, 11], [7, 11]] },
            { "a": "Bo", "b": "Cy", "walkover": "Cy" }
        ]
    }"#;

    fn setup() -> (CompetitionManager, TournamentFile, Roster) {
        let file = TournamentFile::parse(FILE).unwrap();
        let manager = CompetitionManager::new();
        manager
            .create_category(&file.category, CompetitionConfig::default())
            .unwrap();
        let roster = register_entrants(&manager, &file.category, &file).unwrap();
        manager.form_groups(&file.category).unwrap();
        (manager, file, roster)
    }

    #[test]
    fn test_parse_defaults() {
        let file = TournamentFile::parse(FILE).unwrap();
        assert_eq!(file.entrants.len(), 4);
        assert_eq!(file.entrants[3].rank_score, 0.0);
        assert!(file.knockout_results.is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let raw = r#"{ "category": "U13", "entrants": [{ "name": "Ana" }, { "name": " Ana " }] }"#;
        assert!(matches!(
            TournamentFile::parse(raw),
            Err(InputError::DuplicateName(name)) if name == " Ana "
        ));
    }

    #[test]
    fn test_scores_oriented_to_fixture_sides() {
        let (manager, file, roster) = setup();
        apply_group_results(&manager, "U13", &file, &roster).unwrap();

        let standings = manager
            .standings("U13", manager.snapshot("U13").unwrap().groups[0].group.id)
            .unwrap();
        let ana = roster.id("Ana").unwrap();
        let entry = standings.iter().find(|e| e.entrant == ana).unwrap();
        assert_eq!((entry.wins, entry.sets_won, entry.sets_lost), (1, 3, 0));

        let cy = roster.id("Cy").unwrap();
        let entry = standings.iter().find(|e| e.entrant == cy).unwrap();
        assert_eq!((entry.wins, entry.sets_won), (1, 0));
    }

    #[test]
    fn test_unknown_entrant_and_missing_match() {
        let (manager, mut file, roster) = setup();
        file.group_results = vec![ResultRecord {
            a: "Ana".to_string(),
            b: "Zed".to_string(),
            sets: vec![(11, 0), (11, 0), (11, 0)],
            walkover: None,
        }];
        assert!(matches!(
            apply_group_results(&manager, "U13", &file, &roster),
            Err(InputError::UnknownEntrant(name)) if name == "Zed"
        ));

        // The same pairing twice: the second finds no open match
        file.group_results = vec![
            ResultRecord {
                a: "Ana".to_string(),
                b: "Bo".to_string(),
                sets: vec![(11, 0), (11, 0), (11, 0)],
                walkover: None,
            };
            2
        ];
        assert!(matches!(
            apply_group_results(&manager, "U13", &file, &roster),
            Err(InputError::NoSuchMatch { .. })
        ));
    }

    #[test]
    fn test_invalid_score_names_the_match() {
        let (manager, mut file, roster) = setup();
        file.group_results = vec![ResultRecord {
            a: "Ana".to_string(),
            b: "Cy".to_string(),
            sets: vec![(11, 10), (11, 0), (11, 0)],
            walkover: None,
        }];
        let err = apply_group_results(&manager, "U13", &file, &roster).unwrap_err();
        assert!(matches!(err, InputError::Rejected { .. }));
        assert!(err.to_string().contains("\"Ana\" vs \"Cy\""));
    }
}

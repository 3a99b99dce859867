//! Core competition entities shared by every engine stage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{ConsistencyError, ValidationError};

/// Category identifier (e.g. "U13", "MS")
pub type CategoryId = String;

/// Entrant ID type
pub type EntrantId = i64;

/// Group ID type
pub type GroupId = i64;

/// Match ID type
pub type MatchId = i64;

/// Registration data for a new entrant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntrant {
    /// Display name
    pub name: String,
    /// ISO country code
    pub country: String,
    /// Ranking score (0 = unranked)
    pub rank_score: f64,
}

impl NewEntrant {
    pub fn new(name: impl Into<String>, country: impl Into<String>, rank_score: f64) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            rank_score,
        }
    }
}

/// A registered competitor (player, pair or team)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    /// Entrant ID
    pub id: EntrantId,
    /// Display name
    pub name: String,
    /// ISO country code
    pub country: String,
    /// Ranking score (0 = unranked, sorted last)
    pub rank_score: f64,
    /// Group the entrant was placed in
    pub group: Option<GroupId>,
    /// Seed number (1 = best), assigned at group formation
    pub seed: Option<u32>,
}

impl Entrant {
    /// Whether the entrant has a ranking score
    pub fn is_ranked(&self) -> bool {
        self.rank_score > 0.0
    }

    /// Seed used for deterministic ordering; unseeded entrants sort last
    pub fn seed_or_last(&self) -> u32 {
        self.seed.unwrap_or(u32::MAX)
    }
}

impl fmt::Display for Entrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seed {
            Some(seed) => write!(f, "S{seed} {} ({})", self.name, self.country),
            None => write!(f, "{} ({})", self.name, self.country),
        }
    }
}

/// A round-robin group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group ID
    pub id: GroupId,
    /// Owning category
    pub category: CategoryId,
    /// Letter name ("A", "B", ...)
    pub name: String,
    /// Members in seeding order
    pub entrants: Vec<EntrantId>,
}

impl Group {
    pub fn size(&self) -> usize {
        self.entrants.len()
    }

    pub fn contains(&self, entrant: EntrantId) -> bool {
        self.entrants.contains(&entrant)
    }
}

/// Group name for a 0-based index: A..Z, then AA, AB, ...
pub fn group_name(index: usize) -> String {
    let mut name = String::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        name.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    name
}

/// Match format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MatchFormat {
    BestOf3,
    #[default]
    BestOf5,
    BestOf7,
}

impl MatchFormat {
    /// Maximum number of sets
    pub fn best_of(self) -> u8 {
        match self {
            MatchFormat::BestOf3 => 3,
            MatchFormat::BestOf5 => 5,
            MatchFormat::BestOf7 => 7,
        }
    }

    /// Sets needed to win the match
    pub fn sets_to_win(self) -> usize {
        usize::from(self.best_of() / 2 + 1)
    }
}

impl TryFrom<u8> for MatchFormat {
    type Error = ValidationError;

    fn try_from(best_of: u8) -> Result<Self, Self::Error> {
        match best_of {
            3 => Ok(MatchFormat::BestOf3),
            5 => Ok(MatchFormat::BestOf5),
            7 => Ok(MatchFormat::BestOf7),
            other => Err(ValidationError::InvalidFormat(other)),
        }
    }
}

impl From<MatchFormat> for u8 {
    fn from(format: MatchFormat) -> Self {
        format.best_of()
    }
}

impl fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "best of {}", self.best_of())
    }
}

/// One side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Score of a single set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetResult {
    /// 1-based set number
    pub ordinal: u8,
    pub points_a: u16,
    pub points_b: u16,
}

impl SetResult {
    pub fn winner(&self) -> Option<Side> {
        match self.points_a.cmp(&self.points_b) {
            std::cmp::Ordering::Greater => Some(Side::A),
            std::cmp::Ordering::Less => Some(Side::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn points(&self, side: Side) -> u16 {
        match side {
            Side::A => self.points_a,
            Side::B => self.points_b,
        }
    }
}

impl fmt::Display for SetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.points_a, self.points_b)
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Not yet played
    Pending,
    /// Currently being played
    InProgress,
    /// Finished normally
    Completed,
    /// One entrant did not appear
    Walkover,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Walkover)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::InProgress => write!(f, "in_progress"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Walkover => write!(f, "walkover"),
        }
    }
}

/// Round labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundType {
    /// Group stage
    RoundRobin,
    /// Early knockout round with the given number of slots
    RoundOf(usize),
    QuarterFinal,
    SemiFinal,
    Final,
}

impl RoundType {
    /// Label for a knockout round holding `slots` entrants
    pub fn for_slots(slots: usize) -> Self {
        match slots {
            0..=2 => RoundType::Final,
            3..=4 => RoundType::SemiFinal,
            5..=8 => RoundType::QuarterFinal,
            n => RoundType::RoundOf(n),
        }
    }
}

impl fmt::Display for RoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundType::RoundRobin => write!(f, "RR"),
            RoundType::RoundOf(n) => write!(f, "R{n}"),
            RoundType::QuarterFinal => write!(f, "QF"),
            RoundType::SemiFinal => write!(f, "SF"),
            RoundType::Final => write!(f, "F"),
        }
    }
}

/// Where a match belongs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchContext {
    /// Round-robin match of a group, `round` is the fixture round (1-based)
    Group { group: GroupId, round: u8 },
    /// Knockout match `number` (1-based, top to bottom) of `round` (1 = first round)
    Knockout { round: u8, number: usize },
}

/// The next-round slot a knockout match feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextSlot {
    pub match_id: MatchId,
    pub round: u8,
    pub slot: usize,
    pub side: Side,
}

/// A match record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub context: MatchContext,
    /// `None` = to be determined
    pub entrant_a: Option<EntrantId>,
    pub entrant_b: Option<EntrantId>,
    pub format: MatchFormat,
    pub sets: Vec<SetResult>,
    pub status: MatchStatus,
    pub winner: Option<EntrantId>,
    /// Winner advanced because the opponent slot was a BYE
    pub decided_by_bye: bool,
    /// `None` only for group matches and the final
    pub next: Option<NextSlot>,
}

impl Match {
    /// New pending match
    pub fn new(id: MatchId, context: MatchContext, format: MatchFormat) -> Self {
        Self {
            id,
            context,
            entrant_a: None,
            entrant_b: None,
            format,
            sets: Vec::new(),
            status: MatchStatus::Pending,
            winner: None,
            decided_by_bye: false,
            next: None,
        }
    }

    pub fn entrant(&self, side: Side) -> Option<EntrantId> {
        match side {
            Side::A => self.entrant_a,
            Side::B => self.entrant_b,
        }
    }

    pub fn set_entrant(&mut self, side: Side, entrant: Option<EntrantId>) {
        match side {
            Side::A => self.entrant_a = entrant,
            Side::B => self.entrant_b = entrant,
        }
    }

    /// Side the entrant plays on, if any
    pub fn side_of(&self, entrant: EntrantId) -> Option<Side> {
        if self.entrant_a == Some(entrant) {
            Some(Side::A)
        } else if self.entrant_b == Some(entrant) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn involves(&self, entrant: EntrantId) -> bool {
        self.side_of(entrant).is_some()
    }

    /// Opponent of `entrant` in this match
    pub fn opponent_of(&self, entrant: EntrantId) -> Option<EntrantId> {
        self.side_of(entrant)
            .and_then(|side| self.entrant(side.opponent()))
    }

    pub fn sets_won(&self, side: Side) -> u32 {
        self.sets.iter().filter(|s| s.winner() == Some(side)).count() as u32
    }

    pub fn points_won(&self, side: Side) -> u32 {
        self.sets.iter().map(|s| u32::from(s.points(side))).sum()
    }

    /// Completed or walkover with a winner
    pub fn is_decided(&self) -> bool {
        self.status.is_terminal() && self.winner.is_some()
    }

    /// Decided by an actual result rather than a BYE
    pub fn has_played_result(&self) -> bool {
        self.is_decided() && !self.decided_by_bye
    }

    pub fn is_walkover(&self) -> bool {
        self.status == MatchStatus::Walkover
    }

    /// Both entrants are known
    pub fn is_ready(&self) -> bool {
        self.entrant_a.is_some() && self.entrant_b.is_some()
    }

    /// Move a pending match with both entrants known to in-progress
    pub fn start(&mut self) -> Result<(), ConsistencyError> {
        if self.status != MatchStatus::Pending {
            return Err(ConsistencyError::InvalidTransition {
                match_id: self.id,
                from: self.status,
                to: MatchStatus::InProgress,
            });
        }
        if !self.is_ready() {
            return Err(ConsistencyError::EntrantsUndetermined(self.id));
        }
        self.status = MatchStatus::InProgress;
        Ok(())
    }

    /// Reset to pending, dropping the result
    pub fn clear_result(&mut self) {
        self.sets.clear();
        self.status = MatchStatus::Pending;
        self.winner = None;
        self.decided_by_bye = false;
    }

    /// Score line like "3-1 (11-9, 8-11, 11-5, 11-7)"
    pub fn score_line(&self) -> String {
        if self.is_walkover() {
            return "w/o".to_string();
        }
        if self.sets.is_empty() {
            return "vs".to_string();
        }
        let sets: Vec<String> = self.sets.iter().map(ToString::to_string).collect();
        format!(
            "{}-{} ({})",
            self.sets_won(Side::A),
            self.sets_won(Side::B),
            sets.join(", ")
        )
    }
}

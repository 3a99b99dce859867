//! Tie-scoped resolution of equal-points clusters.
//!
//! A cluster of entrants level on tournament points is ordered by a list of
//! criteria. Each criterion is evaluated over the matches played among the
//! current cluster only; members still level afterwards form a smaller
//! cluster that is resolved again with the remaining criteria, re-scoped to
//! its own members. Seed order is the last criterion and always decides.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::entities::{EntrantId, Match, Side};

/// Criteria applied after tournament points, in order
pub const DEFAULT_CRITERIA: [TiebreakCriterion; 3] = [
    TiebreakCriterion::SetsRatio,
    TiebreakCriterion::PointsRatio,
    TiebreakCriterion::Seed,
];

/// Exact won/lost ratio.
///
/// Compared by cross multiplication. Nothing lost with something won is an
/// infinite ratio that beats every finite one; nothing won is zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Ratio {
    pub won: u32,
    pub lost: u32,
}

impl Ratio {
    pub fn new(won: u32, lost: u32) -> Self {
        Self { won, lost }
    }

    pub fn is_infinite(&self) -> bool {
        self.lost == 0 && self.won > 0
    }

    /// Approximate value for display
    pub fn value(&self) -> f64 {
        if self.is_infinite() {
            f64::INFINITY
        } else if self.won == 0 {
            0.0
        } else {
            f64::from(self.won) / f64::from(self.lost)
        }
    }

    /// (numerator, denominator) with zero normalized to 0/1
    fn terms(&self) -> (u64, u64) {
        if self.won == 0 {
            (0, 1)
        } else {
            (u64::from(self.won), u64::from(self.lost))
        }
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_infinite(), other.is_infinite()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let (a_num, a_den) = self.terms();
                let (b_num, b_den) = other.terms();
                (a_num * b_den).cmp(&(b_num * a_den))
            }
        }
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ratio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ratio {}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{:.3}", self.value())
        }
    }
}

/// Running totals for one entrant over a set of matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub points_won: u32,
    pub points_lost: u32,
    pub tournament_points: u32,
}

impl Tally {
    /// Add a decided match played on `side`.
    ///
    /// Win = 2 points, played loss = 1, walkover loss = 0.
    pub fn record(&mut self, fixture: &Match, side: Side) {
        if fixture.winner.is_some() && fixture.winner == fixture.entrant(side) {
            self.wins += 1;
            self.tournament_points += 2;
        } else {
            self.losses += 1;
            if !fixture.is_walkover() {
                self.tournament_points += 1;
            }
        }

        let opponent = side.opponent();
        self.sets_won += fixture.sets_won(side);
        self.sets_lost += fixture.sets_won(opponent);
        self.points_won += fixture.points_won(side);
        self.points_lost += fixture.points_won(opponent);
    }

    pub fn sets_ratio(&self) -> Ratio {
        Ratio::new(self.sets_won, self.sets_lost)
    }

    pub fn points_ratio(&self) -> Ratio {
        Ratio::new(self.points_won, self.points_lost)
    }
}

/// Tie-break criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakCriterion {
    /// Sets won / sets lost among the tied entrants
    SetsRatio,
    /// Points won / points lost among the tied entrants
    PointsRatio,
    /// Lower seed number first
    Seed,
}

impl fmt::Display for TiebreakCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiebreakCriterion::SetsRatio => write!(f, "sets ratio"),
            TiebreakCriterion::PointsRatio => write!(f, "points ratio"),
            TiebreakCriterion::Seed => write!(f, "seed"),
        }
    }
}

/// Audit record of how an entrant's tie was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakDetail {
    /// Other entrants level on tournament points
    pub tied_with: Vec<EntrantId>,
    /// Totals over the matches among the whole points-level cluster
    pub head_to_head: Tally,
    /// Criterion that finally separated this entrant
    pub decided_by: TiebreakCriterion,
}

/// Totals per member over the decided matches played inside `cluster`
pub fn head_to_head(cluster: &[EntrantId], matches: &[&Match]) -> HashMap<EntrantId, Tally> {
    let mut tallies: HashMap<EntrantId, Tally> =
        cluster.iter().map(|&id| (id, Tally::default())).collect();

    for fixture in matches.iter().filter(|m| m.is_decided()) {
        let (Some(a), Some(b)) = (fixture.entrant_a, fixture.entrant_b) else {
            continue;
        };
        if !cluster.contains(&a) || !cluster.contains(&b) {
            continue;
        }
        if let Some(tally) = tallies.get_mut(&a) {
            tally.record(fixture, Side::A);
        }
        if let Some(tally) = tallies.get_mut(&b) {
            tally.record(fixture, Side::B);
        }
    }

    tallies
}

/// Recursive resolver over a group's matches
pub struct TieResolver<'a> {
    matches: &'a [&'a Match],
    seeds: &'a HashMap<EntrantId, u32>,
}

impl<'a> TieResolver<'a> {
    pub fn new(matches: &'a [&'a Match], seeds: &'a HashMap<EntrantId, u32>) -> Self {
        Self { matches, seeds }
    }

    /// Order `cluster` by `criteria`.
    ///
    /// `decided` receives, for each member, the criterion that left it alone
    /// in its sub-cluster.
    pub fn resolve(
        &self,
        cluster: &[EntrantId],
        criteria: &[TiebreakCriterion],
        decided: &mut HashMap<EntrantId, TiebreakCriterion>,
    ) -> Vec<EntrantId> {
        if cluster.len() < 2 {
            return cluster.to_vec();
        }
        let Some((&criterion, rest)) = criteria.split_first() else {
            return cluster.to_vec();
        };

        let tallies = head_to_head(cluster, self.matches);
        let compare = |a: EntrantId, b: EntrantId| self.compare(criterion, a, b, &tallies);

        let mut ordered = cluster.to_vec();
        ordered.sort_by(|&a, &b| compare(a, b));

        let mut resolved = Vec::with_capacity(cluster.len());
        let mut start = 0;
        while start < ordered.len() {
            let mut end = start + 1;
            while end < ordered.len() && compare(ordered[start], ordered[end]) == Ordering::Equal {
                end += 1;
            }

            let run = &ordered[start..end];
            if let [single] = run {
                decided.insert(*single, criterion);
                resolved.push(*single);
            } else {
                resolved.extend(self.resolve(run, rest, decided));
            }
            start = end;
        }

        resolved
    }

    fn compare(
        &self,
        criterion: TiebreakCriterion,
        a: EntrantId,
        b: EntrantId,
        tallies: &HashMap<EntrantId, Tally>,
    ) -> Ordering {
        let tally = |id: EntrantId| tallies.get(&id).copied().unwrap_or_default();
        let seed = |id: EntrantId| self.seeds.get(&id).copied().unwrap_or(u32::MAX);

        match criterion {
            TiebreakCriterion::SetsRatio => tally(b).sets_ratio().cmp(&tally(a).sets_ratio()),
            TiebreakCriterion::PointsRatio => tally(b).points_ratio().cmp(&tally(a).points_ratio()),
            TiebreakCriterion::Seed => seed(a).cmp(&seed(b)),
        }
    }
}

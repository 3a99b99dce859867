//! Group standings aggregation and ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::tiebreak::{DEFAULT_CRITERIA, Ratio, Tally, TieResolver, TiebreakDetail, head_to_head};
use crate::entities::{Entrant, EntrantId, Group, GroupId, Match, MatchContext, Side};

/// One entrant's line in a group table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub entrant: EntrantId,
    pub group: GroupId,
    pub seed: Option<u32>,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub points_won: u32,
    pub points_lost: u32,
    pub tournament_points: u32,
    /// Final position in the group (1 = winner)
    pub position: u32,
    /// Present when the entrant was level on tournament points with others
    pub tiebreak: Option<TiebreakDetail>,
}

impl StandingEntry {
    fn new(entrant: EntrantId, group: GroupId, seed: Option<u32>, tally: Tally) -> Self {
        Self {
            entrant,
            group,
            seed,
            played: tally.wins + tally.losses,
            wins: tally.wins,
            losses: tally.losses,
            sets_won: tally.sets_won,
            sets_lost: tally.sets_lost,
            points_won: tally.points_won,
            points_lost: tally.points_lost,
            tournament_points: tally.tournament_points,
            position: 0,
            tiebreak: None,
        }
    }

    /// Whole-group sets ratio
    pub fn sets_ratio(&self) -> Ratio {
        Ratio::new(self.sets_won, self.sets_lost)
    }

    /// Whole-group points ratio
    pub fn points_ratio(&self) -> Ratio {
        Ratio::new(self.points_won, self.points_lost)
    }
}

/// Order entrants holding the same position in different groups.
///
/// Tournament points, then whole-group sets ratio, then points ratio (all
/// descending), then seed ascending.
pub fn compare_across_groups(a: &StandingEntry, b: &StandingEntry) -> Ordering {
    b.tournament_points
        .cmp(&a.tournament_points)
        .then_with(|| b.sets_ratio().cmp(&a.sets_ratio()))
        .then_with(|| b.points_ratio().cmp(&a.points_ratio()))
        .then_with(|| {
            a.seed
                .unwrap_or(u32::MAX)
                .cmp(&b.seed.unwrap_or(u32::MAX))
        })
}

/// Computes group tables from decided matches
#[derive(Debug, Clone, Copy, Default)]
pub struct StandingsCalculator;

impl StandingsCalculator {
    /// Full table for `group`, ordered by position.
    ///
    /// Only decided matches of this group count. The table is rebuilt from
    /// scratch on every call.
    pub fn calculate(&self, group: &Group, matches: &[Match], entrants: &[Entrant]) -> Vec<StandingEntry> {
        let group_matches: Vec<&Match> = matches
            .iter()
            .filter(|m| matches!(m.context, MatchContext::Group { group: id, .. } if id == group.id))
            .filter(|m| m.is_decided())
            .collect();

        let seeds: HashMap<EntrantId, u32> = entrants
            .iter()
            .filter(|e| group.contains(e.id))
            .filter_map(|e| e.seed.map(|seed| (e.id, seed)))
            .collect();

        let mut tallies: HashMap<EntrantId, Tally> = group
            .entrants
            .iter()
            .map(|&id| (id, Tally::default()))
            .collect();
        for fixture in &group_matches {
            for side in [Side::A, Side::B] {
                if let Some(tally) = fixture.entrant(side).and_then(|id| tallies.get_mut(&id)) {
                    tally.record(fixture, side);
                }
            }
        }

        let mut by_points: Vec<EntrantId> = group.entrants.clone();
        let points = |id: &EntrantId| tallies.get(id).map_or(0, |t| t.tournament_points);
        by_points.sort_by_key(|id| std::cmp::Reverse(points(id)));

        let resolver = TieResolver::new(&group_matches, &seeds);
        let mut ordered = Vec::with_capacity(by_points.len());
        let mut details: HashMap<EntrantId, TiebreakDetail> = HashMap::new();

        for cluster in by_points.chunk_by(|a, b| points(a) == points(b)) {
            if cluster.len() == 1 {
                ordered.extend_from_slice(cluster);
                continue;
            }

            let mut decided = HashMap::new();
            ordered.extend(resolver.resolve(cluster, &DEFAULT_CRITERIA, &mut decided));

            let h2h = head_to_head(cluster, &group_matches);
            for &id in cluster {
                if let Some(&decided_by) = decided.get(&id) {
                    details.insert(
                        id,
                        TiebreakDetail {
                            tied_with: cluster.iter().copied().filter(|&other| other != id).collect(),
                            head_to_head: h2h.get(&id).copied().unwrap_or_default(),
                            decided_by,
                        },
                    );
                }
            }
        }

        ordered
            .into_iter()
            .enumerate()
            .map(|(idx, id)| {
                let tally = tallies.get(&id).copied().unwrap_or_default();
                let mut entry = StandingEntry::new(id, group.id, seeds.get(&id).copied(), tally);
                entry.position = idx as u32 + 1;
                entry.tiebreak = details.remove(&id);
                entry
            })
            .collect()
    }
}

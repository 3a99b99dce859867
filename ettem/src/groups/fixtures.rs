//! Round-robin fixtures (circle method).

use crate::entities::{Group, Match, MatchContext, MatchFormat, MatchId};

/// Pairings per round for `n` participants, as 0-based position pairs.
///
/// Position 0 stays fixed while the others rotate one step per round. An odd
/// count gets a synthetic bye that rotates like a participant; its pairings
/// are dropped. Every unordered pair meets exactly once.
pub fn circle_rounds(n: usize) -> Vec<Vec<(usize, usize)>> {
    if n < 2 {
        return Vec::new();
    }

    let mut ring: Vec<Option<usize>> = (0..n).map(Some).collect();
    if n % 2 == 1 {
        ring.push(None);
    }
    let len = ring.len();

    let mut rounds = Vec::with_capacity(len - 1);
    for _ in 0..len - 1 {
        let pairs = (0..len / 2)
            .filter_map(|i| match (ring[i], ring[len - 1 - i]) {
                (Some(a), Some(b)) => Some((a.min(b), a.max(b))),
                _ => None,
            })
            .collect();
        rounds.push(pairs);

        if let Some(last) = ring.pop() {
            ring.insert(1, last);
        }
    }

    rounds
}

/// Produces the match list of a group
#[derive(Debug, Clone)]
pub struct FixtureGenerator {
    format: MatchFormat,
}

impl FixtureGenerator {
    pub fn new(format: MatchFormat) -> Self {
        Self { format }
    }

    /// Matches for `group`, numbered from `next_id` (advanced past the last id used)
    pub fn generate(&self, group: &Group, next_id: &mut MatchId) -> Vec<Match> {
        let mut matches = Vec::new();

        for (round_idx, pairs) in circle_rounds(group.size()).into_iter().enumerate() {
            for (a, b) in pairs {
                let context = MatchContext::Group {
                    group: group.id,
                    round: round_idx as u8 + 1,
                };
                let mut fixture = Match::new(*next_id, context, self.format);
                fixture.entrant_a = Some(group.entrants[a]);
                fixture.entrant_b = Some(group.entrants[b]);
                matches.push(fixture);
                *next_id += 1;
            }
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_four_players_three_rounds() {
        let rounds = circle_rounds(4);
        assert_eq!(
            rounds,
            vec![
                vec![(0, 3), (1, 2)],
                vec![(0, 2), (1, 3)],
                vec![(0, 1), (2, 3)],
            ]
        );
    }

    #[test]
    fn test_odd_count_rotates_bye() {
        let rounds = circle_rounds(3);
        assert_eq!(rounds.len(), 3);
        assert!(rounds.iter().all(|r| r.len() == 1));

        let pairs: HashSet<(usize, usize)> = rounds.into_iter().flatten().collect();
        assert_eq!(pairs, HashSet::from([(0, 1), (0, 2), (1, 2)]));
    }

    #[test]
    fn test_nobody_plays_twice_in_a_round() {
        for n in 3..=9 {
            for round in circle_rounds(n) {
                let mut seen = HashSet::new();
                for (a, b) in round {
                    assert!(seen.insert(a));
                    assert!(seen.insert(b));
                }
            }
        }
    }

    #[test]
    fn test_generate_group_matches() {
        let group = Group {
            id: 7,
            category: "U15".to_string(),
            name: "A".to_string(),
            entrants: vec![11, 12, 13, 14],
        };
        let mut next_id = 100;
        let matches = FixtureGenerator::new(MatchFormat::BestOf5).generate(&group, &mut next_id);

        assert_eq!(matches.len(), 6);
        assert_eq!(next_id, 106);
        assert_eq!(matches[0].id, 100);
        assert_eq!(matches[0].entrant_a, Some(11));
        assert_eq!(matches[0].entrant_b, Some(14));
        assert!(matches.iter().all(|m| m.next.is_none()));
        assert!(
            matches
                .iter()
                .all(|m| matches!(m.context, MatchContext::Group { group: 7, .. }))
        );
    }
}

//! Group formation: ranking order, size distribution and snake seeding.

use log::info;
use std::cmp::Ordering;

use crate::entities::{CategoryId, Entrant, Group, GroupId, group_name};
use crate::errors::ConfigurationError;

/// Smallest entrant count that can form a group
pub const MIN_GROUP_SIZE: usize = 3;

/// Largest group size
pub const MAX_GROUP_SIZE: usize = 4;

/// Indices of `entrants` in seeding order.
///
/// Ranked entrants come first by rank score descending; equal scores keep
/// input order. Unranked entrants (score 0) follow in input order.
pub fn ranking_order(entrants: &[Entrant]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entrants.len()).collect();
    order.sort_by(|&a, &b| {
        let (ea, eb) = (&entrants[a], &entrants[b]);
        eb.is_ranked()
            .cmp(&ea.is_ranked())
            .then_with(|| {
                if ea.is_ranked() && eb.is_ranked() {
                    eb.rank_score.total_cmp(&ea.rank_score)
                } else {
                    Ordering::Equal
                }
            })
    });
    order
}

/// Group sizes for `entrants` with the given preference, largest first.
///
/// Preference 4 maximizes groups of four and keeps groups of three to the
/// unavoidable remainder. Preference 3 does the opposite.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidGroupSize`] for a preference other
/// than 3 or 4 and [`ConfigurationError::InfeasibleGroups`] when `entrants`
/// cannot be written as a sum of 3s and 4s (1, 2 and 5).
pub fn group_sizes(entrants: usize, preference: u8) -> Result<Vec<usize>, ConfigurationError> {
    let infeasible = ConfigurationError::InfeasibleGroups {
        entrants,
        preference,
    };

    let (fours, threes) = match preference {
        4 => {
            let threes = (MAX_GROUP_SIZE - entrants % MAX_GROUP_SIZE) % MAX_GROUP_SIZE;
            if entrants < MIN_GROUP_SIZE || threes * MIN_GROUP_SIZE > entrants {
                return Err(infeasible);
            }
            ((entrants - threes * MIN_GROUP_SIZE) / MAX_GROUP_SIZE, threes)
        }
        3 => {
            let fours = entrants % MIN_GROUP_SIZE;
            if entrants < MIN_GROUP_SIZE || fours * MAX_GROUP_SIZE > entrants {
                return Err(infeasible);
            }
            (fours, (entrants - fours * MAX_GROUP_SIZE) / MIN_GROUP_SIZE)
        }
        other => return Err(ConfigurationError::InvalidGroupSize(other)),
    };

    let mut sizes = vec![MAX_GROUP_SIZE; fours];
    sizes.extend(std::iter::repeat_n(MIN_GROUP_SIZE, threes));
    Ok(sizes)
}

/// Group index (0-based) for each position of a ranked list.
///
/// Seeds are dealt in blocks of `groups`: odd blocks run left to right,
/// even blocks right to left.
pub fn snake_assignment(count: usize, groups: usize) -> Vec<usize> {
    if groups == 0 {
        return Vec::new();
    }

    (0..count)
        .map(|position| {
            let block = position / groups;
            let column = position % groups;
            if block % 2 == 0 {
                column
            } else {
                groups - 1 - column
            }
        })
        .collect()
}

/// Partitions a category's entrants into seeded groups
#[derive(Debug, Clone)]
pub struct GroupFormer {
    preference: u8,
}

impl GroupFormer {
    pub fn new(preference: u8) -> Self {
        Self { preference }
    }

    /// Form groups for `entrants`.
    ///
    /// Assigns seed numbers (1 = best) and group ids to the entrants and
    /// returns the groups with members in seeding order. Group ids start at
    /// `first_group_id`. Nothing is modified when an error is returned.
    pub fn form(
        &self,
        category: &str,
        entrants: &mut [Entrant],
        first_group_id: GroupId,
    ) -> Result<Vec<Group>, ConfigurationError> {
        let sizes = group_sizes(entrants.len(), self.preference)?;
        let group_count = sizes.len();

        let order = ranking_order(entrants);
        let assignment = snake_assignment(order.len(), group_count);

        let mut groups: Vec<Group> = (0..group_count)
            .map(|idx| Group {
                id: first_group_id + idx as GroupId,
                category: CategoryId::from(category),
                name: group_name(idx),
                entrants: Vec::with_capacity(MAX_GROUP_SIZE),
            })
            .collect();

        for (position, (&entrant_idx, &group_idx)) in order.iter().zip(&assignment).enumerate() {
            let entrant = &mut entrants[entrant_idx];
            let group = &mut groups[group_idx];
            entrant.seed = Some(position as u32 + 1);
            entrant.group = Some(group.id);
            group.entrants.push(entrant.id);
        }

        info!(
            "Formed {} group(s) for category {} from {} entrants (sizes {:?})",
            group_count,
            category,
            entrants.len(),
            groups.iter().map(Group::size).collect::<Vec<_>>()
        );

        Ok(groups)
    }
}

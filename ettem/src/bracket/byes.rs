//! Seed positions and BYE distribution.
//!
//! Seed positions follow the classical single-elimination layout: seeds 1
//! and 2 at the ends, seeds 3-4 around the centre, and each further tier at
//! the boundaries of ever smaller sections. BYEs are handed out in seed
//! order: the first-round opponent slot of each of the best positions stays
//! empty.

/// BYE slots for `2 * groups` qualifiers, keyed by group count
pub const BYE_TABLE: [(usize, &[usize]); 18] = [
    (3, &[2, 7]),
    (4, &[]),
    (5, &[2, 6, 7, 10, 11, 15]),
    (6, &[2, 7, 10, 15]),
    (7, &[2, 15]),
    (8, &[]),
    (9, &[2, 6, 7, 10, 11, 14, 15, 18, 19, 22, 23, 26, 27, 31]),
    (10, &[2, 7, 10, 11, 14, 15, 18, 19, 22, 23, 26, 31]),
    (11, &[2, 7, 10, 14, 15, 18, 19, 23, 26, 31]),
    (12, &[2, 7, 10, 15, 18, 23, 26, 31]),
    (13, &[2, 10, 15, 18, 23, 31]),
    (14, &[2, 15, 18, 31]),
    (15, &[2, 31]),
    (16, &[]),
    (
        17,
        &[
            2, 6, 7, 10, 11, 14, 15, 18, 19, 22, 23, 26, 27, 30, 31, 34, 35, 38, 39, 42, 43, 46, 47,
            50, 51, 54, 55, 58, 59, 63,
        ],
    ),
    (
        18,
        &[
            2, 7, 10, 11, 14, 15, 18, 19, 22, 23, 26, 27, 30, 31, 34, 35, 38, 39, 42, 43, 46, 47, 50,
            51, 54, 55, 58, 63,
        ],
    ),
    (
        19,
        &[
            2, 7, 10, 14, 15, 18, 19, 22, 23, 26, 27, 30, 31, 34, 35, 38, 39, 42, 43, 46, 47, 50, 51,
            55, 58, 63,
        ],
    ),
    (
        20,
        &[
            2, 7, 10, 15, 18, 19, 22, 23, 26, 27, 30, 31, 34, 35, 38, 39, 42, 43, 46, 47, 50, 55, 58,
            63,
        ],
    ),
];

/// Smallest power of two holding `qualifiers`
pub fn bracket_size(qualifiers: usize) -> usize {
    qualifiers.max(1).next_power_of_two()
}

/// First-round slots (1-based) in seed order for a bracket of `size`.
///
/// `size` must be a power of two.
pub fn seeding_order(size: usize) -> Vec<usize> {
    if size <= 2 {
        return (1..=size).collect();
    }

    let mut order = vec![1, size];
    let mut used = vec![false; size + 1];
    used[1] = true;
    used[size] = true;

    let mut section = size / 2;
    while section >= 2 && order.len() < size {
        // Section boundaries in the top half not yet taken, innermost first
        let mut tier: Vec<usize> = (0..size / section)
            .flat_map(|j| [j * section + 1, (j + 1) * section])
            .filter(|&pos| pos <= size / 2 && !used[pos])
            .collect();
        tier.sort_unstable_by(|a, b| b.cmp(a));

        for pos in tier {
            let mirror = size + 1 - pos;
            used[pos] = true;
            used[mirror] = true;
            order.push(pos);
            order.push(mirror);
        }
        section /= 2;
    }

    order
}

/// The other slot of a first-round match
pub fn partner_slot(slot: usize) -> usize {
    if slot % 2 == 1 { slot + 1 } else { slot - 1 }
}

/// BYE slots for `qualifiers` entrants in a bracket of `size`, derived from
/// the seeding order
pub fn derived_bye_slots(qualifiers: usize, size: usize) -> Vec<usize> {
    let byes = size.saturating_sub(qualifiers);
    let mut slots: Vec<usize> = seeding_order(size)
        .into_iter()
        .take(byes)
        .map(partner_slot)
        .collect();
    slots.sort_unstable();
    slots
}

/// Table entry for `groups` groups, if listed
pub fn table_bye_slots(groups: usize) -> Option<&'static [usize]> {
    BYE_TABLE
        .iter()
        .find(|(count, _)| *count == groups)
        .map(|(_, slots)| *slots)
}

/// BYE slots for a bracket.
///
/// Two qualifiers from each of 3 to 20 groups use [`BYE_TABLE`]; any other
/// shape is derived with the same rule.
pub fn bye_slots(qualifiers: usize, groups: usize, qualifiers_per_group: u8) -> Vec<usize> {
    if qualifiers_per_group == 2 && qualifiers == 2 * groups {
        if let Some(slots) = table_bye_slots(groups) {
            return slots.to_vec();
        }
    }
    derived_bye_slots(qualifiers, bracket_size(qualifiers))
}

/// Property-based tests for the competition engine using proptest
///
/// These tests check group sizing, round-robin coverage, BYE layout, set
/// validation and bracket placement across a wide range of generated inputs.
use ettem::bracket::{BracketBuilder, Qualifier, bracket_size, bye_slots, half_of, seeding_order};
use ettem::entities::{EntrantId, GroupId, MatchFormat, Side};
use ettem::groups::{circle_rounds, group_sizes, snake_assignment};
use ettem::results::{validate_match_sets, validate_set};
use ettem::standings::Ratio;
use proptest::prelude::*;
use std::collections::HashSet;

// Entrant counts that can be split into groups of 3 and 4
fn feasible_count() -> impl Strategy<Value = usize> {
    (3usize..=200).prop_filter("1, 2 and 5 cannot be grouped", |&n| n != 5)
}

// Two qualifiers from each of `groups` groups, winners first
fn qualifiers(groups: usize) -> Vec<Qualifier> {
    (1..=2u32)
        .flat_map(|finish| {
            (1..=groups).map(move |g| Qualifier {
                entrant: (finish as usize * 1000 + g) as EntrantId,
                group: g as GroupId,
                finish,
                country: format!("C{}", g % 3),
                seed: Some(g as u32),
            })
        })
        .collect()
}

proptest! {
    #[test]
    fn test_group_sizes_partition_entrants(n in feasible_count(), preference in 3u8..=4) {
        let sizes = group_sizes(n, preference).unwrap();

        prop_assert_eq!(sizes.iter().sum::<usize>(), n);
        prop_assert!(sizes.iter().all(|s| (3..=4).contains(s)));
        prop_assert!(sizes.windows(2).all(|w| w[0] >= w[1]), "largest first");
    }

    #[test]
    fn test_preference_minimizes_other_size(n in feasible_count()) {
        let fours = |sizes: &[usize]| sizes.iter().filter(|&&s| s == 4).count();
        let prefer_four = group_sizes(n, 4).unwrap();
        let prefer_three = group_sizes(n, 3).unwrap();

        prop_assert!(fours(&prefer_four) >= fours(&prefer_three));
        prop_assert!(prefer_four.len() - fours(&prefer_four) <= 3);
        prop_assert!(fours(&prefer_three) <= 2);
    }

    #[test]
    fn test_snake_balances_groups(n in feasible_count()) {
        let groups = group_sizes(n, 4).unwrap();
        let assignment = snake_assignment(n, groups.len());

        let mut counts = vec![0usize; groups.len()];
        for g in assignment {
            counts[g] += 1;
        }
        let mut counted = counts.clone();
        counted.sort_unstable_by(|a, b| b.cmp(a));
        prop_assert_eq!(counted, groups);
    }

    #[test]
    fn test_round_robin_meets_every_pair_once(n in 2usize..=16) {
        let rounds = circle_rounds(n);
        let mut seen = HashSet::new();

        for round in &rounds {
            let mut busy = HashSet::new();
            for &(a, b) in round {
                prop_assert!(a < b && b < n);
                prop_assert!(busy.insert(a) && busy.insert(b), "double booked in a round");
                prop_assert!(seen.insert((a, b)), "pair repeated");
            }
        }
        prop_assert_eq!(seen.len(), n * (n - 1) / 2);
    }

    #[test]
    fn test_byes_face_entrants(qualifiers in 2usize..=128) {
        let size = bracket_size(qualifiers);
        let byes = bye_slots(qualifiers, 0, 1);

        prop_assert_eq!(byes.len(), size - qualifiers);
        let set: HashSet<_> = byes.iter().copied().collect();
        for slot in &byes {
            let partner = if slot % 2 == 1 { slot + 1 } else { slot - 1 };
            prop_assert!(!set.contains(&partner), "two BYEs paired in round one");
        }
    }

    #[test]
    fn test_seeding_order_is_a_permutation(exp in 1u32..=7) {
        let size = 1usize << exp;
        let order = seeding_order(size);

        prop_assert_eq!(order.len(), size);
        prop_assert_eq!(order[0], 1);
        prop_assert_eq!(order[1], size);
        let unique: HashSet<_> = order.iter().collect();
        prop_assert_eq!(unique.len(), size);
    }

    #[test]
    fn test_regular_sets_accepted(loser in 0u16..=9) {
        prop_assert_eq!(validate_set(1, 11, loser), Ok(Side::A));
        prop_assert_eq!(validate_set(1, loser, 11), Ok(Side::B));
    }

    #[test]
    fn test_deuce_needs_exactly_two(winner in 12u16..=40) {
        prop_assert!(validate_set(1, winner, winner - 2).is_ok());
        prop_assert!(validate_set(1, winner, winner - 1).is_err());
        prop_assert!(validate_set(1, winner, winner).is_err());
    }

    #[test]
    fn test_straight_sets_win(format in prop_oneof![
        Just(MatchFormat::BestOf3),
        Just(MatchFormat::BestOf5),
        Just(MatchFormat::BestOf7),
    ]) {
        let sets = vec![(11, 6); format.sets_to_win()];
        prop_assert_eq!(validate_match_sets(&sets, format), Ok(Side::A));

        let short = vec![(11, 6); format.sets_to_win() - 1];
        prop_assert!(validate_match_sets(&short, format).is_err());
    }

    #[test]
    fn test_ratio_order_matches_division(
        a in 0u32..10_000, b in 1u32..10_000,
        c in 0u32..10_000, d in 1u32..10_000,
    ) {
        let left = Ratio::new(a, b);
        let right = Ratio::new(c, d);
        let expected = (u64::from(a) * u64::from(d)).cmp(&(u64::from(c) * u64::from(b)));
        prop_assert_eq!(left.cmp(&right), expected);
        prop_assert!(Ratio::new(a + 1, 0) > left);
    }

    #[test]
    fn test_draw_keeps_groupmates_apart(groups in 2usize..=12, seed in any::<u64>()) {
        let bracket = BracketBuilder::new(seed, MatchFormat::BestOf5)
            .build("U19", qualifiers(groups), groups, 2, 1)
            .unwrap();

        prop_assert_eq!(bracket.size, bracket_size(2 * groups));
        for g in 1..=groups as EntrantId {
            let winner = bracket.slot_of(1000 + g).unwrap();
            let runner_up = bracket.slot_of(2000 + g).unwrap();
            prop_assert_ne!(half_of(winner, bracket.size), half_of(runner_up, bracket.size));
        }

        // Every BYE has been played through, never left pending
        for number in 1..=bracket.match_count(1) {
            let fixture = bracket.match_at(1, number).unwrap();
            let top = bracket.occupant(1, 2 * number - 1);
            let bottom = bracket.occupant(1, 2 * number);
            prop_assert_eq!(fixture.decided_by_bye, top.is_bye() || bottom.is_bye());
        }
    }
}

//! Integration tests for bracket construction.
//!
//! Groups are played to completion through a category, then the bracket is
//! built and checked for size, BYE layout and placement rules.

use ettem::bracket::{half_of, quarter_of};
use ettem::{
    Category, CompetitionConfig, ConsistencyError, EngineError, EntrantId, MatchOutcome,
    NewEntrant, SlotOccupant,
};

/// Category whose groups are all played; the higher seed always wins 3-0
fn played_category(entrants: usize, config: CompetitionConfig) -> Category {
    let mut category = Category::new("U15", config).unwrap();
    for i in 0..entrants {
        let country = ["ESP", "FRA", "GER", "ITA", "POR"][i % 5];
        category
            .register_entrant(NewEntrant::new(format!("Player {i}"), country, 5000.0 - i as f64))
            .unwrap();
    }
    category.form_groups().unwrap();

    let fixtures: Vec<_> = category
        .group_matches()
        .iter()
        .map(|m| (m.id, m.entrant_a.unwrap(), m.entrant_b.unwrap()))
        .collect();
    for (id, a, b) in fixtures {
        let seed = |e: EntrantId| category.entrant(e).unwrap().seed;
        let sets = if seed(a) < seed(b) {
            vec![(11, 4), (11, 4), (11, 4)]
        } else {
            vec![(4, 11), (4, 11), (4, 11)]
        };
        category
            .record_result(id, &MatchOutcome::scored(sets))
            .unwrap();
    }
    category
}

#[cfg(test)]
mod bracket_tests {
    use super::*;

    #[test]
    fn test_ten_qualifiers_use_sixteen_slots() {
        // 20 entrants, 5 groups of 4, 2 qualifiers each
        let mut category = played_category(20, CompetitionConfig::default());
        let bracket = category.build_bracket().unwrap().clone();

        assert_eq!(bracket.size, 16);
        assert_eq!(bracket.round_count(), 4);
        assert_eq!(bracket.matches.len(), 15);
        assert_eq!(bracket.bye_slots(), vec![2, 6, 7, 10, 11, 15]);

        // Every BYE is paired with an entrant who advanced without playing
        let by_bye: Vec<_> = bracket.matches.iter().filter(|m| m.decided_by_bye).collect();
        assert_eq!(by_bye.len(), 6);
        assert!(by_bye.iter().all(|m| m.winner.is_some() && m.sets.is_empty()));

        let placed = bracket
            .first_round_slots()
            .filter(|s| s.occupant.entrant().is_some())
            .count();
        assert_eq!(placed, 10);
    }

    #[test]
    fn test_two_groups_place_winners_at_the_ends() {
        let mut category = played_category(8, CompetitionConfig::default());
        let qualifiers = category.qualifiers().unwrap();
        let bracket = category.build_bracket().unwrap().clone();

        assert_eq!(bracket.size, 4);
        assert!(bracket.bye_slots().is_empty());
        assert_eq!(bracket.occupant(1, 1), SlotOccupant::Entrant(qualifiers[0].entrant));
        assert_eq!(bracket.occupant(1, 4), SlotOccupant::Entrant(qualifiers[1].entrant));

        // Runners-up meet the other group's winner in the first round
        for runner_up in qualifiers.iter().filter(|q| q.finish == 2) {
            let winner = qualifiers
                .iter()
                .find(|q| q.finish == 1 && q.group == runner_up.group)
                .unwrap();
            let (w, r) = (
                bracket.slot_of(winner.entrant).unwrap(),
                bracket.slot_of(runner_up.entrant).unwrap(),
            );
            assert_ne!(half_of(w, 4), half_of(r, 4));
        }
    }

    #[test]
    fn test_best_group_winner_takes_slot_one() {
        let mut category = played_category(12, CompetitionConfig::default());
        let qualifiers = category.qualifiers().unwrap();

        // Every group winner is unbeaten, so seed decides across groups
        let winners: Vec<_> = qualifiers.iter().filter(|q| q.finish == 1).collect();
        assert_eq!(winners.len(), 3);
        assert!(winners.windows(2).all(|w| w[0].seed < w[1].seed));

        let bracket = category.build_bracket().unwrap();
        assert_eq!(bracket.occupant(1, 1), SlotOccupant::Entrant(winners[0].entrant));
        assert_eq!(bracket.occupant(1, 8), SlotOccupant::Entrant(winners[1].entrant));
    }

    #[test]
    fn test_three_qualifiers_per_group_respect_quarters() {
        let config = CompetitionConfig::default().with_qualifiers(3);
        for seed in 0..10 {
            let mut category = played_category(16, config.clone().with_seed(seed));
            let bracket = category.build_bracket().unwrap().clone();
            assert_eq!(bracket.size, 16);

            for group in category.groups() {
                let slots: Vec<(u32, usize)> = bracket
                    .qualifiers
                    .iter()
                    .filter(|q| q.group == group.id)
                    .map(|q| (q.finish, bracket.slot_of(q.entrant).unwrap()))
                    .collect();
                assert_eq!(slots.len(), 3);

                let slot = |finish| slots.iter().find(|(f, _)| *f == finish).unwrap().1;
                assert_ne!(half_of(slot(1), 16), half_of(slot(2), 16));
                assert_ne!(quarter_of(slot(3), 16), quarter_of(slot(1), 16));
                assert_ne!(quarter_of(slot(3), 16), quarter_of(slot(2), 16));
            }
        }
    }

    #[test]
    fn test_same_seed_same_draw() {
        let draw = |seed| {
            let mut category = played_category(24, CompetitionConfig::default().with_seed(seed));
            category.build_bracket().unwrap().clone()
        };
        assert_eq!(draw(9), draw(9));
    }

    #[test]
    fn test_bracket_ids_follow_group_matches() {
        let mut category = played_category(8, CompetitionConfig::default());
        let last_group_match = category.group_matches().iter().map(|m| m.id).max().unwrap();
        let bracket = category.build_bracket().unwrap();
        assert_eq!(bracket.id_range().start, last_group_match + 1);
    }

    #[test]
    fn test_bracket_built_once() {
        let mut category = played_category(8, CompetitionConfig::default());
        category.build_bracket().unwrap();
        assert!(matches!(
            category.build_bracket(),
            Err(EngineError::Consistency(ConsistencyError::BracketExists(_)))
        ));
    }

    #[test]
    fn test_manual_move_respects_hard_rules() {
        let mut category = played_category(8, CompetitionConfig::default());
        let qualifiers = category.qualifiers().unwrap();
        category.build_bracket().unwrap();

        let winner = qualifiers[0].clone();
        let runner_up = qualifiers
            .iter()
            .find(|q| q.finish == 2 && q.group == winner.group)
            .unwrap()
            .clone();

        // Pull the runner-up out and try to put them next to their group winner
        let from = category.bracket().unwrap().slot_of(runner_up.entrant).unwrap();
        category.assign_slot(from, SlotOccupant::Empty).unwrap();
        assert!(matches!(
            category.assign_slot(2, SlotOccupant::Entrant(runner_up.entrant)),
            Err(EngineError::Consistency(ConsistencyError::SameGroupSameSection { .. }))
        ));

        category
            .assign_slot(from, SlotOccupant::Entrant(runner_up.entrant))
            .unwrap();
        assert_eq!(
            category.bracket().unwrap().slot_of(runner_up.entrant),
            Some(from)
        );
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut category = played_category(8, CompetitionConfig::default());
        category.build_bracket().unwrap();
        assert!(matches!(
            category.assign_slot(5, SlotOccupant::Bye),
            Err(EngineError::SlotNotFound(5))
        ));
    }
}

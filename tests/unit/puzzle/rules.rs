//! Tests for rule families and the derived relation tables

#[cfg(test)]
mod tests {
    use crate::common::small_geometry;
    use stepwise_explainer::ExplainError;
    use stepwise_explainer::puzzle::{
        Assignment, Cage, Cell, Position, Puzzle, RuleBook, RuleKind, Thermometer,
    };

    fn with_rules(rules: Vec<RuleKind>) -> Puzzle {
        Puzzle {
            rules,
            ..Puzzle::classic(small_geometry(), Assignment::empty(small_geometry()))
        }
    }

    // Tests rule identifiers and their keywords
    // Verified by mapping thermo onto the cage keyword
    #[test]
    fn test_rule_kinds() {
        assert_eq!("killer".parse::<RuleKind>().ok(), Some(RuleKind::Killer));
        assert_eq!(RuleKind::Thermo.to_string(), "thermo");
        assert!(matches!(
            "arrow".parse::<RuleKind>(),
            Err(ExplainError::UnsupportedRule { rule }) if rule == "arrow"
        ));
        assert_eq!(RuleKind::Killer.keywords(), &["cage"]);
    }

    // Tests that cost keywords follow rule order without repeats
    // Verified by keeping duplicate rules
    #[test]
    fn test_cost_keywords() {
        let puzzle = with_rules(vec![RuleKind::Thermo, RuleKind::Normal, RuleKind::Thermo]);
        assert_eq!(
            puzzle.cost_keywords(),
            vec!["sameRow", "sameCol", "sameBox", "thermo"]
        );
    }

    // Tests peer relations and houses of the normal rule
    // Verified by tagging box peers in the same row as sameBox
    #[test]
    fn test_normal_tables() {
        let book = RuleBook::new(with_rules(vec![RuleKind::Normal])).unwrap();
        let peers = book.peers(Position::new(0, 0));
        assert_eq!(peers.len(), 7);
        let keyword_of = |position: Position| {
            peers
                .iter()
                .find(|relation| relation.other == position)
                .map(|relation| relation.keyword)
        };
        assert_eq!(keyword_of(Position::new(0, 1)), Some("sameRow"));
        assert_eq!(keyword_of(Position::new(2, 0)), Some("sameCol"));
        assert_eq!(keyword_of(Position::new(1, 1)), Some("sameBox"));
        assert_eq!(keyword_of(Position::new(2, 2)), None);
        assert_eq!(book.houses().len(), 12);
    }

    // Tests consistency under the normal rule
    // Verified by ignoring column peers
    #[test]
    fn test_normal_consistency() {
        let book = RuleBook::new(with_rules(vec![RuleKind::Normal])).unwrap();
        let known =
            Assignment::from_cells(small_geometry(), &[Cell::new(3, 0, 2)]).unwrap();
        assert!(!book.is_consistent(&known, Cell::new(0, 0, 2)));
        assert!(book.is_consistent(&known, Cell::new(0, 0, 1)));
        assert!(!book.is_consistent(&known, Cell::new(0, 0, 5)));
    }

    // Tests strict increase along a thermometer
    // Verified by allowing equal values on neighbouring bulbs
    #[test]
    fn test_thermometer_consistency() {
        let puzzle = Puzzle {
            thermometers: vec![Thermometer {
                cells: vec![Position::new(0, 0), Position::new(1, 1), Position::new(2, 2)],
            }],
            ..with_rules(vec![RuleKind::Thermo])
        };
        let book = RuleBook::new(puzzle).unwrap();
        let empty = Assignment::empty(small_geometry());
        // Bulb needs room for two larger values
        assert!(book.is_consistent(&empty, Cell::new(0, 0, 2)));
        assert!(!book.is_consistent(&empty, Cell::new(0, 0, 3)));
        assert!(!book.is_consistent(&empty, Cell::new(2, 2, 2)));

        let known = Assignment::from_cells(small_geometry(), &[Cell::new(0, 0, 2)]).unwrap();
        assert!(!book.is_consistent(&known, Cell::new(1, 1, 2)));
        assert!(book.is_consistent(&known, Cell::new(1, 1, 3)));
        assert!(!book.is_consistent(&known, Cell::new(2, 2, 3)));
        assert_eq!(book.thermo_slots(Position::new(1, 1)).len(), 1);
    }

    // Tests cage sums with partially filled cages
    // Verified by accepting an incomplete sum on the last cell
    #[test]
    fn test_cage_consistency() {
        let puzzle = Puzzle {
            cages: vec![Cage {
                id: 1,
                sum: 5,
                cells: vec![Position::new(0, 0), Position::new(0, 1)],
            }],
            ..with_rules(vec![RuleKind::Killer])
        };
        let book = RuleBook::new(puzzle).unwrap();
        let empty = Assignment::empty(small_geometry());
        assert!(book.is_consistent(&empty, Cell::new(0, 0, 4)));
        assert!(!book.is_consistent(&empty, Cell::new(0, 0, 5)));

        let known = Assignment::from_cells(small_geometry(), &[Cell::new(0, 0, 1)]).unwrap();
        assert!(book.is_consistent(&known, Cell::new(0, 1, 4)));
        assert!(!book.is_consistent(&known, Cell::new(0, 1, 3)));
        assert_eq!(book.cage(Position::new(0, 1)).map(|cage| cage.id), Some(1));
        assert!(book.cage(Position::new(3, 3)).is_none());
    }

    // Tests construct validation
    // Verified by accepting thermometers off the grid
    #[test]
    fn test_validate_constructs() {
        let off_grid = Puzzle {
            thermometers: vec![Thermometer {
                cells: vec![Position::new(0, 0), Position::new(0, 4)],
            }],
            ..with_rules(vec![RuleKind::Thermo])
        };
        assert!(RuleBook::new(off_grid).is_err());

        let too_long = Puzzle {
            thermometers: vec![Thermometer {
                cells: (0..4)
                    .map(|col| Position::new(0, col))
                    .chain(std::iter::once(Position::new(1, 3)))
                    .collect(),
            }],
            ..with_rules(vec![RuleKind::Thermo])
        };
        assert!(too_long.validate().is_err());

        let repeated = Puzzle {
            cages: vec![
                Cage {
                    id: 2,
                    sum: 3,
                    cells: vec![Position::new(0, 0)],
                },
                Cage {
                    id: 2,
                    sum: 4,
                    cells: vec![Position::new(1, 0)],
                },
            ],
            ..with_rules(vec![RuleKind::Killer])
        };
        assert!(repeated.validate().is_err());
    }
}

//! Tests for solution recording, schema checks and persistence

#[cfg(test)]
mod tests {
    use std::fs;
    use stepwise_explainer::ExplainError;
    use stepwise_explainer::io::solution::{Solution, UsedCells};
    use stepwise_explainer::puzzle::{Cell, Position, RuleKind};
    use tempfile::TempDir;

    fn two_steps() -> Solution {
        let mut solution = Solution::new(&[RuleKind::Normal], Vec::new(), Vec::new());
        solution.add_step(
            1,
            Cell::new(0, 0, 1),
            vec![UsedCells {
                value: 1,
                cells: vec![Position::new(0, 1)],
            }],
            vec![Cell::new(0, 1, 2)],
        );
        solution.add_step(
            2,
            Cell::new(1, 1, 4),
            Vec::new(),
            vec![Cell::new(0, 1, 2), Cell::new(0, 0, 1)],
        );
        solution
    }

    // Tests that the last step is the highest numbered one
    // Verified by returning the first recorded step
    #[test]
    fn test_last_step() {
        let solution = two_steps();
        assert_eq!(solution.last_step().map(|step| step.step_nr), Some(2));
        assert!(Solution::default().last_step().is_none());
        assert_eq!(solution.rules, vec!["normal".to_string()]);
    }

    // Tests the schema checks
    // Verified by accepting repeated step numbers
    #[test]
    fn test_validate() {
        assert!(two_steps().validate().is_ok());

        let mut repeated = two_steps();
        repeated.add_step(2, Cell::new(2, 2, 3), Vec::new(), Vec::new());
        assert!(matches!(
            repeated.validate(),
            Err(ExplainError::InvalidSolution { .. })
        ));

        let mut zero = Solution::default();
        zero.add_step(1, Cell::new(0, 0, 0), Vec::new(), Vec::new());
        assert!(zero.validate().is_err());

        let mut known = Solution::default();
        known.add_step(1, Cell::new(0, 0, 1), Vec::new(), vec![Cell::new(0, 0, 1)]);
        assert!(known.validate().is_err());

        let mut duplicate = Solution::default();
        duplicate.add_step(
            1,
            Cell::new(0, 0, 1),
            Vec::new(),
            vec![Cell::new(1, 1, 2), Cell::new(1, 1, 3)],
        );
        assert!(duplicate.validate().is_err());

        let mut bad_value = Solution::default();
        bad_value.add_step(
            1,
            Cell::new(0, 0, 1),
            vec![UsedCells {
                value: 0,
                cells: Vec::new(),
            }],
            Vec::new(),
        );
        assert!(bad_value.validate().is_err());
    }

    // Tests that a saved solution loads back unchanged without leftovers
    // Verified by leaving the staging file in place
    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("solution.json");
        let solution = two_steps();
        solution.save(&path).unwrap();

        assert_eq!(Solution::from_file(&path).unwrap(), solution);
        assert!(!dir.path().join("solution.json.tmp").exists());
    }

    // Tests that an invalid solution is never written
    // Verified by validating only on load
    #[test]
    fn test_save_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("solution.json");
        let mut solution = two_steps();
        solution.add_step(1, Cell::new(3, 3, 1), Vec::new(), Vec::new());
        assert!(solution.save(&path).is_err());
        assert!(!path.exists());
    }

    // Tests the step and cell wire format
    // Verified by writing cells as objects
    #[test]
    fn test_wire_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("solution.json");
        fs::write(
            &path,
            r#"{
                "steps": [{
                    "step_nr": 1,
                    "cell": [0, 0, 1],
                    "used_cells": [{ "value": 1, "cells": [[0, 1], [1, 0]] }],
                    "current_structure": [[0, 1, 2]]
                }]
            }"#,
        )
        .unwrap();
        let solution = Solution::from_file(&path).unwrap();
        assert!(solution.rules.is_empty());
        let step = solution.steps.first().cloned().unwrap();
        assert_eq!(step.cell, Cell::new(0, 0, 1));
        assert_eq!(
            step.used_cells.first().map(|used| used.cells.len()),
            Some(2)
        );

        fs::write(&path, r#"{ "steps": "none" }"#).unwrap();
        assert!(matches!(
            Solution::from_file(&path),
            Err(ExplainError::SolutionFormat { .. })
        ));
    }
}

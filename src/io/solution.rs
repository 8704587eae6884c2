//! Solution recording, schema checks and persistence

use crate::io::error::{ExplainError, Result, invalid_solution};
use crate::puzzle::grid::{Cell, Position};
use crate::puzzle::rules::{Cage, RuleKind, Thermometer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Cells cited as evidence for one value of a step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedCells {
    /// Value the evidence is about
    pub value: u8,
    /// Positions the evidence relies on
    pub cells: Vec<Position>,
}

/// One committed step of an explanation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step number, starting at 1
    pub step_nr: usize,
    /// Cell revealed by this step
    pub cell: Cell,
    /// Evidence attached to the step
    pub used_cells: Vec<UsedCells>,
    /// Revealed cells before this step was taken
    pub current_structure: Vec<Cell>,
}

/// Ordered explanation of a puzzle, with the rule constructs it refers to
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Committed steps in order
    pub steps: Vec<Step>,
    /// Identifiers of the active rules
    #[serde(default)]
    pub rules: Vec<String>,
    /// Thermometers of the puzzle
    #[serde(default)]
    pub thermometers: Vec<Thermometer>,
    /// Cages of the puzzle
    #[serde(default)]
    pub cages: Vec<Cage>,
}

impl Solution {
    /// Empty solution describing the given rule constructs
    pub fn new(rules: &[RuleKind], thermometers: Vec<Thermometer>, cages: Vec<Cage>) -> Self {
        Self {
            steps: Vec::new(),
            rules: rules.iter().map(|rule| rule.identifier().to_string()).collect(),
            thermometers,
            cages,
        }
    }

    /// Append a step
    ///
    /// Steps are never altered once recorded.
    pub fn add_step(
        &mut self,
        step_nr: usize,
        cell: Cell,
        used_cells: Vec<UsedCells>,
        current_structure: Vec<Cell>,
    ) {
        self.steps.push(Step {
            step_nr,
            cell,
            used_cells,
            current_structure,
        });
    }

    /// Step with the highest step number
    pub fn last_step(&self) -> Option<&Step> {
        self.steps.iter().max_by_key(|step| step.step_nr)
    }

    /// Check the step schema
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A step number is 0 or not larger than the one before
    /// - A snapshot repeats a position or contains the step's own position
    /// - Any value is 0
    pub fn validate(&self) -> Result<()> {
        let mut previous = 0;
        for step in &self.steps {
            if step.step_nr <= previous {
                return Err(invalid_solution(&format!(
                    "step number {} follows {previous}",
                    step.step_nr
                )));
            }
            previous = step.step_nr;

            if step.cell.value == 0 {
                return Err(invalid_solution(&format!(
                    "step {} reveals value 0",
                    step.step_nr
                )));
            }

            let mut seen = BTreeSet::new();
            for cell in &step.current_structure {
                if cell.value == 0 {
                    return Err(invalid_solution(&format!(
                        "snapshot of step {} holds value 0 at {}",
                        step.step_nr,
                        cell.position()
                    )));
                }
                if !seen.insert(cell.position()) {
                    return Err(invalid_solution(&format!(
                        "snapshot of step {} repeats position {}",
                        step.step_nr,
                        cell.position()
                    )));
                }
            }
            if seen.contains(&step.cell.position()) {
                return Err(invalid_solution(&format!(
                    "step {} reveals {} which was already known",
                    step.step_nr,
                    step.cell.position()
                )));
            }

            if let Some(used) = step.used_cells.iter().find(|used| used.value == 0) {
                return Err(invalid_solution(&format!(
                    "step {} cites evidence for value {}",
                    step.step_nr, used.value
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a solution file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, decoded or validated
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ExplainError::FileSystem {
            path: path.to_path_buf(),
            operation: "read solution",
            source: e,
        })?;
        let solution: Self =
            serde_json::from_str(&text).map_err(|e| ExplainError::SolutionFormat {
                path: path.to_path_buf(),
                source: e,
            })?;
        solution.validate()?;
        Ok(solution)
    }

    /// Validate and write the solution
    ///
    /// The text goes to a sibling temporary file first, which then replaces
    /// the target, so an interrupted save leaves the previous file intact.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, encoding or any file operation fails
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let text = serde_json::to_string_pretty(self).map_err(|e| ExplainError::SolutionFormat {
            path: path.to_path_buf(),
            source: e,
        })?;

        let staging = staging_path(path);
        fs::write(&staging, text).map_err(|e| ExplainError::FileSystem {
            path: staging.clone(),
            operation: "write solution",
            source: e,
        })?;
        fs::rename(&staging, path).map_err(|e| ExplainError::FileSystem {
            path: path.to_path_buf(),
            operation: "replace solution",
            source: e,
        })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

//! Puzzle description files

use crate::io::error::{ExplainError, Result, invalid_puzzle};
use crate::puzzle::grid::{Assignment, Cell, Geometry, Position};
use crate::puzzle::rules::{Cage, Puzzle, RuleKind, Thermometer};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Puzzle description as stored on disk
///
/// Givens may be listed as cells, written as a row-major grid string where
/// digits are values and any other character is an empty position, or both.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PuzzleFile {
    /// Grid dimensions, classic 9x9 when omitted
    #[serde(default)]
    pub geometry: Geometry,
    /// Row-major grid string
    #[serde(default)]
    pub grid: Option<String>,
    /// Given cells as `[row, col, value]`
    #[serde(default)]
    pub givens: Vec<Cell>,
    /// Rule identifiers, `["normal"]` when omitted
    #[serde(default = "default_rules")]
    pub rules: Vec<String>,
    /// Thermometers as bulb-first position lists
    #[serde(default)]
    pub thermometers: Vec<Vec<Position>>,
    /// Killer cages
    #[serde(default)]
    pub cages: Vec<Cage>,
}

fn default_rules() -> Vec<String> {
    vec![RuleKind::Normal.identifier().to_string()]
}

impl PuzzleFile {
    /// Resolve rule identifiers and givens into a puzzle
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A rule identifier is unknown
    /// - The grid string doesn't fit the geometry
    /// - Givens conflict or lie off the grid
    /// - Rule constructs fail validation
    pub fn into_puzzle(self) -> Result<Puzzle> {
        self.geometry.validate()?;
        let mut rules = self
            .rules
            .iter()
            .map(|rule| rule.parse::<RuleKind>())
            .collect::<Result<Vec<_>>>()?;
        rules.sort();
        rules.dedup();

        let mut cells = self.givens;
        if let Some(grid) = &self.grid {
            cells.extend(parse_grid(grid, self.geometry)?);
        }
        let givens = Assignment::from_cells(self.geometry, &cells)?;

        let puzzle = Puzzle {
            geometry: self.geometry,
            givens,
            rules,
            thermometers: self
                .thermometers
                .into_iter()
                .map(|cells| Thermometer { cells })
                .collect(),
            cages: self.cages,
        };
        puzzle.validate()?;
        Ok(puzzle)
    }
}

/// Read givens from a row-major grid string
///
/// Line breaks are skipped; a digit is a value, `0` and any other character
/// an empty position.
///
/// # Errors
///
/// Returns an error if the string doesn't cover exactly the grid
pub fn parse_grid(text: &str, geometry: Geometry) -> Result<Vec<Cell>> {
    let symbols: Vec<char> = text
        .trim()
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect();
    if symbols.len() != geometry.cell_count() {
        return Err(invalid_puzzle(&format!(
            "grid string holds {} positions, expected {}",
            symbols.len(),
            geometry.cell_count()
        )));
    }
    Ok(symbols
        .iter()
        .enumerate()
        .filter_map(|(index, symbol)| {
            let value = symbol.to_digit(10).and_then(|d| u8::try_from(d).ok())?;
            (value > 0).then(|| Cell::new(index / geometry.size, index % geometry.size, value))
        })
        .collect())
}

/// Load a puzzle description file
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded, or describes an
/// inconsistent puzzle
pub fn load_puzzle(path: &Path) -> Result<Puzzle> {
    let text = fs::read_to_string(path).map_err(|e| ExplainError::FileSystem {
        path: path.to_path_buf(),
        operation: "read puzzle",
        source: e,
    })?;
    let file: PuzzleFile = serde_json::from_str(&text).map_err(|e| ExplainError::PuzzleLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.into_puzzle()
}

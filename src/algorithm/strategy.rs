use crate::algorithm::bitset::ValueSet;
use crate::io::error::ExplainError;
use crate::puzzle::grid::{Assignment, Cell, Position};
use crate::puzzle::rules::RuleBook;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Pattern detectors that resolve a cell without ranking
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Only one value is consistent with the known cells
    NakedSingle,
    /// A value fits only one position of some house
    HiddenSingle,
}

impl Strategy {
    /// Detectors in the order they are tried
    pub const ORDER: [Self; 2] = [Self::NakedSingle, Self::HiddenSingle];

    /// Positions this detector can resolve, in row-major order
    pub fn detect(self, book: &RuleBook, known: &Assignment) -> Vec<Position> {
        match self {
            Self::NakedSingle => naked_singles(book, known),
            Self::HiddenSingle => hidden_singles(book, known),
        }
    }

    /// Identifier used in logs and on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::NakedSingle => "naked_single",
            Self::HiddenSingle => "hidden_single",
        }
    }
}

impl FromStr for Strategy {
    type Err = ExplainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "naked_single" => Ok(Self::NakedSingle),
            "hidden_single" => Ok(Self::HiddenSingle),
            other => Err(ExplainError::UnsupportedStrategy {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values each empty position can still take
///
/// A value is kept when placing it alone next to the known cells breaks no
/// rule of the book.
pub fn candidate_values(book: &RuleBook, known: &Assignment) -> BTreeMap<Position, ValueSet> {
    let geometry = book.geometry();
    geometry
        .positions()
        .filter(|&position| !known.is_filled(position))
        .map(|position| {
            let mut values = ValueSet::new(geometry.size);
            for value in geometry.values() {
                let cell = Cell::new(position.row, position.col, value);
                if book.is_consistent(known, cell) {
                    values.insert(value);
                }
            }
            (position, values)
        })
        .collect()
}

/// Empty positions with exactly one consistent value
pub fn naked_singles(book: &RuleBook, known: &Assignment) -> Vec<Position> {
    candidate_values(book, known)
        .into_iter()
        .filter(|(_, values)| values.single().is_some())
        .map(|(position, _)| position)
        .collect()
}

/// Empty positions that are the only place left for some value in a house
///
/// Only houses holding one cell per value are searched: rows, columns and
/// boxes under the normal rule, and cages as large as the grid.
pub fn hidden_singles(book: &RuleBook, known: &Assignment) -> Vec<Position> {
    let candidates = candidate_values(book, known);
    let geometry = book.geometry();
    let mut found = Vec::new();
    for house in book.houses() {
        for value in geometry.values() {
            if house.iter().any(|&position| known.get(position) == Some(value)) {
                continue;
            }
            let mut places = house.iter().filter(|position| {
                candidates
                    .get(*position)
                    .is_some_and(|values| values.contains(value))
            });
            if let (Some(&position), None) = (places.next(), places.next())
                && !found.contains(&position)
            {
                found.push(position);
            }
        }
    }
    found.sort_unstable();
    found
}

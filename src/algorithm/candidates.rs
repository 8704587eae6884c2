use crate::puzzle::grid::{Assignment, Cell, Position};
use std::collections::BTreeSet;
use std::fmt;

/// Last known ranking cost of a candidate
///
/// `Known` orders before `Unknown`, so unevaluated candidates sort last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cost {
    /// Cost from the most recent successful evaluation, possibly stale
    Known(u64),
    /// Never evaluated successfully
    Unknown,
}

impl Cost {
    /// Wrap an evaluated cost, treating 0 as a failed evaluation
    pub const fn from_evaluation(cost: u64) -> Option<Self> {
        if cost == 0 { None } else { Some(Self::Known(cost)) }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(cost) => write!(f, "{cost}"),
            Self::Unknown => write!(f, "inf"),
        }
    }
}

/// An unrevealed cell with its remembered cost
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Target cell from the complete structure
    pub cell: Cell,
    /// Last known cost
    pub cost: Cost,
}

/// Working set of cells still to be revealed
///
/// Owned by the driver alone; positions are always the complete structure
/// minus the current structure.
#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    items: Vec<Candidate>,
}

impl CandidateSet {
    /// Build the set difference with every cost unknown
    pub fn from_difference(complete: &Assignment, current: &Assignment) -> Self {
        Self {
            items: complete
                .difference(current)
                .into_iter()
                .map(|cell| Candidate {
                    cell,
                    cost: Cost::Unknown,
                })
                .collect(),
        }
    }

    /// Number of candidates
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Test whether no candidate remains
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Candidates in their current order
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.items.iter()
    }

    /// Candidate at a position, if unrevealed
    pub fn get(&self, position: Position) -> Option<&Candidate> {
        self.items
            .iter()
            .find(|candidate| candidate.cell.position() == position)
    }

    /// Positions of all candidates
    pub fn positions(&self) -> BTreeSet<Position> {
        self.items
            .iter()
            .map(|candidate| candidate.cell.position())
            .collect()
    }

    /// Sort ascending by remembered cost
    ///
    /// The sort is stable, so equal costs keep their previous relative order.
    pub fn sort_by_cost(&mut self) {
        self.items.sort_by_key(|candidate| candidate.cost);
    }

    /// Leading share of the sorted candidates submitted in a round
    ///
    /// `None` submits everything; otherwise `ceil(percent / 100 * len)`
    /// candidates are taken from the front.
    pub fn selection(&self, threshold_percent: Option<f64>) -> &[Candidate] {
        let count = threshold_percent.map_or(self.items.len(), |percent| {
            let share = (percent.clamp(0.0, 100.0) / 100.0 * self.items.len() as f64).ceil();
            (share as usize).min(self.items.len())
        });
        self.items.get(..count).unwrap_or(&self.items)
    }

    /// Store a fresh cost for a cell; failed evaluations (0) are ignored
    pub fn record_cost(&mut self, cell: Cell, cost: u64) -> bool {
        let Some(cost) = Cost::from_evaluation(cost) else {
            return false;
        };
        self.items
            .iter_mut()
            .find(|candidate| candidate.cell == cell)
            .map(|candidate| candidate.cost = cost)
            .is_some()
    }

    /// Candidate with the lowest remembered cost
    ///
    /// Ties keep the earliest candidate in the current order.
    pub fn cheapest(&self) -> Option<&Candidate> {
        self.items
            .iter()
            .reduce(|best, candidate| if candidate.cost < best.cost { candidate } else { best })
    }

    /// Remove a revealed cell, returning its candidate entry
    pub fn remove(&mut self, position: Position) -> Option<Candidate> {
        let index = self
            .items
            .iter()
            .position(|candidate| candidate.cell.position() == position)?;
        Some(self.items.remove(index))
    }
}

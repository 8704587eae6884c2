//! Step-by-step explanation scheduler for grid puzzles
//!
//! Each step reveals the unknown cell whose justification is cheapest. The
//! evidence for every candidate comes from a slow, blocking constraint oracle
//! queried in parallel by a bounded worker pool, ranked by a cost function,
//! and committed greedily until the puzzle is revealed or a step budget runs
//! out. Cheap pattern detectors can resolve a cell before any ranking.

#![forbid(unsafe_code)]

/// Scheduling core: candidate set, worker pool, cost evaluators and the step driver
pub mod algorithm;
/// Command line, configuration, errors, logging and file formats
pub mod io;
/// Constraint oracle boundary and the in-process engine
pub mod oracle;
/// Grid model and puzzle rules
pub mod puzzle;

pub use io::error::{ExplainError, Result};

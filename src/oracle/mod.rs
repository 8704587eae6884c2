//! Boundary to the declarative constraint engine
//!
//! The scheduler treats the engine as a slow, blocking, possibly failing
//! oracle. Calls are stateless: every call carries the complete theory.

use crate::puzzle::{Assignment, Cell, Position, Puzzle, RuleBook};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// In-process reference engine
pub mod native;

pub use native::NativeOracle;

/// Failure of a single oracle call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The call exceeded its soft time limit
    Timeout {
        /// Time spent before giving up
        elapsed: Duration,
    },
    /// The theory is satisfiable, so no contradiction proof exists
    NoContradiction,
    /// The theory has no model at all
    Unsatisfiable,
    /// The engine produced output that could not be interpreted
    Malformed {
        /// Description of the problem
        reason: String,
    },
    /// The engine could not be reached or refused the request
    Unavailable {
        /// Description of the problem
        reason: String,
    },
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { elapsed } => {
                write!(f, "timed out after {:.3}s", elapsed.as_secs_f64())
            }
            Self::NoContradiction => write!(f, "theory is satisfiable, no proof exists"),
            Self::Unsatisfiable => write!(f, "theory has no model"),
            Self::Malformed { reason } => write!(f, "malformed response: {reason}"),
            Self::Unavailable { reason } => write!(f, "engine unavailable: {reason}"),
        }
    }
}

impl std::error::Error for OracleError {}

/// Convenience type alias for oracle call results
pub type OracleResult<T> = std::result::Result<T, OracleError>;

/// Where a theory takes its relation tables from
#[derive(Clone, Debug)]
pub enum RuleSource {
    /// Tables computed once and shared by every call
    Precomputed(Arc<RuleBook>),
    /// Tables derived again from the puzzle on every call
    Deferred(Arc<Puzzle>),
}

/// Facts and rules sent with a single oracle call
#[derive(Clone, Debug)]
pub struct Theory {
    /// Rules of the puzzle
    pub rules: RuleSource,
    /// Cells treated as certainly true
    pub known: Assignment,
}

impl Theory {
    /// Bundle rules and known facts
    pub const fn new(rules: RuleSource, known: Assignment) -> Self {
        Self { rules, known }
    }

    /// Relation tables for this theory
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if deferred tables cannot be derived from the puzzle
    pub fn rule_book(&self) -> OracleResult<Arc<RuleBook>> {
        match &self.rules {
            RuleSource::Precomputed(book) => Ok(Arc::clone(book)),
            RuleSource::Deferred(puzzle) => RuleBook::new(puzzle.as_ref().clone())
                .map(Arc::new)
                .map_err(|error| OracleError::Malformed {
                    reason: error.to_string(),
                }),
        }
    }
}

/// Extra fact added to a theory before asking for a contradiction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hypothesis {
    /// `~gridValue(cell)`: a proof shows the cell must hold its value
    Negated(Cell),
    /// `gridValue(cell)`: a proof shows the cell cannot hold this value
    Asserted(Cell),
}

impl Hypothesis {
    /// Cell the hypothesis talks about
    pub const fn cell(&self) -> Cell {
        match self {
            Self::Negated(cell) | Self::Asserted(cell) => *cell,
        }
    }
}

/// Operations the scheduler needs from a constraint engine
///
/// Every call blocks for its full duration and cannot be interrupted once
/// started; the timeout is a soft limit the engine applies itself.
pub trait Oracle: Send + Sync {
    /// Enumerate one model of the theory
    ///
    /// # Errors
    ///
    /// Returns an error if the theory has no model or the engine fails
    fn solve(&self, theory: &Theory) -> OracleResult<Assignment>;

    /// Produce a minimal contradiction proof for the theory plus a hypothesis
    ///
    /// # Errors
    ///
    /// Returns an error if no contradiction exists, the timeout expires or
    /// the engine fails
    fn prove_unsat(
        &self,
        theory: &Theory,
        hypothesis: Hypothesis,
        timeout: Duration,
    ) -> OracleResult<String>;

    /// Minimise the set of known positions needed to force `target`
    ///
    /// # Errors
    ///
    /// Returns an error if the target isn't forced, the timeout expires or
    /// the engine fails
    fn minimize(
        &self,
        theory: &Theory,
        target: Cell,
        timeout: Duration,
    ) -> OracleResult<Vec<Position>>;
}

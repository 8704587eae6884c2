//! Oracle tasks, their results, and the per-method task builders and committers

use crate::algorithm::cost::find_cells;
use crate::io::solution::UsedCells;
use crate::oracle::{Hypothesis, Oracle, OracleError, Theory};
use crate::puzzle::grid::{Cell, Geometry, Position};
use std::time::{Duration, Instant};
use tracing::debug;

/// Oracle operation a task performs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Ask for a minimal contradiction proof of the theory plus a hypothesis
    ProveUnsat(Hypothesis),
    /// Ask for the minimal set of known positions forcing a cell
    Minimize(Cell),
}

/// One deferred, idempotent oracle call on behalf of a candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OracleTask {
    /// Candidate cell the result is attributed to
    pub subject: Cell,
    /// Call to make
    pub operation: Operation,
}

impl OracleTask {
    /// Cell the oracle is actually asked about
    pub const fn tried(&self) -> Cell {
        match self.operation {
            Operation::ProveUnsat(hypothesis) => hypothesis.cell(),
            Operation::Minimize(cell) => cell,
        }
    }

    /// Run the call, turning any oracle failure into failed evidence
    pub fn execute(
        &self,
        oracle: &dyn Oracle,
        theory: &Theory,
        timeout: Duration,
        step: usize,
    ) -> TaskResult {
        let start = Instant::now();
        let evidence = match self.operation {
            Operation::ProveUnsat(hypothesis) => oracle
                .prove_unsat(theory, hypothesis, timeout)
                .map_or_else(Evidence::Failed, Evidence::Proof),
            Operation::Minimize(cell) => oracle
                .minimize(theory, cell, timeout)
                .map_or_else(Evidence::Failed, Evidence::Ignored),
        };
        let elapsed = start.elapsed();
        debug!(
            "Evidence {step}-{} took {:.3} seconds",
            self.tried(),
            elapsed.as_secs_f64()
        );
        TaskResult {
            subject: self.subject,
            tried: self.tried(),
            evidence,
            elapsed,
        }
    }
}

/// Raw evidence returned by one oracle call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Evidence {
    /// Free-form proof text
    Proof(String),
    /// Minimised set of positions
    Ignored(Vec<Position>),
    /// The call failed; the candidate keeps its previous cost
    Failed(OracleError),
}

/// Immutable result of one executed task
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskResult {
    /// Candidate the task was built for
    pub subject: Cell,
    /// Cell the oracle was asked about
    pub tried: Cell,
    /// Returned evidence
    pub evidence: Evidence,
    /// Wall-clock duration of the call
    pub elapsed: Duration,
}

/// All results of a round belonging to one candidate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateResult {
    /// Candidate cell
    pub cell: Cell,
    /// Per-task results, ordered by tried value
    pub parts: Vec<TaskResult>,
}

impl CandidateResult {
    /// Test that every one of the `expected` tasks returned usable evidence
    ///
    /// Tasks that a round deadline kept from starting count as missing.
    pub fn is_complete(&self, expected: usize) -> bool {
        self.parts.len() == expected
            && self
                .parts
                .iter()
                .all(|part| !matches!(part.evidence, Evidence::Failed(_)))
    }

    /// Every proof obtained for this candidate, joined by newlines
    pub fn concatenated_proof(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match &part.evidence {
                Evidence::Proof(proof) => Some(proof.as_str()),
                Evidence::Ignored(_) | Evidence::Failed(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Group task results by candidate
///
/// Candidates keep the order in which their first result arrived.
pub fn merge_by_subject(results: Vec<TaskResult>) -> Vec<CandidateResult> {
    let mut merged: Vec<CandidateResult> = Vec::new();
    for result in results {
        if let Some(entry) = merged.iter_mut().find(|entry| entry.cell == result.subject) {
            entry.parts.push(result);
        } else {
            merged.push(CandidateResult {
                cell: result.subject,
                parts: vec![result],
            });
        }
    }
    for entry in &mut merged {
        entry.parts.sort_by_key(|part| part.tried.value);
    }
    merged
}

/// Turns a candidate into the oracle tasks that evaluate it
pub trait CandidateTaskBuilder: Send + Sync {
    /// Tasks for one candidate
    fn build(&self, candidate: Cell, geometry: Geometry) -> Vec<OracleTask>;
}

/// One proof that the candidate must hold its value
#[derive(Clone, Copy, Debug, Default)]
pub struct NegatedFactTasks;

impl CandidateTaskBuilder for NegatedFactTasks {
    fn build(&self, candidate: Cell, _geometry: Geometry) -> Vec<OracleTask> {
        vec![OracleTask {
            subject: candidate,
            operation: Operation::ProveUnsat(Hypothesis::Negated(candidate)),
        }]
    }
}

/// One proof per excluded value of the candidate's domain
#[derive(Clone, Copy, Debug, Default)]
pub struct ExcludedValueTasks;

impl CandidateTaskBuilder for ExcludedValueTasks {
    fn build(&self, candidate: Cell, geometry: Geometry) -> Vec<OracleTask> {
        excluded_value_tasks(candidate, geometry)
    }
}

/// One minimisation call per candidate
#[derive(Clone, Copy, Debug, Default)]
pub struct MinimizeTasks;

impl CandidateTaskBuilder for MinimizeTasks {
    fn build(&self, candidate: Cell, _geometry: Geometry) -> Vec<OracleTask> {
        vec![OracleTask {
            subject: candidate,
            operation: Operation::Minimize(candidate),
        }]
    }
}

/// Tasks proving every other value of the domain impossible for a cell
pub fn excluded_value_tasks(cell: Cell, geometry: Geometry) -> Vec<OracleTask> {
    geometry
        .values()
        .filter(|&value| value != cell.value)
        .map(|value| OracleTask {
            subject: cell,
            operation: Operation::ProveUnsat(Hypothesis::Asserted(cell.with_value(value))),
        })
        .collect()
}

/// Turns the winning candidate's evidence into the used cells of a step
pub trait StepCommitter: Send + Sync {
    /// Used cells recorded with the committed step
    fn used_cells(&self, result: &CandidateResult) -> Vec<UsedCells>;
}

/// A single entry for the revealed value, citing every cell of the proof
#[derive(Clone, Debug)]
pub struct SingleProofCommitter {
    keywords: Vec<&'static str>,
}

impl SingleProofCommitter {
    /// Committer extracting cells with the given rule keywords
    pub const fn new(keywords: Vec<&'static str>) -> Self {
        Self { keywords }
    }
}

impl StepCommitter for SingleProofCommitter {
    fn used_cells(&self, result: &CandidateResult) -> Vec<UsedCells> {
        vec![UsedCells {
            value: result.cell.value,
            cells: find_cells(&result.concatenated_proof(), &self.keywords),
        }]
    }
}

/// One entry per excluded value, each citing the cells of its own proof
///
/// By default values whose proof failed are left out. An exhaustive
/// committer lists every tried value and cites no cells for a failed one.
#[derive(Clone, Debug)]
pub struct PerValueCommitter {
    keywords: Vec<&'static str>,
    exhaustive: bool,
}

impl PerValueCommitter {
    /// Committer extracting cells with the given rule keywords
    pub const fn new(keywords: Vec<&'static str>) -> Self {
        Self {
            keywords,
            exhaustive: false,
        }
    }

    /// Committer that also lists values whose proof failed
    pub const fn exhaustive(keywords: Vec<&'static str>) -> Self {
        Self {
            keywords,
            exhaustive: true,
        }
    }
}

impl StepCommitter for PerValueCommitter {
    fn used_cells(&self, result: &CandidateResult) -> Vec<UsedCells> {
        result
            .parts
            .iter()
            .filter_map(|part| match &part.evidence {
                Evidence::Proof(proof) => Some(UsedCells {
                    value: part.tried.value,
                    cells: find_cells(proof, &self.keywords),
                }),
                Evidence::Ignored(_) | Evidence::Failed(_) if self.exhaustive => Some(UsedCells {
                    value: part.tried.value,
                    cells: Vec::new(),
                }),
                Evidence::Ignored(_) | Evidence::Failed(_) => None,
            })
            .collect()
    }
}

/// A single entry for the revealed value, citing the minimised set
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoredSetCommitter;

impl StepCommitter for IgnoredSetCommitter {
    fn used_cells(&self, result: &CandidateResult) -> Vec<UsedCells> {
        let cells = result
            .parts
            .iter()
            .flat_map(|part| match &part.evidence {
                Evidence::Ignored(cells) => cells.clone(),
                Evidence::Proof(_) | Evidence::Failed(_) => Vec::new(),
            })
            .collect();
        vec![UsedCells {
            value: result.cell.value,
            cells,
        }]
    }
}

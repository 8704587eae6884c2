//! Greedy step driver
//!
//! The driver owns every piece of run state: the complete and current
//! structures, the candidate set and the recorded solution. Workers only
//! ever see an immutable theory and hand back immutable results.

use crate::algorithm::candidates::{CandidateSet, Cost};
use crate::algorithm::policy::{Method, MissAction, Policy};
use crate::algorithm::pool::WorkerPool;
use crate::algorithm::strategy::Strategy;
use crate::algorithm::tasks::{
    CandidateResult, Evidence, OracleTask, PerValueCommitter, StepCommitter,
    excluded_value_tasks, merge_by_subject,
};
use crate::io::configuration::{
    DEFAULT_CORE_TIMEOUT_SECS, DEFAULT_SEED, DEFAULT_SELECTION_THRESHOLD, DEFAULT_STEP_BUDGET,
    DEFAULT_STEP_TIMEOUT_SECS, DEFAULT_WORKER_COUNT, MAX_SELECTION_THRESHOLD,
    MIN_SELECTION_THRESHOLD,
};
use crate::io::error::{
    ErrorContext, ExplainError, Result, WithContext, invalid_parameter, invalid_puzzle,
};
use crate::io::solution::{Solution, UsedCells};
use crate::oracle::{Oracle, RuleSource, Theory};
use crate::puzzle::grid::{Assignment, Cell};
use crate::puzzle::rules::{Puzzle, RuleBook};
use clap::ValueEnum;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What to do when no task of a round produced usable evidence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FallbackPolicy {
    /// Commit the candidate with the lowest stored cost, without fresh evidence
    #[default]
    CheapestStored,
    /// Rerun the round over every candidate without a deadline, then fall
    /// back to the cheapest stored candidate
    Retry,
    /// Stop the run with an error
    Abort,
}

/// How equal-cost results of a round are ordered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TieBreak {
    /// The result that arrived first wins
    Arrival,
    /// The result for the lowest cell wins, independent of timing
    #[default]
    Position,
}

/// Recognised driver options
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriverConfig {
    /// Workers per round
    pub worker_count: usize,
    /// Soft limit passed to every oracle call
    pub core_timeout: Duration,
    /// Deadline of every greedy round after the first
    pub step_timeout: Duration,
    /// Percentage of sorted candidates submitted after the first greedy round
    pub selection_threshold: f64,
    /// Build the relation tables once instead of on every call
    pub precompute: bool,
    /// Largest step number taken before aborting
    pub step_budget: usize,
    /// Reaction to a round without usable evidence
    pub fallback: FallbackPolicy,
    /// Ordering of equal-cost results
    pub tie_break: TieBreak,
    /// Seed for random picks
    pub seed: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            core_timeout: Duration::from_secs(DEFAULT_CORE_TIMEOUT_SECS),
            step_timeout: Duration::from_secs(DEFAULT_STEP_TIMEOUT_SECS),
            selection_threshold: DEFAULT_SELECTION_THRESHOLD,
            precompute: true,
            step_budget: DEFAULT_STEP_BUDGET,
            fallback: FallbackPolicy::default(),
            tie_break: TieBreak::default(),
            seed: DEFAULT_SEED,
        }
    }
}

impl DriverConfig {
    /// Check option ranges
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The worker count is 0
    /// - The selection threshold lies outside 0 to 100
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(invalid_parameter(
                "worker_count",
                &self.worker_count,
                &"at least one worker is required",
            ));
        }
        if !(MIN_SELECTION_THRESHOLD..=MAX_SELECTION_THRESHOLD).contains(&self.selection_threshold)
        {
            return Err(invalid_parameter(
                "selection_threshold",
                &self.selection_threshold,
                &format!("must lie between {MIN_SELECTION_THRESHOLD} and {MAX_SELECTION_THRESHOLD}"),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a driver run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Loading the structures
    Init,
    /// Building the shared relation tables
    Precompute,
    /// Searching for the next step
    Round,
    /// Recording the chosen step
    Commit,
    /// Every cell is revealed
    Done,
    /// The step budget ran out, or a round failed under the abort policy
    Aborted,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Precompute => "precompute",
            Self::Round => "round",
            Self::Commit => "commit",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// How a step was found
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    Greedy,
    Fallback,
    Strategy(Strategy),
    Random,
}

/// A chosen cell and the evidence it is committed with
#[derive(Debug)]
struct Decision {
    cell: Cell,
    used_cells: Vec<UsedCells>,
    cost: Cost,
    resolution: Resolution,
}

/// Step-wise explanation scheduler
///
/// Each call to [`advance`](Self::advance) commits at most one step. The
/// first greedy round of a driver always submits every candidate and runs
/// without a deadline; later rounds submit the cheapest share given by the
/// selection threshold and stop dispatching once the step timeout passes.
pub struct GreedyDriver {
    oracle: Arc<dyn Oracle>,
    puzzle: Arc<Puzzle>,
    book: Option<Arc<RuleBook>>,
    method: Method,
    policy: Policy,
    keywords: Vec<&'static str>,
    config: DriverConfig,
    pool: WorkerPool,
    state: DriverState,
    complete: Assignment,
    current: Assignment,
    candidates: CandidateSet,
    solution: Solution,
    step_nr: usize,
    greedy_rounds: usize,
    rng: StdRng,
    output: Option<PathBuf>,
}

impl fmt::Debug for GreedyDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreedyDriver")
            .field("method", &self.method)
            .field("state", &self.state)
            .field("step_nr", &self.step_nr)
            .field("remaining", &self.candidates.len())
            .finish_non_exhaustive()
    }
}

impl GreedyDriver {
    /// Load the structures and prepare the first round
    ///
    /// The complete structure is obtained from the oracle once. When a
    /// previous solution is given, the run resumes after its last step with
    /// that step's snapshot plus its cell as the current structure.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration or the puzzle is invalid
    /// - The resumed solution conflicts with itself
    /// - The oracle cannot solve the puzzle
    pub fn new(
        puzzle: Puzzle,
        oracle: Arc<dyn Oracle>,
        method: Method,
        config: DriverConfig,
        resume: Option<Solution>,
        output: Option<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        let mut state = DriverState::Init;
        debug!("Driver {state}: method {method}, {} workers", config.worker_count);

        let book = if config.precompute {
            state = DriverState::Precompute;
            debug!("Driver {state}: building relation tables");
            Some(Arc::new(RuleBook::new(puzzle.clone())?))
        } else {
            puzzle.validate()?;
            None
        };
        let puzzle = Arc::new(puzzle);
        let geometry = puzzle.geometry;

        let (current, solution, step_nr) = match resume {
            Some(previous) => match previous.last_step() {
                Some(last) => {
                    let mut current = Assignment::from_cells(geometry, &last.current_structure)?;
                    current.insert(last.cell)?;
                    let step_nr = last.step_nr + 1;
                    info!("Resuming at step {step_nr} with {} cells known", current.len());
                    (current, previous, step_nr)
                }
                None => (puzzle.givens.clone(), previous, 1),
            },
            None => (
                puzzle.givens.clone(),
                Solution::new(&puzzle.rules, puzzle.thermometers.clone(), puzzle.cages.clone()),
                1,
            ),
        };

        let rules = book.as_ref().map_or_else(
            || RuleSource::Deferred(Arc::clone(&puzzle)),
            |book| RuleSource::Precomputed(Arc::clone(book)),
        );
        let complete = oracle
            .solve(&Theory::new(rules, current.clone()))
            .with_context(ErrorContext {
                step: None,
                operation: Some("solve"),
            })?;
        if !current.is_subset_of(&complete) {
            return Err(invalid_puzzle(&"known cells disagree with the oracle's model"));
        }

        let candidates = CandidateSet::from_difference(&complete, &current);
        let keywords = puzzle.cost_keywords();
        info!(
            "Explaining {} cells with method {method}, {} already known",
            candidates.len(),
            current.len()
        );

        let mut driver = Self {
            oracle,
            puzzle,
            book,
            method,
            policy: method.policy(&keywords),
            keywords,
            config,
            pool: WorkerPool::new(config.worker_count),
            state: DriverState::Round,
            complete,
            current,
            candidates,
            solution,
            step_nr,
            greedy_rounds: 0,
            rng: StdRng::seed_from_u64(config.seed),
            output,
        };
        driver.settle();
        Ok(driver)
    }

    /// Take one step
    ///
    /// Returns whether more steps can follow. Reaching a terminal state is
    /// not an error; an error is only returned when a step cannot be
    /// committed or persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A round failed under the abort fallback policy
    /// - The relation tables cannot be derived
    /// - The solution cannot be saved
    pub fn advance(&mut self) -> Result<bool> {
        if !self.settle() {
            return Ok(false);
        }

        let start = Instant::now();
        self.state = DriverState::Round;
        let decision = if self.method.uses_strategies() {
            match self.strategy_step()? {
                Some(decision) => decision,
                None => match self.method.on_miss() {
                    MissAction::RandomPick => self.random_step()?,
                    MissAction::GreedyRound => self.greedy_step()?,
                },
            }
        } else {
            self.greedy_step()?
        };

        self.state = DriverState::Commit;
        self.commit(decision)?;
        debug!("Step took {:.3} seconds", start.elapsed().as_secs_f64());
        Ok(self.settle())
    }

    /// Take steps until the puzzle is revealed or the budget runs out
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails, see [`advance`](Self::advance)
    pub fn run(&mut self) -> Result<DriverState> {
        let start = Instant::now();
        while self.advance()? {}
        info!(
            "Run finished {} after {} steps in {:.3} seconds",
            self.state,
            self.solution.steps.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(self.state)
    }

    /// Move to a terminal state if one is reached; returns whether to continue
    fn settle(&mut self) -> bool {
        match self.state {
            DriverState::Done | DriverState::Aborted => false,
            _ if self.current.len() == self.complete.len() => {
                self.state = DriverState::Done;
                info!("All {} cells revealed", self.complete.len());
                false
            }
            _ if self.step_nr > self.config.step_budget => {
                self.state = DriverState::Aborted;
                warn!(
                    "Step budget of {} exhausted with {} cells remaining",
                    self.config.step_budget,
                    self.candidates.len()
                );
                false
            }
            _ => true,
        }
    }

    fn greedy_step(&mut self) -> Result<Decision> {
        self.candidates.sort_by_cost();
        let first = self.greedy_rounds == 0;
        self.greedy_rounds += 1;
        let (threshold, deadline) = if first {
            (None, None)
        } else {
            (
                Some(self.config.selection_threshold),
                Some(self.config.step_timeout),
            )
        };

        let results = self.dispatch(threshold, deadline);
        if let Some(decision) = self.rank(results) {
            return Ok(decision);
        }

        match self.config.fallback {
            FallbackPolicy::CheapestStored => self.cheapest_stored(),
            FallbackPolicy::Retry => {
                warn!(
                    "No evidence for step {}, retrying over all candidates without deadline",
                    self.step_nr
                );
                let results = self.dispatch(None, None);
                match self.rank(results) {
                    Some(decision) => Ok(decision),
                    None => self.cheapest_stored(),
                }
            }
            FallbackPolicy::Abort => {
                self.state = DriverState::Aborted;
                Err(ExplainError::RoundFailed {
                    step: self.step_nr,
                    remaining: self.candidates.len(),
                })
            }
        }
    }

    /// Run the tasks of the selected candidates through the pool
    fn dispatch(&self, threshold: Option<f64>, deadline: Option<Duration>) -> Vec<CandidateResult> {
        let geometry = self.puzzle.geometry;
        let selected = self.candidates.selection(threshold);
        let tasks: Vec<OracleTask> = selected
            .iter()
            .flat_map(|candidate| self.policy.builder.build(candidate.cell, geometry))
            .collect();
        debug!(
            "Submitting {} tasks for {} of {} candidates",
            tasks.len(),
            selected.len(),
            self.candidates.len()
        );

        let theory = Theory::new(self.rule_source(), self.current.clone());
        let oracle = self.oracle.as_ref();
        let timeout = self.config.core_timeout;
        let step = self.step_nr;
        let outcome = self
            .pool
            .run(tasks, deadline, |task| task.execute(oracle, &theory, timeout, step));
        if outcome.cancelled {
            info!(
                "Round deadline expired, {} tasks never started",
                outcome.unstarted
            );
        }
        merge_by_subject(outcome.results)
    }

    /// Update stored costs and pick the cheapest fresh result
    fn rank(&mut self, results: Vec<CandidateResult>) -> Option<Decision> {
        let geometry = self.puzzle.geometry;
        let mut best: Option<(u64, CandidateResult)> = None;
        for result in results {
            let expected = self.policy.builder.build(result.cell, geometry).len();
            let cost = if result.is_complete(expected) {
                self.policy.evaluator.cost(&result)
            } else {
                0
            };
            if cost == 0 {
                for part in &result.parts {
                    if let Evidence::Failed(error) = &part.evidence {
                        debug!("Evidence {}-{} failed: {error}", self.step_nr, part.tried);
                    }
                }
                debug!(
                    "Evidence {}-{} unusable ({} of {expected} parts), keeping stored cost",
                    self.step_nr,
                    result.cell,
                    result.parts.len()
                );
                continue;
            }
            debug!(
                "Evidence {}-{} has cost {cost}",
                self.step_nr, result.cell
            );
            self.candidates.record_cost(result.cell, cost);

            let better = best.as_ref().is_none_or(|(best_cost, best_result)| {
                cost < *best_cost
                    || (cost == *best_cost
                        && self.config.tie_break == TieBreak::Position
                        && result.cell < best_result.cell)
            });
            if better {
                best = Some((cost, result));
            }
        }

        best.map(|(cost, result)| Decision {
            cell: result.cell,
            used_cells: self.policy.committer.used_cells(&result),
            cost: Cost::Known(cost),
            resolution: Resolution::Greedy,
        })
    }

    fn cheapest_stored(&self) -> Result<Decision> {
        let candidate = self
            .candidates
            .cheapest()
            .copied()
            .ok_or(ExplainError::RoundFailed {
                step: self.step_nr,
                remaining: 0,
            })?;
        warn!(
            "No evidence for step {}, picking {} with stored cost {}",
            self.step_nr, candidate.cell, candidate.cost
        );
        Ok(Decision {
            cell: candidate.cell,
            used_cells: vec![UsedCells {
                value: candidate.cell.value,
                cells: Vec::new(),
            }],
            cost: candidate.cost,
            resolution: Resolution::Fallback,
        })
    }

    /// Resolve a cell with the first detector that finds one
    ///
    /// The resolved cell is still explained by one proof per excluded value,
    /// obtained through the pool without a deadline.
    fn strategy_step(&self) -> Result<Option<Decision>> {
        let book = self.rule_book()?;
        for strategy in Strategy::ORDER {
            let found = strategy.detect(&book, &self.current);
            let Some(cell) = found
                .iter()
                .find_map(|&position| self.candidates.get(position).map(|candidate| candidate.cell))
            else {
                continue;
            };
            debug!("Strategy {strategy} resolves {}-{cell}", self.step_nr);

            let theory = Theory::new(self.rule_source(), self.current.clone());
            let oracle = self.oracle.as_ref();
            let timeout = self.config.core_timeout;
            let step = self.step_nr;
            let tasks = excluded_value_tasks(cell, self.puzzle.geometry);
            let outcome = self
                .pool
                .run(tasks, None, |task| task.execute(oracle, &theory, timeout, step));
            let result = merge_by_subject(outcome.results)
                .into_iter()
                .next()
                .unwrap_or(CandidateResult {
                    cell,
                    parts: Vec::new(),
                });

            return Ok(Some(Decision {
                cell,
                used_cells: PerValueCommitter::exhaustive(self.keywords.clone())
                    .used_cells(&result),
                cost: Cost::Unknown,
                resolution: Resolution::Strategy(strategy),
            }));
        }
        Ok(None)
    }

    /// Reveal a random candidate, citing no evidence for any excluded value
    fn random_step(&mut self) -> Result<Decision> {
        let count = self.candidates.len();
        let index = if count == 0 {
            0
        } else {
            self.rng.random_range(0..count)
        };
        let candidate = self
            .candidates
            .iter()
            .nth(index)
            .copied()
            .ok_or(ExplainError::RoundFailed {
                step: self.step_nr,
                remaining: count,
            })?;
        let cell = candidate.cell;
        Ok(Decision {
            cell,
            used_cells: self
                .puzzle
                .geometry
                .values()
                .filter(|&value| value != cell.value)
                .map(|value| UsedCells {
                    value,
                    cells: Vec::new(),
                })
                .collect(),
            cost: candidate.cost,
            resolution: Resolution::Random,
        })
    }

    /// Record the step, reveal the cell and persist the solution
    fn commit(&mut self, decision: Decision) -> Result<()> {
        let step = self.step_nr;
        let snapshot = self.current.cells();
        self.current.insert(decision.cell).with_step(step)?;
        self.candidates.remove(decision.cell.position());
        self.solution
            .add_step(step, decision.cell, decision.used_cells, snapshot);

        match decision.resolution {
            Resolution::Greedy => info!(
                "Step {step} done, fills in {} with cost {}",
                decision.cell, decision.cost
            ),
            Resolution::Fallback => info!(
                "Step {step} done, fills in {} from stored cost {}",
                decision.cell, decision.cost
            ),
            Resolution::Strategy(strategy) => info!(
                "Step {step} done, fills in {} with strategy {strategy}",
                decision.cell
            ),
            Resolution::Random => info!("Step {step} done, fills in {} at random", decision.cell),
        }
        self.step_nr += 1;

        if let Some(path) = &self.output {
            self.solution.save(path).with_step(step)?;
        }
        Ok(())
    }

    fn rule_source(&self) -> RuleSource {
        self.book.as_ref().map_or_else(
            || RuleSource::Deferred(Arc::clone(&self.puzzle)),
            |book| RuleSource::Precomputed(Arc::clone(book)),
        )
    }

    fn rule_book(&self) -> Result<Arc<RuleBook>> {
        match &self.book {
            Some(book) => Ok(Arc::clone(book)),
            None => Ok(Arc::new(RuleBook::new(self.puzzle.as_ref().clone())?)),
        }
    }

    /// Current lifecycle state
    pub const fn state(&self) -> DriverState {
        self.state
    }

    /// Number the next committed step will carry
    pub const fn step_nr(&self) -> usize {
        self.step_nr
    }

    /// Greedy rounds run so far by this driver
    pub const fn greedy_rounds(&self) -> usize {
        self.greedy_rounds
    }

    /// Scheduling method
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Revealed cells
    pub const fn current(&self) -> &Assignment {
        &self.current
    }

    /// Target assignment
    pub const fn complete(&self) -> &Assignment {
        &self.complete
    }

    /// Cells still to be revealed
    pub const fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Steps recorded so far
    pub const fn solution(&self) -> &Solution {
        &self.solution
    }

    /// Consume the driver, keeping its solution
    pub fn into_solution(self) -> Solution {
        self.solution
    }
}

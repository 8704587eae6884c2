//! Command-line interface for explaining a puzzle step by step

use crate::algorithm::driver::{DriverConfig, FallbackPolicy, GreedyDriver, TieBreak};
use crate::algorithm::estimate::estimate_workload;
use crate::algorithm::policy::Method;
use crate::io::configuration::{
    DEFAULT_CALL_SECS, DEFAULT_CORE_TIMEOUT_SECS, DEFAULT_SEED, DEFAULT_SELECTION_THRESHOLD,
    DEFAULT_STEP_BUDGET, DEFAULT_STEP_TIMEOUT_SECS, DEFAULT_WORKER_COUNT,
};
use crate::io::error::Result;
use crate::io::logging::{init_logging, log_level};
use crate::io::progress::ProgressManager;
use crate::io::puzzle::load_puzzle;
use crate::io::solution::Solution;
use crate::oracle::{NativeOracle, Oracle};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "explainer")]
#[command(
    author,
    version,
    about = "Explain a puzzle one cell at a time with minimal evidence"
)]
/// Command-line arguments for the explanation tool
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Scheduling method
    #[arg(value_enum, value_name = "METHOD")]
    pub method: Method,

    /// Puzzle description (JSON)
    #[arg(value_name = "PUZZLE")]
    pub puzzle: PathBuf,

    /// File receiving the explanation (JSON)
    #[arg(value_name = "SOLUTION")]
    pub solution: PathBuf,

    /// Number of workers per round
    #[arg(short, long, default_value_t = DEFAULT_WORKER_COUNT)]
    pub threads: usize,

    /// Soft limit for a single oracle call, in seconds
    #[arg(long, default_value_t = DEFAULT_CORE_TIMEOUT_SECS)]
    pub core_timeout: u64,

    /// Deadline of every round after the first, in seconds
    #[arg(long, default_value_t = DEFAULT_STEP_TIMEOUT_SECS)]
    pub step_timeout: u64,

    /// Percentage of the cheapest candidates submitted after the first round
    #[arg(long, default_value_t = DEFAULT_SELECTION_THRESHOLD)]
    pub selective_threshold: f64,

    /// Resume from a partial solution
    #[arg(long, value_name = "FILE")]
    pub from_partial: Option<PathBuf>,

    /// Rebuild the relation tables on every oracle call
    #[arg(long)]
    pub no_predefine: bool,

    /// Largest step number taken before aborting
    #[arg(short, long, default_value_t = DEFAULT_STEP_BUDGET)]
    pub max_steps: usize,

    /// Random seed for reproducible picks
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Reaction to a round without usable evidence
    #[arg(long, value_enum, default_value_t = FallbackPolicy::CheapestStored)]
    pub fallback: FallbackPolicy,

    /// Ordering of equal-cost results
    #[arg(long, value_enum, default_value_t = TieBreak::Position)]
    pub tie_break: TieBreak,

    /// Write logs to this file instead of stderr
    #[arg(short, long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log every oracle call and cost
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the oracle workload of a full run and exit
    #[arg(long)]
    pub estimate: bool,

    /// Average oracle call duration assumed by the estimate, in seconds
    #[arg(long, default_value_t = DEFAULT_CALL_SECS)]
    pub call_seconds: f64,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Driver options selected by the arguments
    pub const fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            worker_count: self.threads,
            core_timeout: Duration::from_secs(self.core_timeout),
            step_timeout: Duration::from_secs(self.step_timeout),
            selection_threshold: self.selective_threshold,
            precompute: !self.no_predefine,
            step_budget: self.max_steps,
            fallback: self.fallback,
            tie_break: self.tie_break,
            seed: self.seed,
        }
    }
}

/// Runs one explanation from parsed arguments with progress tracking
pub struct ExplainRunner {
    cli: Cli,
    oracle: Arc<dyn Oracle>,
    progress_manager: Option<ProgressManager>,
}

impl ExplainRunner {
    /// Create a runner using the in-process oracle
    pub fn new(cli: Cli) -> Self {
        Self::with_oracle(cli, Arc::new(NativeOracle::new()))
    }

    /// Create a runner using the given oracle
    pub fn with_oracle(cli: Cli, oracle: Arc<dyn Oracle>) -> Self {
        let progress_manager =
            (cli.should_show_progress() && !cli.estimate).then(ProgressManager::new);
        Self {
            cli,
            oracle,
            progress_manager,
        }
    }

    /// Explain the puzzle and write the solution
    ///
    /// # Errors
    ///
    /// Returns an error if loading, configuration, the initial solve or any
    /// step fails
    pub fn process(&mut self) -> Result<()> {
        init_logging(
            self.cli.log_file.as_deref(),
            log_level(self.cli.verbose, self.cli.quiet),
        )?;
        let config = self.cli.driver_config();
        config.validate()?;

        let puzzle = load_puzzle(&self.cli.puzzle)?;
        let resume = self
            .cli
            .from_partial
            .as_deref()
            .map(Solution::from_file)
            .transpose()?;
        let max_value = puzzle.geometry.max_value();

        let mut driver = GreedyDriver::new(
            puzzle,
            Arc::clone(&self.oracle),
            self.cli.method,
            config,
            resume,
            (!self.cli.estimate).then(|| self.cli.solution.clone()),
        )?;

        if self.cli.estimate {
            let estimate = estimate_workload(
                driver.candidates().len(),
                self.cli.method,
                max_value,
                config.step_budget,
                config.worker_count,
                Duration::try_from_secs_f64(self.cli.call_seconds).unwrap_or_default(),
            );
            // Allow print for the requested estimate report
            #[allow(clippy::print_stdout)]
            {
                println!("{estimate}");
            }
            return Ok(());
        }

        let start_time = Instant::now();
        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(
                self.cli.method.name(),
                driver.current().len(),
                driver.complete().len(),
            );
        }

        while driver.advance()? {
            if let Some(ref pm) = self.progress_manager {
                pm.update_step(driver.step_nr(), driver.current().len(), start_time.elapsed());
            }
        }

        if let Some(ref pm) = self.progress_manager {
            pm.update_step(driver.step_nr(), driver.current().len(), start_time.elapsed());
            pm.finish(&driver.state().to_string());
        }
        driver.solution().save(&self.cli.solution)?;
        info!(
            "Explanation {} with {} steps, written to {}",
            driver.state(),
            driver.solution().steps.len(),
            self.cli.solution.display()
        );
        Ok(())
    }
}

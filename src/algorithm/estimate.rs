use crate::algorithm::policy::Method;
use std::fmt;
use std::time::Duration;

/// Oracle workload of a full greedy run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkloadEstimate {
    /// Steps that would be taken
    pub steps: usize,
    /// Oracle calls across all rounds
    pub oracle_calls: u64,
    /// Wall time with a single worker
    pub sequential: Duration,
    /// Wall time spread evenly over all workers
    pub parallel: Duration,
}

/// Estimate the calls and time of a run that submits every candidate
///
/// Step `i` evaluates every cell still unrevealed, so a run over `remaining`
/// cells makes `remaining + (remaining - 1) + ...` evaluations, each costing
/// `calls_per_candidate` oracle calls. A `step_budget` of 0 means no limit.
pub fn estimate_workload(
    remaining: usize,
    method: Method,
    max_value: u8,
    step_budget: usize,
    workers: usize,
    call: Duration,
) -> WorkloadEstimate {
    let steps = if step_budget == 0 {
        remaining
    } else {
        remaining.min(step_budget)
    };
    let evaluations: u64 = (0..steps)
        .map(|step| (remaining - step) as u64)
        .sum();
    let oracle_calls = evaluations.saturating_mul(method.calls_per_candidate(max_value) as u64);

    let sequential = call.saturating_mul(u32::try_from(oracle_calls).unwrap_or(u32::MAX));
    let parallel = sequential / u32::try_from(workers.max(1)).unwrap_or(u32::MAX);
    WorkloadEstimate {
        steps,
        oracle_calls,
        sequential,
        parallel,
    }
}

impl fmt::Display for WorkloadEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Steps to calculate: {}", self.steps)?;
        writeln!(f, "Oracle calls: {}", self.oracle_calls)?;
        writeln!(f, "Sequential: {}", format_hms(self.sequential))?;
        write!(f, "Parallel: {}", format_hms(self.parallel))
    }
}

/// Render a duration as hours, minutes and seconds
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    let (minutes, seconds) = (total / 60, total % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    format!("{hours}h {minutes}m {seconds}s")
}

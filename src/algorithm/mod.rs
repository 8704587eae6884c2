/// Bitset over the value domain of a grid
pub mod bitset;
/// Unrevealed cells and their remembered costs
pub mod candidates;
/// Cost evaluators ranking oracle evidence
pub mod cost;
/// Greedy step driver and its configuration
pub mod driver;
/// Oracle workload estimate for a full run
pub mod estimate;
/// Scheduling methods and the capabilities they select
pub mod policy;
/// Worker pool with deadline and cancellation
pub mod pool;
/// Naked and hidden single detection
pub mod strategy;
/// Oracle tasks, task builders and step committers
pub mod tasks;

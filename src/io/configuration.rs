//! Scheduler constants and runtime configuration defaults

// Default values for configurable parameters
/// Number of workers draining a round's queue
pub const DEFAULT_WORKER_COUNT: usize = 1;

/// Soft limit for a single oracle call, in seconds
pub const DEFAULT_CORE_TIMEOUT_SECS: u64 = 3600;

/// Deadline for a round after the first, in seconds
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 36_000;

/// Share of sorted candidates submitted per round, in percent
pub const DEFAULT_SELECTION_THRESHOLD: f64 = 100.0;

/// Largest step number taken before the run is aborted
pub const DEFAULT_STEP_BUDGET: usize = 100;

/// Fixed seed for reproducible random picks
pub const DEFAULT_SEED: u64 = 42;

// Validation bounds
/// Smallest accepted selection threshold
pub const MIN_SELECTION_THRESHOLD: f64 = 0.0;
/// Largest accepted selection threshold
pub const MAX_SELECTION_THRESHOLD: f64 = 100.0;

// Workload estimate
/// Assumed duration of one oracle call when no measurement is given, in seconds
pub const DEFAULT_CALL_SECS: f64 = 1.0;

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 50;

//! Tests for scheduler configuration constants

#[cfg(test)]
mod tests {
    use stepwise_explainer::algorithm::driver::DriverConfig;
    use stepwise_explainer::io::configuration::{
        DEFAULT_CORE_TIMEOUT_SECS, DEFAULT_SEED, DEFAULT_SELECTION_THRESHOLD, DEFAULT_STEP_BUDGET,
        DEFAULT_STEP_TIMEOUT_SECS, DEFAULT_WORKER_COUNT, MAX_SELECTION_THRESHOLD,
        MIN_SELECTION_THRESHOLD, PROGRESS_BAR_WIDTH,
    };

    // Tests the default timeouts
    // Verified by swapping the core and step timeouts
    #[test]
    fn test_default_timeouts() {
        assert_eq!(DEFAULT_CORE_TIMEOUT_SECS, 3600);
        assert_eq!(DEFAULT_STEP_TIMEOUT_SECS, 36_000);
    }

    // Tests that a default run submits every candidate with one worker
    // Verified by lowering the default threshold
    #[test]
    fn test_default_selection() {
        assert_eq!(DEFAULT_WORKER_COUNT, 1);
        assert!((DEFAULT_SELECTION_THRESHOLD - MAX_SELECTION_THRESHOLD).abs() < f64::EPSILON);
        assert!(MIN_SELECTION_THRESHOLD < MAX_SELECTION_THRESHOLD);
    }

    // Tests the default step budget
    // Verified by changing the budget value
    #[test]
    fn test_default_step_budget() {
        assert_eq!(DEFAULT_STEP_BUDGET, 100);
    }

    // Tests default seed is fixed
    // Verified by changing seed value
    #[test]
    fn test_default_seed_is_reproducible() {
        assert_eq!(DEFAULT_SEED, 42);
    }

    // Tests progress bar width
    // Verified by changing width value
    #[test]
    fn test_progress_bar_width() {
        assert_eq!(PROGRESS_BAR_WIDTH, 50);
    }

    // Tests that the defaults form a valid driver configuration
    // Verified by setting the default worker count to 0
    #[test]
    fn test_defaults_validate() {
        let config = DriverConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.precompute);
        assert_eq!(config.seed, DEFAULT_SEED);
    }
}

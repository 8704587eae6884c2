//! Tests for the oracle workload estimate

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use stepwise_explainer::algorithm::estimate::{estimate_workload, format_hms};
    use stepwise_explainer::algorithm::policy::Method;

    // Tests the triangular call count of an unbounded run
    // Verified by counting only the first step
    #[test]
    fn test_full_run() {
        let estimate =
            estimate_workload(45, Method::Zebratutor, 9, 0, 2, Duration::from_secs(300));
        assert_eq!(estimate.steps, 45);
        assert_eq!(estimate.oracle_calls, 45 * 46 / 2);
        assert_eq!(estimate.sequential, Duration::from_secs(300 * 1035));
        assert_eq!(estimate.parallel, Duration::from_secs(150 * 1035));
    }

    // Tests that the step budget limits the summed steps
    // Verified by ignoring the budget
    #[test]
    fn test_step_budget() {
        let estimate = estimate_workload(10, Method::Zebratutor, 9, 3, 1, Duration::from_secs(1));
        assert_eq!(estimate.steps, 3);
        assert_eq!(estimate.oracle_calls, 10 + 9 + 8);
    }

    // Tests that the detailed method multiplies by the excluded values
    // Verified by dropping the per-candidate factor
    #[test]
    fn test_detailed_factor() {
        let estimate = estimate_workload(2, Method::Detailed, 9, 0, 1, Duration::from_secs(1));
        assert_eq!(estimate.oracle_calls, (2 + 1) * 8);
    }

    // Tests the hours, minutes and seconds rendering
    // Verified by swapping minutes and seconds
    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_secs(3725)), "1h 2m 5s");
        assert_eq!(format_hms(Duration::ZERO), "0h 0m 0s");
    }
}

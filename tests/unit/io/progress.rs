//! Tests for the step progress display

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use stepwise_explainer::io::progress::ProgressManager;

    // Tests ProgressManager construction
    // Verified by setting wrong initial state
    #[test]
    fn test_progress_manager_new() {
        let pm = ProgressManager::new();
        assert_eq!(pm.position(), 0);
        assert_eq!(pm.length(), 0);
        pm.finish("done");
    }

    // Tests that known cells do not count towards the bar
    // Verified by sizing the bar with the total cell count
    #[test]
    fn test_initialize_excludes_known() {
        let mut pm = ProgressManager::default();
        pm.initialize("zebratutor", 30, 81);
        assert_eq!(pm.length(), 51);
        assert_eq!(pm.position(), 0);
    }

    // Tests that steps advance the bar by revealed cells
    // Verified by reporting the step number as position
    #[test]
    fn test_update_step() {
        let mut pm = ProgressManager::new();
        pm.initialize("hybrid", 12, 16);
        pm.update_step(2, 13, Duration::from_millis(40));
        assert_eq!(pm.position(), 1);
        pm.update_step(5, 16, Duration::from_millis(90));
        assert_eq!(pm.position(), 4);
        pm.finish("done");
        assert_eq!(pm.position(), pm.length());
    }
}

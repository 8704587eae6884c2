//! Tests for command-line parsing and the explanation runner

#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;
    use stepwise_explainer::algorithm::driver::{FallbackPolicy, TieBreak};
    use stepwise_explainer::algorithm::policy::Method;
    use stepwise_explainer::io::cli::{Cli, ExplainRunner};
    use stepwise_explainer::io::configuration::{
        DEFAULT_SEED, DEFAULT_SELECTION_THRESHOLD, DEFAULT_STEP_BUDGET, DEFAULT_WORKER_COUNT,
    };
    use stepwise_explainer::io::solution::Solution;
    use tempfile::TempDir;

    const DIAGONAL_GRID: &str = "0234\n3012\n2103\n4320";

    fn write_puzzle(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("puzzle.json");
        let text = serde_json::json!({
            "geometry": { "size": 4, "box_rows": 2, "box_cols": 2 },
            "grid": DIAGONAL_GRID,
        });
        fs::write(&path, text.to_string()).unwrap();
        path
    }

    // Tests parsing with only the positional arguments
    // Verified by changing default values to ensure defaults are used
    #[test]
    fn test_cli_parse_minimal_args() {
        let cli = Cli::parse_from(["explainer", "zebratutor", "p.json", "s.json"]);

        assert_eq!(cli.method, Method::Zebratutor);
        assert_eq!(cli.puzzle, PathBuf::from("p.json"));
        assert_eq!(cli.solution, PathBuf::from("s.json"));
        assert_eq!(cli.threads, DEFAULT_WORKER_COUNT);
        assert_eq!(cli.max_steps, DEFAULT_STEP_BUDGET);
        assert_eq!(cli.seed, DEFAULT_SEED);
        assert!((cli.selective_threshold - DEFAULT_SELECTION_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(cli.fallback, FallbackPolicy::CheapestStored);
        assert_eq!(cli.tie_break, TieBreak::Position);
        assert!(cli.from_partial.is_none());
        assert!(!cli.quiet);
    }

    // Tests parsing with every option and its mapping onto the driver options
    // Verified by inverting the precompute flag
    #[test]
    fn test_cli_parse_all_args() {
        let cli = Cli::parse_from([
            "explainer",
            "detailed",
            "p.json",
            "s.json",
            "-t",
            "4",
            "--core-timeout",
            "30",
            "--step-timeout",
            "120",
            "--selective-threshold",
            "25",
            "--from-partial",
            "old.json",
            "--no-predefine",
            "-m",
            "7",
            "-s",
            "9",
            "--fallback",
            "retry",
            "--tie-break",
            "arrival",
        ]);

        assert_eq!(cli.method, Method::Detailed);
        assert_eq!(cli.from_partial, Some(PathBuf::from("old.json")));
        let config = cli.driver_config();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.core_timeout, Duration::from_secs(30));
        assert_eq!(config.step_timeout, Duration::from_secs(120));
        assert!((config.selection_threshold - 25.0).abs() < f64::EPSILON);
        assert!(!config.precompute);
        assert_eq!(config.step_budget, 7);
        assert_eq!(config.seed, 9);
        assert_eq!(config.fallback, FallbackPolicy::Retry);
        assert_eq!(config.tie_break, TieBreak::Arrival);
    }

    // Tests that unknown methods are rejected at parse time
    // Verified by accepting any method name
    #[test]
    fn test_cli_rejects_unknown_method() {
        assert!(Cli::try_parse_from(["explainer", "annealing", "p.json", "s.json"]).is_err());
        assert!(Cli::try_parse_from(["explainer", "hybrid", "p.json"]).is_err());
    }

    // Tests progress display based on --quiet flag
    // Verified by inverting quiet flag logic
    #[test]
    fn test_should_show_progress() {
        let cli = Cli::parse_from(["explainer", "hybrid", "p.json", "s.json"]);
        assert!(cli.should_show_progress());

        let quiet = Cli::parse_from(["explainer", "hybrid", "p.json", "s.json", "-q"]);
        assert!(!quiet.should_show_progress());
    }

    // Tests error handling for missing puzzle files
    // Verified by removing the error return for unreadable files
    #[test]
    fn test_process_missing_puzzle() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::parse_from([
            "explainer",
            "zebratutor",
            dir.path().join("missing.json").to_str().unwrap(),
            dir.path().join("out.json").to_str().unwrap(),
            "-q",
        ]);
        assert!(ExplainRunner::new(cli).process().is_err());
    }

    // Tests an invalid threshold is rejected before loading anything
    // Verified by removing the configuration check
    #[test]
    fn test_process_invalid_threshold() {
        let dir = TempDir::new().unwrap();
        let puzzle = write_puzzle(&dir);
        let output = dir.path().join("out.json");
        let cli = Cli::parse_from([
            "explainer",
            "zebratutor",
            puzzle.to_str().unwrap(),
            output.to_str().unwrap(),
            "--selective-threshold",
            "150",
            "-q",
        ]);
        assert!(ExplainRunner::new(cli).process().is_err());
        assert!(!output.exists());
    }

    // Tests a full run writes a complete solution
    // Verified by skipping the final save
    #[test]
    fn test_process_writes_solution() {
        let dir = TempDir::new().unwrap();
        let puzzle = write_puzzle(&dir);
        let output = dir.path().join("out.json");
        let cli = Cli::parse_from([
            "explainer",
            "hybrid",
            puzzle.to_str().unwrap(),
            output.to_str().unwrap(),
            "-q",
        ]);
        ExplainRunner::new(cli).process().unwrap();

        let solution = Solution::from_file(&output).unwrap();
        assert_eq!(solution.steps.len(), 4);
        assert_eq!(solution.rules, vec!["normal".to_string()]);
    }

    // Tests that the estimate leaves no solution behind
    // Verified by saving the solution in estimate mode
    #[test]
    fn test_process_estimate_only() {
        let dir = TempDir::new().unwrap();
        let puzzle = write_puzzle(&dir);
        let output = dir.path().join("out.json");
        let cli = Cli::parse_from([
            "explainer",
            "zebratutor",
            puzzle.to_str().unwrap(),
            output.to_str().unwrap(),
            "--estimate",
            "--call-seconds",
            "0.5",
        ]);
        ExplainRunner::new(cli).process().unwrap();
        assert!(!output.exists());
    }
}

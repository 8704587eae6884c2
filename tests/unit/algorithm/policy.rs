//! Tests for method parsing and the capabilities each method selects

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use stepwise_explainer::algorithm::policy::{Method, MissAction};
    use stepwise_explainer::algorithm::tasks::{CandidateResult, Evidence, TaskResult};
    use stepwise_explainer::io::error::ExplainError;
    use stepwise_explainer::puzzle::{Cell, Geometry, Position};

    const NORMAL: [&str; 3] = ["sameRow", "sameCol", "sameBox"];

    // Tests that every method name round-trips and unknown names are rejected
    // Verified by falling back to zebratutor for unknown names
    #[test]
    fn test_method_names() {
        for method in [
            Method::Zebratutor,
            Method::Detailed,
            Method::Alternative,
            Method::Strategies,
            Method::Hybrid,
        ] {
            assert_eq!(method.name().parse::<Method>().ok(), Some(method));
        }
        assert!(matches!(
            "annealing".parse::<Method>(),
            Err(ExplainError::UnsupportedStrategy { name }) if name == "annealing"
        ));
    }

    // Tests which methods consult the strategy layer and what they do on a miss
    // Verified by sending hybrid misses to a random pick
    #[test]
    fn test_strategy_usage() {
        assert!(!Method::Zebratutor.uses_strategies());
        assert!(Method::Hybrid.uses_strategies());
        assert_eq!(Method::Strategies.on_miss(), MissAction::RandomPick);
        assert_eq!(Method::Hybrid.on_miss(), MissAction::GreedyRound);
    }

    // Tests the number of oracle calls per candidate
    // Verified by counting the true value among the detailed calls
    #[test]
    fn test_calls_per_candidate() {
        assert_eq!(Method::Detailed.calls_per_candidate(9), 8);
        assert_eq!(Method::Zebratutor.calls_per_candidate(9), 1);
        assert_eq!(Method::Alternative.calls_per_candidate(4), 1);
    }

    // Tests that the policies pair builders with matching evaluators
    // Verified by giving the alternative method a proof-size evaluator
    #[test]
    fn test_policy_composition() {
        let cell = Cell::new(0, 0, 1);
        let geometry = Geometry::standard();

        let detailed = Method::Detailed.policy(&NORMAL);
        assert_eq!(detailed.builder.build(cell, geometry).len(), 8);

        let alternative = Method::Alternative.policy(&NORMAL);
        let minimised = CandidateResult {
            cell,
            parts: vec![TaskResult {
                subject: cell,
                tried: cell,
                evidence: Evidence::Ignored(vec![Position::new(0, 1), Position::new(0, 2)]),
                elapsed: Duration::ZERO,
            }],
        };
        assert_eq!(alternative.evaluator.cost(&minimised), 2);
        assert_eq!(alternative.committer.used_cells(&minimised).len(), 1);

        let zebratutor = Method::Zebratutor.policy(&NORMAL);
        assert_eq!(zebratutor.evaluator.cost(&minimised), 0);
    }
}

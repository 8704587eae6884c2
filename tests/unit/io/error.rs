//! Tests for error types including source chaining and message formatting

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::path::PathBuf;
    use std::time::Duration;
    use stepwise_explainer::ExplainError;
    use stepwise_explainer::io::error::{
        ErrorContext, WithContext, invalid_parameter, invalid_puzzle, invalid_solution,
    };
    use stepwise_explainer::oracle::OracleError;

    // Tests error source chaining works correctly
    // Verified by breaking source chain
    #[test]
    fn test_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = ExplainError::FileSystem {
            path: "/tmp/solution.json".into(),
            operation: "read solution",
            source: io_error,
        };
        assert!(error.source().is_some());
        assert!(error.to_string().contains("/tmp/solution.json"));

        let oracle = ExplainError::from(OracleError::Unsatisfiable);
        assert!(oracle.source().is_some());
        assert!(invalid_puzzle(&"broken").source().is_none());
    }

    // Tests RoundFailed formatting
    // Verified by omitting the step from the message
    #[test]
    fn test_round_failed_error() {
        let message = ExplainError::RoundFailed {
            step: 12,
            remaining: 30,
        }
        .to_string();
        assert!(message.contains("step 12"));
        assert!(message.contains("30 cells"));
    }

    // Tests InvalidParameter error contains all fields
    // Verified by omitting value from message
    #[test]
    fn test_invalid_parameter_error() {
        let message =
            invalid_parameter("selection_threshold", &150.0, &"must lie between 0 and 100")
                .to_string();
        assert!(message.contains("selection_threshold"));
        assert!(message.contains("150"));
        assert!(message.contains("must lie between 0 and 100"));
    }

    // Tests that oracle failures pick up the step and operation
    // Verified by dropping the step from the context
    #[test]
    fn test_oracle_context() {
        let result: Result<(), OracleError> = Err(OracleError::Timeout {
            elapsed: Duration::from_secs(3),
        });
        let error = result
            .with_context(ErrorContext {
                step: Some(4),
                operation: Some("solve"),
            })
            .unwrap_err();
        assert!(matches!(
            error,
            ExplainError::Oracle {
                operation: "solve",
                step: Some(4),
                ..
            }
        ));
        assert!(error.to_string().contains("at step 4"));
    }

    // Tests that context leaves non-oracle errors untouched
    // Verified by rewriting every error as an oracle failure
    #[test]
    fn test_context_ignores_other_errors() {
        let result: Result<(), ExplainError> = Err(invalid_solution(&"bad step"));
        let error = result.with_step(3).unwrap_err();
        assert!(matches!(error, ExplainError::InvalidSolution { .. }));
        assert!(error.to_string().contains("bad step"));
    }

    // Tests conversion of I/O errors
    // Verified by mapping I/O errors to invalid puzzles
    #[test]
    fn test_io_conversion() {
        let error = ExplainError::from(std::io::Error::other("disk full"));
        assert!(matches!(
            error,
            ExplainError::FileSystem { ref path, .. } if *path == PathBuf::from("<unknown>")
        ));
    }
}

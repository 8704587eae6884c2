//! Error types and context management for explanation runs

use crate::oracle::OracleError;
use std::fmt;
use std::path::PathBuf;

/// Main error type for all explanation operations
#[derive(Debug)]
pub enum ExplainError {
    /// Failed to decode a puzzle description
    PuzzleLoad {
        /// Path to the puzzle file
        path: PathBuf,
        /// Underlying decoding error
        source: serde_json::Error,
    },

    /// Puzzle description doesn't describe a consistent grid
    InvalidPuzzle {
        /// Description of what's wrong with the puzzle
        reason: String,
    },

    /// Rule identifier not known to the rule book
    UnsupportedRule {
        /// The identifier that was requested
        rule: String,
    },

    /// Scheduling method or strategy name not recognised
    UnsupportedStrategy {
        /// The name that was requested
        name: String,
    },

    /// Driver parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Oracle call whose failure cannot be absorbed by the scheduler
    ///
    /// Only the initial `solve` falls in this category: without the complete
    /// structure there is nothing to explain.
    Oracle {
        /// Oracle operation that failed
        operation: &'static str,
        /// Step number at the time of failure, if the loop had started
        step: Option<usize>,
        /// Underlying oracle error
        source: OracleError,
    },

    /// Failed to encode or decode a solution file
    SolutionFormat {
        /// Path of the solution file
        path: PathBuf,
        /// Underlying serialization error
        source: serde_json::Error,
    },

    /// Solution doesn't satisfy the step schema
    InvalidSolution {
        /// Description of the violated constraint
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Every task of a round failed and the fallback policy is to abort
    RoundFailed {
        /// Step number that could not be committed
        step: usize,
        /// Number of candidates still unrevealed
        remaining: usize,
    },
}

impl fmt::Display for ExplainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PuzzleLoad { path, source } => {
                write!(f, "Failed to load puzzle '{}': {source}", path.display())
            }
            Self::InvalidPuzzle { reason } => {
                write!(f, "Invalid puzzle: {reason}")
            }
            Self::UnsupportedRule { rule } => {
                write!(f, "Rule '{rule}' is not supported")
            }
            Self::UnsupportedStrategy { name } => {
                write!(f, "Strategy '{name}' is not supported")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::Oracle {
                operation,
                step,
                source,
            } => match step {
                Some(step) => write!(f, "Oracle {operation} failed at step {step}: {source}"),
                None => write!(f, "Oracle {operation} failed: {source}"),
            },
            Self::SolutionFormat { path, source } => {
                write!(
                    f,
                    "Failed to process solution '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidSolution { reason } => {
                write!(f, "Invalid solution: {reason}")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::RoundFailed { step, remaining } => {
                write!(
                    f,
                    "No evidence obtained for step {step} ({remaining} cells remaining)"
                )
            }
        }
    }
}

impl std::error::Error for ExplainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PuzzleLoad { source, .. } | Self::SolutionFormat { source, .. } => Some(source),
            Self::Oracle { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for explanation results
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Additional context to enrich error messages
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Current step number
    pub step: Option<usize>,
    /// Operation being performed
    pub operation: Option<&'static str>,
}

/// Enriches error messages with driver state information
pub trait WithContext<T> {
    /// Add error context to a Result
    ///
    /// # Errors
    ///
    /// Propagates the original error with additional context applied
    fn with_context(self, context: ErrorContext) -> Result<T>;

    /// Add just the step context
    ///
    /// # Errors
    ///
    /// Propagates the original error with the step context applied
    fn with_step(self, step: usize) -> Result<T>;
}

impl<T, E> WithContext<T> for std::result::Result<T, E>
where
    E: Into<ExplainError>,
{
    fn with_context(self, context: ErrorContext) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();
            // Only oracle failures carry positional context
            if let ExplainError::Oracle {
                step, operation, ..
            } = &mut error
            {
                if context.step.is_some() {
                    *step = context.step;
                }
                if let Some(op) = context.operation {
                    *operation = op;
                }
            }
            error
        })
    }

    fn with_step(self, step: usize) -> Result<T> {
        self.with_context(ErrorContext {
            step: Some(step),
            ..Default::default()
        })
    }
}

impl From<OracleError> for ExplainError {
    fn from(err: OracleError) -> Self {
        Self::Oracle {
            operation: "call",
            step: None,
            source: err,
        }
    }
}

impl From<std::io::Error> for ExplainError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> ExplainError {
    ExplainError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an invalid puzzle error
pub fn invalid_puzzle(reason: &impl ToString) -> ExplainError {
    ExplainError::InvalidPuzzle {
        reason: reason.to_string(),
    }
}

/// Create an invalid solution error
pub fn invalid_solution(reason: &impl ToString) -> ExplainError {
    ExplainError::InvalidSolution {
        reason: reason.to_string(),
    }
}

/// Command-line arguments and the run orchestration
pub mod cli;
/// Named defaults and validation bounds
pub mod configuration;
/// Error types and context management
pub mod error;
/// Log subscriber setup
pub mod logging;
/// Progress display
pub mod progress;
/// Puzzle description files
pub mod puzzle;
/// Solution recording and persistence
pub mod solution;

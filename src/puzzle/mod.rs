/// Cells, positions, grid geometry and assignments
pub mod grid;
/// Rule families, puzzle constructs and derived relation tables
pub mod rules;

pub use grid::{Assignment, Cell, Geometry, Position};
pub use rules::{Cage, Puzzle, RuleBook, RuleKind, Thermometer};

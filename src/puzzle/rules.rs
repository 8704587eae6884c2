use crate::io::error::{ExplainError, Result, invalid_puzzle};
use crate::puzzle::grid::{Assignment, Cell, Geometry, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Keyword of the fact relation, always used for cell extraction
pub const GRID_VALUE_KEYWORD: &str = "gridValue";

/// Rule families a puzzle can combine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    /// Classic uniqueness per row, column and box
    Normal,
    /// Values strictly increase from the bulb along each thermometer
    Thermo,
    /// Values in each cage add up to the cage sum
    Killer,
}

impl RuleKind {
    /// Relation keywords this rule contributes to evidence text
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Normal => &["sameRow", "sameCol", "sameBox"],
            Self::Thermo => &["thermo"],
            Self::Killer => &["cage"],
        }
    }

    /// Identifier used in puzzle and solution files
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Thermo => "thermo",
            Self::Killer => "killer",
        }
    }
}

impl FromStr for RuleKind {
    type Err = ExplainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Self::Normal),
            "thermo" => Ok(Self::Thermo),
            "killer" => Ok(Self::Killer),
            other => Err(ExplainError::UnsupportedRule {
                rule: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Chain of cells whose values strictly increase from the bulb onwards
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thermometer {
    /// Cells ordered from bulb to tip
    pub cells: Vec<Position>,
}

/// Group of cells whose values add up to a fixed sum
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cage {
    /// Identifier used in evidence text
    pub id: usize,
    /// Required sum of the cage values
    pub sum: u32,
    /// Cells in the cage
    pub cells: Vec<Position>,
}

/// Fully specified puzzle: grid, givens and the active rules
#[derive(Clone, Debug)]
pub struct Puzzle {
    /// Grid dimensions
    pub geometry: Geometry,
    /// Initially revealed cells
    pub givens: Assignment,
    /// Active rule families
    pub rules: Vec<RuleKind>,
    /// Thermometers, used when `Thermo` is active
    pub thermometers: Vec<Thermometer>,
    /// Cages, used when `Killer` is active
    pub cages: Vec<Cage>,
}

impl Puzzle {
    /// Classic puzzle with only the normal rule
    pub fn classic(geometry: Geometry, givens: Assignment) -> Self {
        Self {
            geometry,
            givens,
            rules: vec![RuleKind::Normal],
            thermometers: Vec::new(),
            cages: Vec::new(),
        }
    }

    /// Test whether a rule family is active
    pub fn has_rule(&self, rule: RuleKind) -> bool {
        self.rules.contains(&rule)
    }

    /// Keywords for cost calculation of all active rules
    pub fn cost_keywords(&self) -> Vec<&'static str> {
        let mut rules = self.rules.clone();
        rules.sort();
        rules.dedup();
        rules
            .into_iter()
            .flat_map(|rule| rule.keywords().iter().copied())
            .collect()
    }

    /// Check the rule constructs against the grid
    ///
    /// # Errors
    ///
    /// Returns an error if a construct references cells off the grid, a
    /// thermometer is longer than the value domain, or cage ids repeat
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        for thermometer in &self.thermometers {
            if thermometer.cells.len() > self.geometry.size {
                return Err(invalid_puzzle(&format!(
                    "thermometer of length {} cannot increase strictly within 1..={}",
                    thermometer.cells.len(),
                    self.geometry.size
                )));
            }
            self.check_on_grid(&thermometer.cells, "thermometer")?;
        }
        let mut seen = Vec::with_capacity(self.cages.len());
        for cage in &self.cages {
            if seen.contains(&cage.id) {
                return Err(invalid_puzzle(&format!("cage id {} repeats", cage.id)));
            }
            seen.push(cage.id);
            self.check_on_grid(&cage.cells, "cage")?;
        }
        Ok(())
    }

    fn check_on_grid(&self, cells: &[Position], construct: &str) -> Result<()> {
        cells
            .iter()
            .find(|&&position| !self.geometry.contains(position))
            .map_or(Ok(()), |position| {
                Err(invalid_puzzle(&format!(
                    "{construct} cell {position} lies outside the grid"
                )))
            })
    }
}

/// A relation instance between two positions, tagged with its keyword
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relation {
    /// Relation keyword (`sameRow`, `sameCol`, `sameBox`, `thermo`)
    pub keyword: &'static str,
    /// Related position
    pub other: Position,
}

/// Placement of a position on a thermometer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThermoSlot {
    /// Index into the puzzle's thermometers
    pub thermometer: usize,
    /// Index of the position along that thermometer
    pub index: usize,
}

/// Round-invariant relation tables derived from a puzzle
///
/// Holds, per position, the uniqueness peers with the keyword that relates
/// them, the houses (rows, columns, boxes) used by hidden-single detection,
/// and thermometer and cage membership.
#[derive(Clone, Debug)]
pub struct RuleBook {
    puzzle: Puzzle,
    peers: BTreeMap<Position, Vec<Relation>>,
    houses: Vec<Vec<Position>>,
    thermo_slots: BTreeMap<Position, Vec<ThermoSlot>>,
    cage_of: BTreeMap<Position, usize>,
}

impl RuleBook {
    /// Derive all relation tables for a puzzle
    ///
    /// # Errors
    ///
    /// Returns an error if the puzzle constructs fail validation
    pub fn new(puzzle: Puzzle) -> Result<Self> {
        puzzle.validate()?;
        let geometry = puzzle.geometry;

        let mut houses: Vec<Vec<Position>> = Vec::with_capacity(geometry.size * 3);
        if puzzle.has_rule(RuleKind::Normal) {
            for row in 0..geometry.size {
                houses.push((0..geometry.size).map(|col| Position::new(row, col)).collect());
            }
            for col in 0..geometry.size {
                houses.push((0..geometry.size).map(|row| Position::new(row, col)).collect());
            }
            let mut boxes: Vec<Vec<Position>> = vec![Vec::new(); geometry.size];
            for position in geometry.positions() {
                if let Some(cells) = boxes.get_mut(geometry.box_index(position)) {
                    cells.push(position);
                }
            }
            houses.extend(boxes);
        }

        let mut peers: BTreeMap<Position, Vec<Relation>> = BTreeMap::new();
        if puzzle.has_rule(RuleKind::Normal) {
            for a in geometry.positions() {
                let related = peers.entry(a).or_default();
                for b in geometry.positions() {
                    if a == b {
                        continue;
                    }
                    let keyword = if a.row == b.row {
                        "sameRow"
                    } else if a.col == b.col {
                        "sameCol"
                    } else if geometry.box_index(a) == geometry.box_index(b) {
                        "sameBox"
                    } else {
                        continue;
                    };
                    related.push(Relation { keyword, other: b });
                }
            }
        }

        let mut thermo_slots: BTreeMap<Position, Vec<ThermoSlot>> = BTreeMap::new();
        if puzzle.has_rule(RuleKind::Thermo) {
            for (thermometer, thermo) in puzzle.thermometers.iter().enumerate() {
                for (index, &position) in thermo.cells.iter().enumerate() {
                    thermo_slots
                        .entry(position)
                        .or_default()
                        .push(ThermoSlot { thermometer, index });
                    for &other in &thermo.cells {
                        let related = peers.entry(position).or_default();
                        if other != position && !related.iter().any(|r| r.other == other) {
                            related.push(Relation {
                                keyword: "thermo",
                                other,
                            });
                        }
                    }
                }
            }
        }

        let mut cage_of = BTreeMap::new();
        if puzzle.has_rule(RuleKind::Killer) {
            for (index, cage) in puzzle.cages.iter().enumerate() {
                for &position in &cage.cells {
                    cage_of.insert(position, index);
                }
                if cage.cells.len() == geometry.size {
                    houses.push(cage.cells.clone());
                }
            }
        }

        Ok(Self {
            puzzle,
            peers,
            houses,
            thermo_slots,
            cage_of,
        })
    }

    /// Puzzle the tables were derived from
    pub const fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    /// Grid dimensions
    pub const fn geometry(&self) -> Geometry {
        self.puzzle.geometry
    }

    /// Positions that may not share a value with `position`
    pub fn peers(&self, position: Position) -> &[Relation] {
        self.peers.get(&position).map_or(&[], Vec::as_slice)
    }

    /// Groups of positions that must hold every value exactly once
    pub fn houses(&self) -> &[Vec<Position>] {
        &self.houses
    }

    /// Thermometer placements of a position
    pub fn thermo_slots(&self, position: Position) -> &[ThermoSlot] {
        self.thermo_slots.get(&position).map_or(&[], Vec::as_slice)
    }

    /// Thermometer by index
    pub fn thermometer(&self, index: usize) -> Option<&Thermometer> {
        self.puzzle.thermometers.get(index)
    }

    /// Cage containing a position
    pub fn cage(&self, position: Position) -> Option<&Cage> {
        self.cage_of
            .get(&position)
            .and_then(|&index| self.puzzle.cages.get(index))
    }

    /// Test whether a value at `cell` is consistent with every filled cell
    ///
    /// The position of `cell` itself must be empty in `known`.
    pub fn is_consistent(&self, known: &Assignment, cell: Cell) -> bool {
        let position = cell.position();
        let value = cell.value;
        let geometry = self.geometry();
        if !geometry.admits(cell) {
            return false;
        }

        if self
            .peers(position)
            .iter()
            .any(|relation| known.get(relation.other) == Some(value))
        {
            return false;
        }

        for slot in self.thermo_slots(position) {
            let Some(thermo) = self.thermometer(slot.thermometer) else {
                continue;
            };
            let after = thermo.cells.len() - slot.index - 1;
            // Room for the cells before and after on the thermometer
            if usize::from(value) <= slot.index || usize::from(value) + after > geometry.size {
                return false;
            }
            for (other_index, &other) in thermo.cells.iter().enumerate() {
                let Some(other_value) = known.get(other) else {
                    continue;
                };
                let gap = other_index.abs_diff(slot.index);
                let consistent = if other_index < slot.index {
                    usize::from(other_value) + gap <= usize::from(value)
                } else if other_index > slot.index {
                    usize::from(value) + gap <= usize::from(other_value)
                } else {
                    true
                };
                if !consistent {
                    return false;
                }
            }
        }

        if let Some(cage) = self.cage(position) {
            let mut total = u32::from(value);
            let mut empty = 0_u32;
            for &other in &cage.cells {
                if other == position {
                    continue;
                }
                match known.get(other) {
                    Some(other_value) => total += u32::from(other_value),
                    None => empty += 1,
                }
            }
            // Each remaining empty cell contributes at least 1
            if total + empty > cage.sum || (empty == 0 && total != cage.sum) {
                return false;
            }
        }

        true
    }
}

use crate::algorithm::bitset::ValueSet;
use crate::oracle::{Hypothesis, Oracle, OracleError, OracleResult, Theory};
use crate::puzzle::grid::{Assignment, Cell, Position};
use crate::puzzle::rules::{GRID_VALUE_KEYWORD, RuleBook, RuleKind};
use std::fmt::Write;
use std::time::{Duration, Instant};
use tracing::trace;

/// Reference engine answering oracle calls in-process
///
/// Models are found by backtracking over the most constrained position,
/// with naked and hidden singles propagated after every placement.
/// Contradiction proofs are deletion-based minimal unsatisfiable subsets:
/// first of the known facts, then of the rule instances (houses,
/// thermometers, cages) the refutation relies on. Both are rendered in the
/// keyword syntax the cost evaluator reads.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeOracle;

impl NativeOracle {
    /// Create the engine
    pub const fn new() -> Self {
        Self
    }
}

impl Oracle for NativeOracle {
    fn solve(&self, theory: &Theory) -> OracleResult<Assignment> {
        let book = theory.rule_book()?;
        let search = Search::new(&book, None, None);
        search
            .model(&theory.known.cells(), &search.all_groups())?
            .ok_or(OracleError::Unsatisfiable)
    }

    fn prove_unsat(
        &self,
        theory: &Theory,
        hypothesis: Hypothesis,
        timeout: Duration,
    ) -> OracleResult<String> {
        let book = theory.rule_book()?;
        let search = Search::new(&book, Some(hypothesis), Instant::now().checked_add(timeout));
        let core = search.fact_core(&theory.known)?;
        let used = search.group_core(&core)?;
        Ok(search.render(&core, &used))
    }

    fn minimize(
        &self,
        theory: &Theory,
        target: Cell,
        timeout: Duration,
    ) -> OracleResult<Vec<Position>> {
        let book = theory.rule_book()?;
        let search = Search::new(
            &book,
            Some(Hypothesis::Negated(target)),
            Instant::now().checked_add(timeout),
        );
        let core = search.fact_core(&theory.known)?;
        Ok(core.iter().map(Cell::position).collect())
    }
}

/// Rule instances that are switched on or off together during core extraction
#[derive(Clone, Debug)]
enum Group {
    /// Row, column or box holding every value once
    House {
        keyword: &'static str,
        cells: Vec<Position>,
    },
    /// Index into the puzzle's thermometers
    Thermometer(usize),
    /// Index into the puzzle's cages
    Cage(usize),
}

fn rule_groups(book: &RuleBook) -> Vec<Group> {
    let puzzle = book.puzzle();
    let geometry = book.geometry();
    let mut groups = Vec::new();
    if puzzle.has_rule(RuleKind::Normal) {
        for row in 0..geometry.size {
            groups.push(Group::House {
                keyword: "sameRow",
                cells: (0..geometry.size).map(|col| Position::new(row, col)).collect(),
            });
        }
        for col in 0..geometry.size {
            groups.push(Group::House {
                keyword: "sameCol",
                cells: (0..geometry.size).map(|row| Position::new(row, col)).collect(),
            });
        }
        for index in 0..geometry.size {
            groups.push(Group::House {
                keyword: "sameBox",
                cells: geometry
                    .positions()
                    .filter(|&position| geometry.box_index(position) == index)
                    .collect(),
            });
        }
    }
    if puzzle.has_rule(RuleKind::Thermo) {
        groups.extend((0..puzzle.thermometers.len()).map(Group::Thermometer));
    }
    if puzzle.has_rule(RuleKind::Killer) {
        groups.extend((0..puzzle.cages.len()).map(Group::Cage));
    }
    groups
}

/// Depth-first model search under a switchable subset of rule instances
struct Search<'a> {
    book: &'a RuleBook,
    groups: Vec<Group>,
    /// Groups containing each position, by row-major index
    membership: Vec<Vec<usize>>,
    hypothesis: Option<Hypothesis>,
    deadline: Option<Instant>,
    started: Instant,
}

impl<'a> Search<'a> {
    fn new(book: &'a RuleBook, hypothesis: Option<Hypothesis>, deadline: Option<Instant>) -> Self {
        let groups = rule_groups(book);
        let geometry = book.geometry();
        let mut membership = vec![Vec::new(); geometry.cell_count()];
        for (index, group) in groups.iter().enumerate() {
            let cells: Vec<Position> = match group {
                Group::House { cells, .. } => cells.clone(),
                Group::Thermometer(thermometer) => book
                    .thermometer(*thermometer)
                    .map(|thermo| thermo.cells.clone())
                    .unwrap_or_default(),
                Group::Cage(cage) => book
                    .puzzle()
                    .cages
                    .get(*cage)
                    .map(|cage| cage.cells.clone())
                    .unwrap_or_default(),
            };
            for position in cells {
                if let Some(slot) = membership.get_mut(position.row * geometry.size + position.col)
                {
                    slot.push(index);
                }
            }
        }
        Self {
            book,
            groups,
            membership,
            hypothesis,
            deadline,
            started: Instant::now(),
        }
    }

    fn all_groups(&self) -> Vec<bool> {
        vec![true; self.groups.len()]
    }

    /// Shrink the known facts to a subset that still contradicts the hypothesis
    ///
    /// Each fact is dropped in turn and kept out whenever the remainder stays
    /// contradictory, so the result is minimal but not necessarily minimum.
    fn fact_core(&self, known: &Assignment) -> OracleResult<Vec<Cell>> {
        let active = self.all_groups();
        let mut core = known.cells();
        if self.model(&core, &active)?.is_some() {
            return Err(OracleError::NoContradiction);
        }

        let mut index = 0;
        while index < core.len() {
            let mut trial = core.clone();
            trial.remove(index);
            if self.model(&trial, &active)?.is_none() {
                core = trial;
            } else {
                index += 1;
            }
        }
        trace!(
            "Core for {} shrank from {} to {} facts",
            self.target(),
            known.len(),
            core.len()
        );
        Ok(core)
    }

    /// Rule groups the refutation of `core` cannot do without
    fn group_core(&self, core: &[Cell]) -> OracleResult<Vec<usize>> {
        let mut active = self.all_groups();
        for index in 0..active.len() {
            if let Some(slot) = active.get_mut(index) {
                *slot = false;
            }
            if self.model(core, &active)?.is_some()
                && let Some(slot) = active.get_mut(index)
            {
                *slot = true;
            }
        }
        let used: Vec<usize> = active
            .iter()
            .enumerate()
            .filter_map(|(index, &on)| on.then_some(index))
            .collect();
        trace!(
            "Refutation of {} relies on {} of {} rule groups",
            self.target(),
            used.len(),
            self.groups.len()
        );
        Ok(used)
    }

    /// Render a fact core, the hypothesis and the used rule instances
    fn render(&self, core: &[Cell], used: &[usize]) -> String {
        let mut proof = String::new();
        for cell in core {
            let _ = writeln!(
                proof,
                "{GRID_VALUE_KEYWORD}({},{},{}).",
                cell.row, cell.col, cell.value
            );
        }
        let target = self.target();
        let negation = match self.hypothesis {
            Some(Hypothesis::Negated(_)) => "~",
            _ => "",
        };
        let _ = writeln!(
            proof,
            "{negation}{GRID_VALUE_KEYWORD}({},{},{}).",
            target.row, target.col, target.value
        );

        for group in used.iter().filter_map(|&index| self.groups.get(index)) {
            match group {
                Group::House { keyword, cells } => {
                    for pair in cells.windows(2) {
                        if let [a, b] = pair {
                            let _ = writeln!(
                                proof,
                                "{keyword}({},{},{},{}).",
                                a.row, a.col, b.row, b.col
                            );
                        }
                    }
                }
                Group::Thermometer(index) => {
                    let cells = self
                        .book
                        .thermometer(*index)
                        .map(|thermo| thermo.cells.as_slice())
                        .unwrap_or_default();
                    for pair in cells.windows(2) {
                        if let [from, to] = pair {
                            let _ = writeln!(
                                proof,
                                "thermo({},{},{},{}).",
                                from.row, from.col, to.row, to.col
                            );
                        }
                    }
                }
                Group::Cage(index) => {
                    if let Some(cage) = self.book.puzzle().cages.get(*index) {
                        for position in &cage.cells {
                            let _ = writeln!(
                                proof,
                                "cage({},{},{}).",
                                position.row, position.col, cage.id
                            );
                        }
                    }
                }
            }
        }
        proof
    }

    fn target(&self) -> Cell {
        self.hypothesis.map_or(Cell::new(0, 0, 0), |hypothesis| hypothesis.cell())
    }

    /// Find a model containing every fact, or `None` if there is none
    fn model(&self, facts: &[Cell], active: &[bool]) -> OracleResult<Option<Assignment>> {
        self.check_deadline()?;
        let mut grid = Assignment::empty(self.book.geometry());
        let forced = match self.hypothesis {
            Some(Hypothesis::Asserted(cell)) => Some(cell),
            _ => None,
        };
        for &cell in forced.iter().chain(facts) {
            if grid.contains(cell) {
                continue;
            }
            if grid.is_filled(cell.position())
                || self.is_banned(cell)
                || !self.admits(&grid, cell, active)
            {
                return Ok(None);
            }
            place(&mut grid, cell)?;
        }
        if self.extend(&mut grid, active)? {
            Ok(Some(grid))
        } else {
            Ok(None)
        }
    }

    fn extend(&self, grid: &mut Assignment, active: &[bool]) -> OracleResult<bool> {
        self.check_deadline()?;
        let Some(open) = self.propagate(grid, active)? else {
            return Ok(false);
        };
        let Some((position, domain)) = open.into_iter().min_by_key(|(_, domain)| domain.count())
        else {
            return Ok(true);
        };
        for value in domain.to_vec() {
            let mut branch = grid.clone();
            place(&mut branch, Cell::new(position.row, position.col, value))?;
            if self.extend(&mut branch, active)? {
                *grid = branch;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Place naked and hidden singles until none remain
    ///
    /// Returns the domains of the positions left open, or `None` once some
    /// position or house runs out of values.
    fn propagate(
        &self,
        grid: &mut Assignment,
        active: &[bool],
    ) -> OracleResult<Option<Vec<(Position, ValueSet)>>> {
        let geometry = self.book.geometry();
        loop {
            self.check_deadline()?;
            let mut domains: Vec<Option<ValueSet>> = vec![None; geometry.cell_count()];
            let mut forced = Vec::new();
            for position in geometry.positions() {
                if grid.is_filled(position) {
                    continue;
                }
                let domain = self.domain(grid, position, active);
                match domain.count() {
                    0 => return Ok(None),
                    1 => forced.extend(
                        domain
                            .single()
                            .map(|value| Cell::new(position.row, position.col, value)),
                    ),
                    _ => {}
                }
                if let Some(slot) = domains.get_mut(position.row * geometry.size + position.col) {
                    *slot = Some(domain);
                }
            }

            for (index, group) in self.groups.iter().enumerate() {
                let Group::House { cells, .. } = group else {
                    continue;
                };
                if !active.get(index).copied().unwrap_or(false) {
                    continue;
                }
                for value in geometry.values() {
                    if cells.iter().any(|&position| grid.get(position) == Some(value)) {
                        continue;
                    }
                    let mut spots = cells.iter().filter(|position| {
                        domains
                            .get(position.row * geometry.size + position.col)
                            .and_then(Option::as_ref)
                            .is_some_and(|domain| domain.contains(value))
                    });
                    match (spots.next(), spots.next()) {
                        (None, _) => return Ok(None),
                        (Some(position), None) => {
                            forced.push(Cell::new(position.row, position.col, value));
                        }
                        _ => {}
                    }
                }
            }

            if forced.is_empty() {
                return Ok(Some(
                    geometry
                        .positions()
                        .filter_map(|position| {
                            domains
                                .get_mut(position.row * geometry.size + position.col)
                                .and_then(Option::take)
                                .map(|domain| (position, domain))
                        })
                        .collect(),
                ));
            }
            // Every forced cell follows from the grid at the start of the pass
            for cell in forced {
                if grid.contains(cell) {
                    continue;
                }
                if grid.is_filled(cell.position()) || !self.admits(grid, cell, active) {
                    return Ok(None);
                }
                place(grid, cell)?;
            }
        }
    }

    fn domain(&self, grid: &Assignment, position: Position, active: &[bool]) -> ValueSet {
        let geometry = self.book.geometry();
        let mut domain = ValueSet::new(geometry.size);
        for value in geometry.values() {
            let cell = Cell::new(position.row, position.col, value);
            if !self.is_banned(cell) && self.admits(grid, cell, active) {
                domain.insert(value);
            }
        }
        domain
    }

    /// Test a value against every active group containing its position
    fn admits(&self, grid: &Assignment, cell: Cell, active: &[bool]) -> bool {
        let geometry = self.book.geometry();
        if !geometry.admits(cell) {
            return false;
        }
        self.membership
            .get(cell.row * geometry.size + cell.col)
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .filter(|&&index| active.get(index).copied().unwrap_or(false))
            .filter_map(|&index| self.groups.get(index))
            .all(|group| self.group_admits(grid, cell, group))
    }

    fn group_admits(&self, grid: &Assignment, cell: Cell, group: &Group) -> bool {
        let position = cell.position();
        let value = usize::from(cell.value);
        match group {
            Group::House { cells, .. } => !cells
                .iter()
                .any(|&other| other != position && grid.get(other) == Some(cell.value)),
            Group::Thermometer(index) => {
                let Some(thermo) = self.book.thermometer(*index) else {
                    return true;
                };
                let Some(slot) = thermo.cells.iter().position(|&other| other == position) else {
                    return true;
                };
                let after = thermo.cells.len() - slot - 1;
                if value <= slot || value + after > self.book.geometry().size {
                    return false;
                }
                thermo.cells.iter().enumerate().all(|(other_slot, &other)| {
                    let Some(other_value) = grid.get(other).map(usize::from) else {
                        return true;
                    };
                    let gap = other_slot.abs_diff(slot);
                    if other_slot < slot {
                        other_value + gap <= value
                    } else if other_slot > slot {
                        value + gap <= other_value
                    } else {
                        true
                    }
                })
            }
            Group::Cage(index) => {
                let Some(cage) = self.book.puzzle().cages.get(*index) else {
                    return true;
                };
                let mut total = u32::from(cell.value);
                let mut empty = 0_u32;
                for &other in &cage.cells {
                    if other == position {
                        continue;
                    }
                    match grid.get(other) {
                        Some(other_value) => total += u32::from(other_value),
                        None => empty += 1,
                    }
                }
                // Each remaining empty cell contributes at least 1
                total + empty <= cage.sum && (empty > 0 || total == cage.sum)
            }
        }
    }

    fn is_banned(&self, cell: Cell) -> bool {
        self.hypothesis == Some(Hypothesis::Negated(cell))
    }

    fn check_deadline(&self) -> OracleResult<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(OracleError::Timeout {
                elapsed: self.started.elapsed(),
            }),
            _ => Ok(()),
        }
    }
}

fn place(grid: &mut Assignment, cell: Cell) -> OracleResult<()> {
    grid.insert(cell).map_err(|error| OracleError::Malformed {
        reason: error.to_string(),
    })
}

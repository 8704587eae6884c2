//! Cost evaluation of oracle evidence
//!
//! Costs are only used for ranking: lower is easier to explain, and 0 marks
//! an evaluation that failed and must be ignored.

use crate::algorithm::tasks::{CandidateResult, Evidence};
use crate::puzzle::grid::Position;
use crate::puzzle::rules::GRID_VALUE_KEYWORD;
use regex::Regex;

/// Distinct positions referenced by relation atoms in proof text
///
/// Atoms named by `keywords` (and `gridValue`, which is always used) have
/// their numeric arguments read in `(row, col)` pairs; an odd trailing
/// argument such as a cage id is ignored. Positions are returned in order of
/// first appearance, scanning keyword by keyword.
pub fn find_cells(proof: &str, keywords: &[&str]) -> Vec<Position> {
    let mut used = Vec::new();
    for keyword in keywords
        .iter()
        .copied()
        .chain(std::iter::once(GRID_VALUE_KEYWORD))
    {
        let Ok(pattern) = Regex::new(&format!(r"{}\(([\d,]+)\)", regex::escape(keyword))) else {
            continue;
        };
        for captures in pattern.captures_iter(proof) {
            let Some(arguments) = captures.get(1) else {
                continue;
            };
            let numbers: Vec<usize> = arguments
                .as_str()
                .split(',')
                .filter_map(|number| number.parse().ok())
                .collect();
            for pair in numbers.chunks_exact(2) {
                if let [row, col] = pair {
                    let position = Position::new(*row, *col);
                    if !used.contains(&position) {
                        used.push(position);
                    }
                }
            }
        }
    }
    used
}

/// Proof-size cost
///
/// The number of distinct positions in the proof, multiplied by one plus the
/// occurrence count of every rule keyword. A proof about few cells using few
/// rule types is cheapest. Text referencing no cell costs 0.
pub fn proof_cost(proof: &str, keywords: &[&str]) -> u64 {
    let cells = find_cells(proof, keywords).len() as u64;
    keywords.iter().fold(cells, |cost, keyword| {
        let occurrences = proof.matches(keyword).count() as u64;
        cost.saturating_mul(occurrences + 1)
    })
}

/// Ignored-set cost: the size of the minimised set
pub const fn ignored_set_cost(cells: &[Position]) -> u64 {
    cells.len() as u64
}

/// Ranking policy applied to the merged results of one candidate
pub trait CostEvaluator: Send + Sync {
    /// Cost of a candidate's evidence, 0 if it must be ignored
    fn cost(&self, result: &CandidateResult) -> u64;
}

/// Proof-size cost over the concatenation of every proof obtained
///
/// With one task per candidate this is the plain proof-size cost; with one
/// task per excluded value it is the per-wrong-value aggregate cost. Parts
/// that failed are left out of the concatenation.
#[derive(Clone, Debug)]
pub struct ProofSizeCost {
    keywords: Vec<&'static str>,
}

impl ProofSizeCost {
    /// Cost evaluator for the given rule keywords
    pub const fn new(keywords: Vec<&'static str>) -> Self {
        Self { keywords }
    }
}

impl CostEvaluator for ProofSizeCost {
    fn cost(&self, result: &CandidateResult) -> u64 {
        proof_cost(&result.concatenated_proof(), &self.keywords)
    }
}

/// Ignored-set cost of a minimisation result
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoredSetCost;

impl CostEvaluator for IgnoredSetCost {
    fn cost(&self, result: &CandidateResult) -> u64 {
        result
            .parts
            .iter()
            .map(|part| match &part.evidence {
                Evidence::Ignored(cells) => ignored_set_cost(cells),
                Evidence::Proof(_) | Evidence::Failed(_) => 0,
            })
            .sum()
    }
}

use crate::algorithm::cost::{CostEvaluator, IgnoredSetCost, ProofSizeCost};
use crate::algorithm::tasks::{
    CandidateTaskBuilder, ExcludedValueTasks, IgnoredSetCommitter, MinimizeTasks,
    NegatedFactTasks, PerValueCommitter, SingleProofCommitter, StepCommitter,
};
use crate::io::error::ExplainError;
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// Scheduling method selecting how each step is found and explained
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// One negated-fact proof per candidate, ranked by proof size
    Zebratutor,
    /// One proof per excluded value, ranked by the aggregate proof size
    Detailed,
    /// One minimisation per candidate, ranked by the ignored-set size
    Alternative,
    /// Strategy layer first, unexplained random pick on a miss
    Strategies,
    /// Strategy layer first, greedy round on a miss
    Hybrid,
}

impl Method {
    /// Identifier used on the command line and in logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zebratutor => "zebratutor",
            Self::Detailed => "detailed",
            Self::Alternative => "alternative",
            Self::Strategies => "strategies",
            Self::Hybrid => "hybrid",
        }
    }

    /// What happens when the strategy layer finds nothing
    pub const fn on_miss(self) -> MissAction {
        match self {
            Self::Strategies => MissAction::RandomPick,
            Self::Zebratutor | Self::Detailed | Self::Alternative | Self::Hybrid => {
                MissAction::GreedyRound
            }
        }
    }

    /// Whether the strategy layer is queried before each round
    pub const fn uses_strategies(self) -> bool {
        matches!(self, Self::Strategies | Self::Hybrid)
    }

    /// Oracle calls a greedy round makes per candidate
    pub const fn calls_per_candidate(self, max_value: u8) -> usize {
        match self {
            Self::Detailed => max_value.saturating_sub(1) as usize,
            Self::Zebratutor | Self::Alternative | Self::Strategies | Self::Hybrid => 1,
        }
    }

    /// Capabilities of the greedy round for this method
    pub fn policy(self, keywords: &[&'static str]) -> Policy {
        match self {
            Self::Zebratutor | Self::Strategies | Self::Hybrid => Policy {
                builder: Box::new(NegatedFactTasks),
                evaluator: Box::new(ProofSizeCost::new(keywords.to_vec())),
                committer: Box::new(SingleProofCommitter::new(keywords.to_vec())),
            },
            Self::Detailed => Policy {
                builder: Box::new(ExcludedValueTasks),
                evaluator: Box::new(ProofSizeCost::new(keywords.to_vec())),
                committer: Box::new(PerValueCommitter::new(keywords.to_vec())),
            },
            Self::Alternative => Policy {
                builder: Box::new(MinimizeTasks),
                evaluator: Box::new(IgnoredSetCost),
                committer: Box::new(IgnoredSetCommitter),
            },
        }
    }
}

impl FromStr for Method {
    type Err = ExplainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zebratutor" => Ok(Self::Zebratutor),
            "detailed" => Ok(Self::Detailed),
            "alternative" => Ok(Self::Alternative),
            "strategies" => Ok(Self::Strategies),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(ExplainError::UnsupportedStrategy {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Step taken when no strategy applies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissAction {
    /// Run a full greedy round
    GreedyRound,
    /// Reveal a random candidate without evidence
    RandomPick,
}

/// The three swappable capabilities of a greedy round
pub struct Policy {
    /// Turns candidates into oracle tasks
    pub builder: Box<dyn CandidateTaskBuilder>,
    /// Ranks merged results
    pub evaluator: Box<dyn CostEvaluator>,
    /// Turns the winner's evidence into used cells
    pub committer: Box<dyn StepCommitter>,
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy").finish_non_exhaustive()
    }
}

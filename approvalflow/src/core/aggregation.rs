//! Aggregation policies for combining task decisions within a stage.

use super::status::{Decision, ParseEnumError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Counts of task decisions within one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTally {
    /// Tasks taking part in the vote.
    pub total: usize,
    /// Tasks still awaiting a decision.
    pub pending: usize,
    /// Tasks holding any non-pending decision.
    pub completed: usize,
    /// Tasks holding `approved` or `approved_with_conditions`.
    pub approvals: usize,
}

impl StageTally {
    /// Builds a tally from the decisions of a stage's tasks.
    ///
    /// A `delegate` decision hands the vote to a replacement task in the same
    /// stage, so it is left out of the tally unless `count_delegated` is set.
    #[must_use]
    pub fn from_decisions<I>(decisions: I, count_delegated: bool) -> Self
    where
        I: IntoIterator<Item = Decision>,
    {
        let mut tally = Self::default();
        for decision in decisions {
            if decision == Decision::Delegated && !count_delegated {
                continue;
            }
            tally.total += 1;
            if decision.is_complete() {
                tally.completed += 1;
            } else {
                tally.pending += 1;
            }
            if decision.is_approval() {
                tally.approvals += 1;
            }
        }
        tally
    }
}

/// How the decisions of several approvers combine into a stage verdict.
///
/// Rejections are handled before aggregation is consulted: any rejected
/// task ends the workflow regardless of the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Every task must be decided, and every decision must be an approval.
    #[default]
    All,
    /// One approval is enough; remaining tasks are left pending.
    Any,
    /// Approvals must exceed half of the stage's tasks.
    Majority,
    /// The first decision of any kind closes the stage.
    First,
}

impl Aggregation {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
            Self::Majority => "majority",
            Self::First => "first",
        }
    }

    /// Returns true if the stage described by `tally` is complete.
    #[must_use]
    pub const fn is_satisfied(&self, tally: &StageTally) -> bool {
        match self {
            Self::All => {
                tally.total > 0 && tally.pending == 0 && tally.approvals == tally.completed
            }
            Self::Any => tally.approvals > 0,
            Self::Majority => tally.approvals * 2 > tally.total,
            Self::First => tally.completed > 0,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            "majority" => Ok(Self::Majority),
            "first" => Ok(Self::First),
            other => Err(ParseEnumError {
                kind: "aggregation",
                value: other.to_string(),
            }),
        }
    }
}

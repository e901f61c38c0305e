//! Stage evaluation.

use crate::core::{Decision, StageTally};
use crate::model::{Stage, Task};

/// Outcome of evaluating a stage after a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageVerdict {
    /// A task was rejected; the workflow ends.
    Rejected {
        /// The rejection that determines the final comment.
        task_id: String,
        /// Its comments.
        comments: String,
    },
    /// The aggregation policy is satisfied.
    Complete,
    /// More decisions are needed.
    Waiting,
}

/// Evaluates `stage` over its tasks.
///
/// A rejection wins over every policy. When several tasks are rejected the
/// earliest decision counts, ties going to the task created first.
#[must_use]
pub fn evaluate_stage<'a, I>(stage: &Stage, tasks: I, count_delegated: bool) -> StageVerdict
where
    I: IntoIterator<Item = &'a Task>,
{
    let tasks: Vec<&Task> = tasks
        .into_iter()
        .filter(|t| t.stage_id == stage.id)
        .collect();

    let first_rejection = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.decision == Decision::Rejected)
        .min_by_key(|(index, t)| (t.decision_at, *index));
    if let Some((_, task)) = first_rejection {
        return StageVerdict::Rejected {
            task_id: task.id.clone(),
            comments: task.comments.clone(),
        };
    }

    let tally = StageTally::from_decisions(tasks.iter().map(|t| t.decision), count_delegated);
    if stage.aggregation.is_satisfied(&tally) {
        StageVerdict::Complete
    } else {
        StageVerdict::Waiting
    }
}

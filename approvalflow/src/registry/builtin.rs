//! Built-in workflow templates.

use crate::core::{Aggregation, StageKind};
use crate::model::{Definition, Stage};

/// Id of the engineering change order approval workflow.
pub const CHANGE_ORDER_DEFINITION_ID: &str = "wf-eco-standard";
/// Id of the controlled document review workflow.
pub const DOCUMENT_REVIEW_DEFINITION_ID: &str = "wf-doc-review";
/// Id of the part release workflow.
pub const PART_RELEASE_DEFINITION_ID: &str = "wf-part-release";

/// Returns every built-in definition.
#[must_use]
pub fn builtin_definitions() -> Vec<Definition> {
    vec![
        change_order_definition(),
        document_review_definition(),
        part_release_definition(),
    ]
}

/// Multi-stage approval for engineering change orders.
#[must_use]
pub fn change_order_definition() -> Definition {
    Definition::new(CHANGE_ORDER_DEFINITION_ID, "Standard ECO Approval")
        .with_description("Multi-stage approval for Engineering Change Orders")
        .with_entity_types(["eco", "change-order"])
        .with_stage(
            Stage::new("stage-submit", "Submission Review", 10)
                .with_kind(StageKind::Review)
                .with_roles(["document_control"])
                .with_aggregation(Aggregation::Any)
                .with_due_days(2)
                .with_instructions("Verify ECO completeness and proper documentation"),
        )
        .with_stage(
            Stage::new("stage-engineering", "Engineering Review", 20)
                .with_roles(["engineer", "engineering_manager"])
                .with_aggregation(Aggregation::All)
                .with_due_days(5)
                .with_instructions("Review technical merit and impact analysis")
                .with_checklist([
                    "Technical feasibility verified",
                    "Impact analysis complete",
                    "Test plan defined",
                ]),
        )
        .with_stage(
            Stage::new("stage-quality", "Quality Review", 30)
                .with_roles(["quality_engineer"])
                .with_aggregation(Aggregation::Any)
                .with_due_days(3)
                .with_instructions("Review quality and compliance implications"),
        )
        .with_stage(
            Stage::new("stage-final", "Final Approval", 40)
                .with_roles(["engineering_director", "program_manager"])
                .with_aggregation(Aggregation::Any)
                .with_due_days(3)
                .with_instructions("Final approval for implementation"),
        )
}

/// Review and release of controlled documents.
#[must_use]
pub fn document_review_definition() -> Definition {
    Definition::new(DOCUMENT_REVIEW_DEFINITION_ID, "Document Review")
        .with_description("Review and release workflow for controlled documents")
        .with_entity_types(["document"])
        .with_stage(
            Stage::new("stage-peer-review", "Peer Review", 10)
                .with_kind(StageKind::Review)
                .with_roles(["engineer"])
                .with_aggregation(Aggregation::Any)
                .with_due_days(3)
                .with_instructions("Review document for accuracy and completeness"),
        )
        .with_stage(
            Stage::new("stage-approval", "Manager Approval", 20)
                .with_roles(["manager"])
                .with_aggregation(Aggregation::Any)
                .with_due_days(2)
                .with_instructions("Approve document for release"),
        )
}

/// Release of new or revised parts.
#[must_use]
pub fn part_release_definition() -> Definition {
    Definition::new(PART_RELEASE_DEFINITION_ID, "Part Release")
        .with_description("Workflow for releasing new or revised parts")
        .with_entity_types(["part"])
        .with_stage(
            Stage::new("stage-design-review", "Design Review", 10)
                .with_roles(["design_engineer", "engineering_manager"])
                .with_aggregation(Aggregation::All)
                .with_due_days(5)
                .with_instructions("Review part design and specifications"),
        )
        .with_stage(
            Stage::new("stage-release", "Release Approval", 20)
                .with_roles(["document_control"])
                .with_aggregation(Aggregation::Any)
                .with_due_days(2)
                .with_instructions("Final release to production"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_valid() {
        for def in builtin_definitions() {
            assert!(def.issues().is_empty(), "{} has issues: {:?}", def.id, def.issues());
        }
    }

    #[test]
    fn test_builtin_ids_are_distinct() {
        let mut ids: Vec<_> = builtin_definitions().into_iter().map(|d| d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_change_order_stage_order() {
        let def = change_order_definition();
        let mut stage = def.first_stage().unwrap();
        let mut order = vec![stage.id.clone()];
        while let Some(next) = def.next_stage(&stage.id) {
            order.push(next.id.clone());
            stage = next;
        }
        assert_eq!(
            order,
            vec!["stage-submit", "stage-engineering", "stage-quality", "stage-final"]
        );
    }
}

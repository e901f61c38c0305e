//! Benchmarks for the decide path.

use approvalflow::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn majority_definition(approvers: usize) -> Definition {
    let users: Vec<String> = (0..approvers).map(|i| format!("user-{i}")).collect();
    Definition::new("wf-bench", "Bench").with_stage(
        Stage::new("vote", "Vote", 1)
            .with_aggregation(Aggregation::Majority)
            .with_users(users),
    )
}

fn decide_benchmark(c: &mut Criterion) {
    let engine = WorkflowEngine::builder()
        .config(EngineConfig::new().with_load_builtins(false))
        .build()
        .unwrap();
    engine.register_definition(majority_definition(25)).unwrap();

    c.bench_function("start_and_decide_majority_25", |b| {
        b.iter(|| {
            let mut instance = engine
                .start(StartRequest::new("wf-bench", "widget", "w-1", "W-1", "owner"))
                .unwrap();
            while instance.status == InstanceStatus::PendingApproval {
                let task = instance.actionable_tasks().next().unwrap().clone();
                instance = engine
                    .decide(DecideRequest::approve(&instance.id, &task.id, &task.assignee_id))
                    .unwrap();
            }
            black_box(instance)
        });
    });

    c.bench_function("tasks_for_user", |b| {
        b.iter(|| black_box(engine.tasks_for_user("user-3").unwrap().len()));
    });
}

criterion_group!(benches, decide_benchmark);
criterion_main!(benches);

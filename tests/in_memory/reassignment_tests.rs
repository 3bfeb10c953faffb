//! Reassignment moves a task between assignees and their dashboards.

use crate::in_memory::helpers::{Office, actor, office, runtime};
use rstest::rstest;
use std::io;
use taskdesk::task::{
    domain::{ProvinceId, Task, TaskKind},
    ports::AuditAction,
    services::{AssignmentRequest, CreateTaskRequest, ErrorKind},
};
use tokio::runtime::Runtime;

#[rstest]
fn reassigned_task_moves_between_dashboards(runtime: io::Result<Runtime>, office: Office) {
    let rt = runtime.expect("runtime creation");
    let clerk = actor(&office.clerk);
    let task = rt
        .block_on(office.lifecycle.create(
            &clerk,
            CreateTaskRequest::new("Replace the bench slats").with_assignment(
                AssignmentRequest::new().with_users([office.worker.id]),
            ),
        ))
        .expect("task creation should succeed");

    let before = rt
        .block_on(office.queries.dashboard(&actor(&office.worker)))
        .expect("dashboard should load");
    assert_eq!(
        before.assigned_to_me.iter().map(Task::id).collect::<Vec<_>>(),
        vec![task.id()]
    );

    let moved = rt
        .block_on(office.lifecycle.reassign(
            &clerk,
            task.id(),
            AssignmentRequest::new().with_departments([office.parks]),
        ))
        .expect("creator may reassign");
    assert_eq!(moved.kind(), TaskKind::Department);

    let worker_view = rt
        .block_on(office.queries.dashboard(&actor(&office.worker)))
        .expect("dashboard should load");
    assert!(worker_view.assigned_to_me.is_empty());
    let gardener_view = rt
        .block_on(office.queries.dashboard(&actor(&office.gardener)))
        .expect("dashboard should load");
    assert_eq!(
        gardener_view
            .assigned_to_my_departments
            .iter()
            .map(Task::id)
            .collect::<Vec<_>>(),
        vec![task.id()]
    );
    assert_eq!(
        office.audited_actions(task.id()),
        vec![AuditAction::TaskCreated, AuditAction::TaskReassigned]
    );

    let assignees = rt
        .block_on(office.queries.resolve_assignees(task.id()))
        .expect("assignees should resolve");
    let usernames: Vec<&str> = assignees.iter().map(|user| user.username.as_str()).collect();
    assert_eq!(usernames, vec!["gardener"]);
}

#[rstest]
fn reassignment_to_an_unknown_province_is_rejected(runtime: io::Result<Runtime>, office: Office) {
    let rt = runtime.expect("runtime creation");
    let clerk = actor(&office.clerk);
    let task = rt
        .block_on(office.lifecycle.create(&clerk, CreateTaskRequest::new("Order cones")))
        .expect("task creation should succeed");
    let elsewhere = ProvinceId::new();

    let result = rt.block_on(office.lifecycle.reassign(
        &clerk,
        task.id(),
        AssignmentRequest::new()
            .with_departments([office.roads])
            .with_province(elsewhere),
    ));

    assert_eq!(
        result.expect_err("unknown province should fail").kind(),
        ErrorKind::NotFound
    );
    let stored = rt
        .block_on(office.lifecycle.find_task(task.id()))
        .expect("task is still visible");
    assert_eq!(stored.kind(), TaskKind::Personal);
}

//! Recycle bin flows: binning, restoring, and permanent removal.

use std::sync::Arc;

use crate::in_memory::helpers::{Office, actor, office, runtime};
use mockable::DefaultClock;
use rstest::rstest;
use std::io;
use taskdesk::task::{
    domain::{Task, TaskStatus},
    ports::{AuditAction, SortDirection},
    services::{
        AssignmentRequest, CreateTaskRequest, ErrorKind, RecycleBinQuery, RecycleBinService,
        TaskListRequest, TaskPolicy,
    },
};
use tokio::runtime::Runtime;

const REASON: &str = "Raised twice by the front desk";

fn create_for_worker(rt: &Runtime, office: &Office, title: &str) -> Task {
    rt.block_on(office.lifecycle.create(
        &actor(&office.clerk),
        CreateTaskRequest::new(title)
            .with_assignment(AssignmentRequest::new().with_users([office.worker.id])),
    ))
    .expect("task creation should succeed")
}

#[rstest]
fn binned_task_leaves_listings_until_restored(runtime: io::Result<Runtime>, office: Office) {
    let rt = runtime.expect("runtime creation");
    let kept = create_for_worker(&rt, &office, "Sweep the car park");
    let binned = create_for_worker(&rt, &office, "Sweep the car park again");
    let worker = actor(&office.worker);
    let manager = actor(&office.manager);

    rt.block_on(
        office
            .recycle_bin
            .soft_delete(&actor(&office.clerk), binned.id(), REASON),
    )
    .expect("creator may bin the task");

    let listed = rt
        .block_on(office.queries.list_tasks(&worker, TaskListRequest::new()))
        .expect("listing should succeed");
    assert_eq!(
        listed.items.iter().map(Task::id).collect::<Vec<_>>(),
        vec![kept.id()]
    );
    let bin = rt
        .block_on(
            office
                .recycle_bin
                .list_deleted(&manager, RecycleBinQuery::new().with_search("front desk")),
        )
        .expect("leadership may browse the bin");
    assert_eq!(
        bin.items.iter().map(Task::id).collect::<Vec<_>>(),
        vec![binned.id()]
    );
    let hidden = rt.block_on(office.lifecycle.find_task(binned.id()));
    assert_eq!(
        hidden.expect_err("binned tasks are hidden").kind(),
        ErrorKind::NotFound
    );

    let restored = rt
        .block_on(office.recycle_bin.restore(&manager, binned.id()))
        .expect("leadership may restore");
    assert_eq!(restored.status(), TaskStatus::Pending);
    assert!(!restored.is_deleted());
    assert_eq!(restored.deleted_by(), Some(office.clerk.id));

    let relisted = rt
        .block_on(office.queries.list_tasks(
            &worker,
            TaskListRequest::new().with_sort("title", SortDirection::Asc),
        ))
        .expect("listing should succeed");
    assert_eq!(relisted.total, 2);
    assert_eq!(
        office.audited_actions(binned.id()),
        vec![
            AuditAction::TaskCreated,
            AuditAction::TaskSoftDeleted,
            AuditAction::TaskRestored,
        ]
    );
}

#[rstest]
fn hard_delete_keeps_the_audit_trail(runtime: io::Result<Runtime>, office: Office) {
    let rt = runtime.expect("runtime creation");
    let task = create_for_worker(&rt, &office, "Retire the old van");
    let admin = actor(&office.admin);
    rt.block_on(
        office
            .recycle_bin
            .soft_delete(&actor(&office.clerk), task.id(), REASON),
    )
    .expect("creator may bin the task");

    let refused = rt.block_on(
        office
            .recycle_bin
            .hard_delete(&actor(&office.manager), task.id()),
    );
    assert_eq!(
        refused.expect_err("leadership may not purge").kind(),
        ErrorKind::Forbidden
    );

    rt.block_on(office.recycle_bin.hard_delete(&admin, task.id()))
        .expect("admin may purge");
    assert!(office.repository.is_empty().expect("repository length"));
    let bin = rt
        .block_on(office.recycle_bin.list_deleted(&admin, RecycleBinQuery::new()))
        .expect("admin may browse the bin");
    assert_eq!(bin.total, 0);
    assert_eq!(
        office.audited_actions(task.id()).last(),
        Some(&AuditAction::TaskHardDeleted)
    );
}

#[rstest]
fn configured_policy_shortens_the_reason_floor(runtime: io::Result<Runtime>, office: Office) {
    let rt = runtime.expect("runtime creation");
    let task = create_for_worker(&rt, &office, "Count the cones");
    let lenient = RecycleBinService::new(
        Arc::clone(&office.repository),
        Arc::clone(&office.directory),
        Arc::clone(&office.audit),
        Arc::new(DefaultClock),
    )
    .with_policy(TaskPolicy::default().with_min_reason_chars(5));

    let strict = rt.block_on(
        office
            .recycle_bin
            .soft_delete(&actor(&office.clerk), task.id(), "Stale"),
    );
    assert_eq!(
        strict.expect_err("default policy wants twenty characters").kind(),
        ErrorKind::Validation
    );
    let deleted = rt
        .block_on(lenient.soft_delete(&actor(&office.clerk), task.id(), "Stale"))
        .expect("lenient policy accepts five characters");
    assert!(deleted.is_deleted());
}

//! Store, update, lookup, and delete against `PostgreSQL`.

use std::collections::BTreeSet;

use crate::postgres::helpers::{PgContext, personal, pg_context, task_for};
use mockable::DefaultClock;
use rstest::rstest;
use taskdesk::task::{
    domain::{Assignment, DepartmentId, ProvinceId, Reason, TaskPriority, TaskStatus, UserId},
    ports::{TaskRepository, TaskRepositoryError},
};

#[rstest]
fn province_department_assignment_round_trips(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else {
        return;
    };
    let province = ProvinceId::new();
    let departments = BTreeSet::from([DepartmentId::new(), DepartmentId::new()]);
    let task = task_for(
        "Clear the storm drains",
        UserId::new(),
        Assignment::ProvinceDepartments {
            province,
            departments: departments.clone(),
        },
    );

    context
        .runtime
        .block_on(context.repository.store(&task))
        .expect("store should succeed");
    let stored = context
        .runtime
        .block_on(context.repository.find_by_id(task.id()))
        .expect("lookup should succeed")
        .expect("task should exist");

    assert_eq!(stored.title(), "Clear the storm drains");
    assert_eq!(stored.status(), TaskStatus::Pending);
    assert_eq!(
        stored.assignment(),
        &Assignment::ProvinceDepartments {
            province,
            departments
        }
    );
}

#[rstest]
fn users_assignment_round_trips(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else {
        return;
    };
    let users = BTreeSet::from([UserId::new(), UserId::new(), UserId::new()]);
    let task = task_for(
        "Survey the dunes",
        UserId::new(),
        Assignment::Users {
            users: users.clone(),
        },
    );

    context
        .runtime
        .block_on(context.repository.store(&task))
        .expect("store should succeed");
    let stored = context
        .runtime
        .block_on(context.repository.find_by_id(task.id()))
        .expect("lookup should succeed")
        .expect("task should exist");

    assert_eq!(stored.assignment(), &Assignment::Users { users });
}

#[rstest]
fn duplicate_store_is_rejected(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else {
        return;
    };
    let task = personal("Only once", UserId::new());
    context
        .runtime
        .block_on(context.repository.store(&task))
        .expect("first store should succeed");

    let result = context.runtime.block_on(context.repository.store(&task));
    assert!(matches!(result, Err(TaskRepositoryError::DuplicateTask(id)) if id == task.id()));
}

#[rstest]
fn update_persists_soft_delete_and_priority(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else {
        return;
    };
    let owner = UserId::new();
    let mut task = personal("Archive the minutes", owner);
    context
        .runtime
        .block_on(context.repository.store(&task))
        .expect("store should succeed");

    task.change_priority(TaskPriority::High, &DefaultClock)
        .expect("priority change");
    task.soft_delete(
        owner,
        Reason::parse("Minutes were archived twice", "deletion reason", 20)
            .expect("valid reason"),
        &DefaultClock,
    )
    .expect("soft delete");
    context
        .runtime
        .block_on(context.repository.update(&task))
        .expect("update should succeed");

    let stored = context
        .runtime
        .block_on(context.repository.find_by_id(task.id()))
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(stored.priority(), TaskPriority::High);
    assert_eq!(stored.status(), TaskStatus::Deleted);
    assert_eq!(stored.workflow_status(), TaskStatus::Pending);
    assert_eq!(stored.deleted_by(), Some(owner));
    assert_eq!(
        stored.deletion_reason().map(Reason::as_str),
        Some("Minutes were archived twice")
    );
}

#[rstest]
fn delete_removes_the_row_and_its_assignees(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else {
        return;
    };
    let task = task_for(
        "Retire the plotter",
        UserId::new(),
        Assignment::single_user(UserId::new()),
    );
    context
        .runtime
        .block_on(context.repository.store(&task))
        .expect("store should succeed");

    context
        .runtime
        .block_on(context.repository.delete(task.id()))
        .expect("delete should succeed");
    let stored = context
        .runtime
        .block_on(context.repository.find_by_id(task.id()))
        .expect("lookup should succeed");
    assert!(stored.is_none());

    let again = context.runtime.block_on(context.repository.delete(task.id()));
    assert!(matches!(again, Err(TaskRepositoryError::NotFound(_))));
}

//! Transactional delegation commits against `PostgreSQL`.

use crate::postgres::helpers::{PgContext, personal, pg_context};
use mockable::DefaultClock;
use rstest::rstest;
use taskdesk::task::{
    domain::{Task, TaskStatus, UserId},
    ports::{TaskFilter, TaskQuery, TaskRepository, TaskRepositoryError},
};

#[rstest]
fn delegation_commits_original_and_children(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else {
        return;
    };
    let owner = UserId::new();
    let original = personal("Count the benches", owner);
    context
        .runtime
        .block_on(context.repository.store(&original))
        .expect("store should succeed");

    let mut marked = original.clone();
    marked.mark_delegated(&DefaultClock).expect("mark delegated");
    let children: Vec<_> = (0..2)
        .map(|_| {
            original.delegated_child(UserId::new(), owner, Some("Split by ward"), &DefaultClock)
        })
        .collect();
    context
        .runtime
        .block_on(context.repository.store_delegation(&marked, &children))
        .expect("delegation should commit");

    let stored = context
        .runtime
        .block_on(context.repository.find_by_id(original.id()))
        .expect("lookup should succeed")
        .expect("original should exist");
    assert_eq!(stored.status(), TaskStatus::Delegated);

    let listed = context
        .runtime
        .block_on(context.repository.list(&TaskQuery::new(TaskFilter {
            delegated_from: Some(original.id()),
            ..TaskFilter::active()
        })))
        .expect("list should succeed");
    assert_eq!(listed.total, 2);
    assert!(
        listed
            .items
            .iter()
            .all(|child| child.delegation_reason() == Some("Split by ward"))
    );
}

#[rstest]
fn failed_delegation_rolls_back(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else {
        return;
    };
    let owner = UserId::new();
    let original = personal("Repaint the kiosk", owner);
    context
        .runtime
        .block_on(context.repository.store(&original))
        .expect("store should succeed");
    let first = original.delegated_child(UserId::new(), owner, None, &DefaultClock);
    let second = original.delegated_child(UserId::new(), owner, None, &DefaultClock);
    context
        .runtime
        .block_on(context.repository.store(&second))
        .expect("pre-existing child");

    let mut marked = original.clone();
    marked.mark_delegated(&DefaultClock).expect("mark delegated");
    let result = context
        .runtime
        .block_on(context.repository.store_delegation(&marked, &[first.clone(), second]));

    assert!(matches!(result, Err(TaskRepositoryError::DuplicateTask(_))));
    let stored = context
        .runtime
        .block_on(context.repository.find_by_id(original.id()))
        .expect("lookup should succeed")
        .expect("original should exist");
    assert_eq!(stored.status(), TaskStatus::Pending);
    let orphan = context
        .runtime
        .block_on(context.repository.find_by_id(first.id()))
        .expect("lookup should succeed");
    assert!(orphan.is_none());
}

#[rstest]
fn children_outlive_a_removed_parent(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else {
        return;
    };
    let owner = UserId::new();
    let original = personal("Inspect the culverts", owner);
    context
        .runtime
        .block_on(context.repository.store(&original))
        .expect("store should succeed");
    let mut marked = original.clone();
    marked.mark_delegated(&DefaultClock).expect("mark delegated");
    let child = original.delegated_child(UserId::new(), owner, None, &DefaultClock);
    context
        .runtime
        .block_on(
            context
                .repository
                .store_delegation(&marked, std::slice::from_ref(&child)),
        )
        .expect("delegation should commit");

    context
        .runtime
        .block_on(context.repository.delete(original.id()))
        .expect("delete should succeed");

    let listed = context
        .runtime
        .block_on(context.repository.list(&TaskQuery::new(TaskFilter {
            delegated_child: Some(true),
            delegated_by: Some(owner),
            ..TaskFilter::active()
        })))
        .expect("list should succeed");
    let ids: Vec<_> = listed.items.iter().map(Task::id).collect();
    assert_eq!(ids, vec![child.id()]);
    let orphan = listed.items.first().expect("one child");
    assert_eq!(orphan.delegated_from(), None);
}

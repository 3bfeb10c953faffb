//! Then steps for task workflow BDD scenarios.

use super::world::{WorkflowWorld, run_async};
use rstest_bdd_macros::then;
use taskdesk::task::domain::{TaskKind, TaskStatus};

#[then("the operation succeeds")]
fn operation_succeeds(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Ok(())) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("expected success, got {err}")),
        None => Err(eyre::eyre!("missing operation result")),
    }
}

#[then(r#"the operation fails with "{kind}""#)]
fn operation_fails_with(world: &WorkflowWorld, kind: String) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation result"))?;
    let Err(err) = result else {
        return Err(eyre::eyre!("expected a {kind} failure, but the operation succeeded"));
    };
    let actual = format!("{:?}", err.kind());
    if actual != kind {
        return Err(eyre::eyre!("expected a {kind} failure, got {actual}: {err}"));
    }
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &WorkflowWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world
        .stored_task()?
        .ok_or_else(|| eyre::eyre!("task is no longer stored"))?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            task.status().as_str()
        ));
    }
    Ok(())
}

#[then(r#"the task kind is "{kind}""#)]
fn task_kind_is(world: &WorkflowWorld, kind: String) -> Result<(), eyre::Report> {
    let expected = TaskKind::try_from(kind.as_str())
        .map_err(|err| eyre::eyre!("invalid expected kind in scenario: {err}"))?;
    let actual = world.task()?.kind();
    if actual != expected {
        return Err(eyre::eyre!("expected kind {expected}, found {actual}"));
    }
    Ok(())
}

#[then("the task is in the recycle bin")]
fn task_in_recycle_bin(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    let task = world
        .stored_task()?
        .ok_or_else(|| eyre::eyre!("task is no longer stored"))?;
    if !task.is_deleted() || task.deleted_at().is_none() {
        return Err(eyre::eyre!("expected task {} in the recycle bin", task.id()));
    }
    Ok(())
}

#[then("the task is not in the recycle bin")]
fn task_not_in_recycle_bin(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    let task = world
        .stored_task()?
        .ok_or_else(|| eyre::eyre!("task is no longer stored"))?;
    if task.is_deleted() {
        return Err(eyre::eyre!("task {} is still in the recycle bin", task.id()));
    }
    Ok(())
}

#[then("the task no longer exists")]
fn task_no_longer_exists(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    if world.stored_task()?.is_some() {
        return Err(eyre::eyre!("task is still stored"));
    }
    Ok(())
}

#[then("the failure names the unknown user")]
fn failure_names_unknown_user(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    let unknown = world
        .unknown_user
        .ok_or_else(|| eyre::eyre!("missing unknown user in scenario world"))?;
    match world.last_result.as_ref() {
        Some(Err(err)) if err.to_string().contains(&unknown.to_string()) => Ok(()),
        other => Err(eyre::eyre!("expected a failure naming {unknown}, got {other:?}")),
    }
}

fn child_count(world: &WorkflowWorld) -> Result<usize, eyre::Report> {
    let task_id = world.task()?.id();
    let children = run_async(world.delegation.children_of(task_id))
        .map_err(|err| eyre::eyre!("listing children failed: {err}"))?;
    Ok(children.len())
}

#[then("{count:usize} child tasks exist")]
fn child_tasks_exist(world: &WorkflowWorld, count: usize) -> Result<(), eyre::Report> {
    let found = child_count(world)?;
    if found != count {
        return Err(eyre::eyre!("expected {count} child tasks, found {found}"));
    }
    Ok(())
}

#[then("no child tasks exist")]
fn no_child_tasks_exist(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    let found = child_count(world)?;
    if found != 0 {
        return Err(eyre::eyre!("expected no child tasks, found {found}"));
    }
    Ok(())
}

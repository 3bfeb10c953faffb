//! When steps for task workflow BDD scenarios.

use super::world::{WorkflowWorld, run_async};
use rstest_bdd_macros::when;
use taskdesk::task::{
    domain::UserId,
    services::{DelegateTaskRequest, StatusChangeRequest},
};

#[when(r#""{actor}" changes the task status to "{status}""#)]
fn change_status(world: &mut WorkflowWorld, actor: String, status: String) -> Result<(), eyre::Report> {
    let acting = world.actor(&actor)?;
    let task_id = world.task()?.id();
    let result = run_async(
        world
            .lifecycle
            .change_status(&acting, task_id, StatusChangeRequest::new(status)),
    );
    world.record(result);
    Ok(())
}

#[when(r#""{actor}" cancels the task with a reason of {length:usize} characters"#)]
fn cancel_with_reason(
    world: &mut WorkflowWorld,
    actor: String,
    length: usize,
) -> Result<(), eyre::Report> {
    let acting = world.actor(&actor)?;
    let task_id = world.task()?.id();
    let request = StatusChangeRequest::new("cancelled").with_reason("r".repeat(length));
    let result = run_async(world.lifecycle.change_status(&acting, task_id, request));
    world.record(result);
    Ok(())
}

#[when(r#""{actor}" delegates the task to "{first}" and "{second}""#)]
fn delegate_to_two(
    world: &mut WorkflowWorld,
    actor: String,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    let acting = world.actor(&actor)?;
    let assignees = [world.user(&first)?.id, world.user(&second)?.id];
    let task_id = world.task()?.id();
    let result = run_async(
        world
            .delegation
            .delegate(&acting, DelegateTaskRequest::new(task_id, assignees)),
    );
    world.record(result.map(|outcome| outcome.original));
    Ok(())
}

#[when(r#""{actor}" delegates the task to an unknown user and "{user}""#)]
fn delegate_to_unknown(world: &mut WorkflowWorld, actor: String, user: String) -> Result<(), eyre::Report> {
    let acting = world.actor(&actor)?;
    let unknown = UserId::new();
    let assignees = [unknown, world.user(&user)?.id];
    let task_id = world.task()?.id();
    world.unknown_user = Some(unknown);
    let result = run_async(
        world
            .delegation
            .delegate(&acting, DelegateTaskRequest::new(task_id, assignees)),
    );
    world.record(result.map(|outcome| outcome.original));
    Ok(())
}

#[when(r#""{actor}" moves the task to the recycle bin because "{reason}""#)]
fn soft_delete(world: &mut WorkflowWorld, actor: String, reason: String) -> Result<(), eyre::Report> {
    let acting = world.actor(&actor)?;
    let task_id = world.task()?.id();
    let result = run_async(world.recycle_bin.soft_delete(&acting, task_id, &reason));
    world.record(result);
    Ok(())
}

#[when(r#""{actor}" restores the task"#)]
fn restore(world: &mut WorkflowWorld, actor: String) -> Result<(), eyre::Report> {
    let acting = world.actor(&actor)?;
    let task_id = world.task()?.id();
    let result = run_async(world.recycle_bin.restore(&acting, task_id));
    world.record(result);
    Ok(())
}

#[when(r#""{actor}" permanently deletes the task"#)]
fn hard_delete(world: &mut WorkflowWorld, actor: String) -> Result<(), eyre::Report> {
    let acting = world.actor(&actor)?;
    let task_id = world.task()?.id();
    world.last_result = Some(run_async(world.recycle_bin.hard_delete(&acting, task_id)));
    Ok(())
}

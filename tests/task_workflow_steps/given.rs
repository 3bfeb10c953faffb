//! Given steps for task workflow BDD scenarios.

use super::world::{WorkflowWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskdesk::task::{
    domain::{
        Department, DepartmentId, DepartmentMembership, Province, ProvinceId, Role, User, UserId,
    },
    services::{AssignmentRequest, CreateTaskRequest, StatusChangeRequest},
};

fn register(world: &mut WorkflowWorld, user: User) -> Result<(), eyre::Report> {
    world
        .directory
        .insert_user(user.clone())
        .map_err(|err| eyre::eyre!("user insert failed: {err}"))?;
    world.users.insert(user.username.clone(), user);
    Ok(())
}

fn new_user(name: &str, role: Role) -> User {
    User::new(UserId::new(), name, format!("{}@example.org", name.to_lowercase()), role)
}

fn create(
    world: &mut WorkflowWorld,
    actor: &str,
    request: CreateTaskRequest,
) -> Result<(), eyre::Report> {
    let acting = world.actor(actor)?;
    let task = run_async(world.lifecycle.create(&acting, request))
        .wrap_err("create task in scenario setup")?;
    world.task = Some(task);
    Ok(())
}

#[given(r#"province "{name}""#)]
fn province(world: &mut WorkflowWorld, name: String) -> Result<(), eyre::Report> {
    let id = ProvinceId::new();
    world
        .directory
        .insert_province(Province::new(id, name.clone()))
        .map_err(|err| eyre::eyre!("province insert failed: {err}"))?;
    world.provinces.insert(name, id);
    Ok(())
}

#[given(r#"department "{name}" in province "{province}""#)]
fn department_in_province(
    world: &mut WorkflowWorld,
    name: String,
    province: String,
) -> Result<(), eyre::Report> {
    let province_id = world.province(&province)?;
    let department = Department::new(DepartmentId::new(), name.clone()).in_province(province_id);
    world
        .directory
        .insert_department(department.clone())
        .map_err(|err| eyre::eyre!("department insert failed: {err}"))?;
    world.departments.insert(name, department);
    Ok(())
}

#[given(r#"user "{name}" has role "{role}""#)]
fn user_with_role(world: &mut WorkflowWorld, name: String, role: String) -> Result<(), eyre::Report> {
    let parsed = Role::try_from(role.as_str())
        .map_err(|err| eyre::eyre!("invalid role in scenario: {err}"))?;
    register(world, new_user(&name, parsed))
}

#[given(r#"user "{name}" is a member of "{department}""#)]
fn department_member(
    world: &mut WorkflowWorld,
    name: String,
    department: String,
) -> Result<(), eyre::Report> {
    let membership = world.department(&department)?.membership();
    register(world, new_user(&name, Role::User).with_departments([membership]))
}

#[given(r#"user "{name}" is filed in "{department}" under "{province}""#)]
fn misfiled_member(
    world: &mut WorkflowWorld,
    name: String,
    department: String,
    province: String,
) -> Result<(), eyre::Report> {
    let department_id = world.department(&department)?.id;
    let province_id = world.province(&province)?;
    let membership = DepartmentMembership::new(department_id, Some(province_id));
    register(world, new_user(&name, Role::User).with_departments([membership]))
}

#[given(r#""{actor}" created a personal task "{title}""#)]
fn personal_task(world: &mut WorkflowWorld, actor: String, title: String) -> Result<(), eyre::Report> {
    create(world, &actor, CreateTaskRequest::new(title))
}

#[given(r#""{actor}" created a task "{title}" for user "{user}""#)]
fn user_task(
    world: &mut WorkflowWorld,
    actor: String,
    title: String,
    user: String,
) -> Result<(), eyre::Report> {
    let assignee = world.user(&user)?.id;
    let request =
        CreateTaskRequest::new(title).with_assignment(AssignmentRequest::new().with_users([assignee]));
    create(world, &actor, request)
}

#[given(r#""{actor}" created a task "{title}" for department "{department}""#)]
fn department_task(
    world: &mut WorkflowWorld,
    actor: String,
    title: String,
    department: String,
) -> Result<(), eyre::Report> {
    let department_id = world.department(&department)?.id;
    let request = CreateTaskRequest::new(title)
        .with_assignment(AssignmentRequest::new().with_departments([department_id]));
    create(world, &actor, request)
}

#[given(r#""{actor}" created a task "{title}" for province "{province}" department "{department}""#)]
fn province_department_task(
    world: &mut WorkflowWorld,
    actor: String,
    title: String,
    province: String,
    department: String,
) -> Result<(), eyre::Report> {
    let province_id = world.province(&province)?;
    let department_id = world.department(&department)?.id;
    let request = CreateTaskRequest::new(title).with_assignment(
        AssignmentRequest::new()
            .with_departments([department_id])
            .with_province(province_id),
    );
    create(world, &actor, request)
}

#[given(r#""{actor}" changed the task status to "{status}""#)]
fn task_status_changed(
    world: &mut WorkflowWorld,
    actor: String,
    status: String,
) -> Result<(), eyre::Report> {
    let acting = world.actor(&actor)?;
    let task_id = world.task()?.id();
    let task = run_async(
        world
            .lifecycle
            .change_status(&acting, task_id, StatusChangeRequest::new(status)),
    )
    .wrap_err("change task status in scenario setup")?;
    world.task = Some(task);
    Ok(())
}

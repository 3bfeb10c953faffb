//! Shared test helpers for `PostgreSQL` integration tests.

use std::io;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use rstest::fixture;
use taskdesk::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{Assignment, Task, TaskDraft, UserId},
};
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Environment variable naming a server the tests may create databases on.
pub const DATABASE_URL_ENV: &str = "TASKDESK_TEST_DATABASE_URL";

/// SQL to create the task schema.
pub const CREATE_TASKS_SQL: &str =
    include_str!("../../migrations/2026-01-05-000000_create_tasks/up.sql");

/// A throwaway database with the schema applied, dropped on teardown.
pub struct PgContext {
    pub repository: PostgresTaskRepository,
    pub runtime: Runtime,
    admin_url: String,
    db_name: String,
}

impl Drop for PgContext {
    fn drop(&mut self) {
        if let Ok(mut admin) = PgConnection::establish(&self.admin_url) {
            let statement = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.db_name);
            drop(admin.batch_execute(&statement));
        }
    }
}

/// Swaps the database name at the end of a connection URL.
fn with_database(url: &str, db_name: &str) -> String {
    let (location, query) = url.split_once('?').map_or((url, None), |(head, tail)| (head, Some(tail)));
    let base = location.rsplit_once('/').map_or(location, |(server, _)| server);
    match query {
        Some(params) => format!("{base}/{db_name}?{params}"),
        None => format!("{base}/{db_name}"),
    }
}

fn test_runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Provides a migrated database, or `None` when no server is configured.
#[fixture]
pub fn pg_context() -> Option<PgContext> {
    let admin_url = std::env::var(DATABASE_URL_ENV).ok()?;
    let db_name = format!("taskdesk_test_{}", Uuid::new_v4().simple());
    let mut admin = PgConnection::establish(&admin_url).expect("connect to test server");
    admin
        .batch_execute(&format!("CREATE DATABASE \"{db_name}\""))
        .expect("create test database");

    let url = with_database(&admin_url, &db_name);
    let mut connection = PgConnection::establish(&url).expect("connect to test database");
    connection
        .batch_execute(CREATE_TASKS_SQL)
        .expect("apply task schema");

    let pool = Pool::builder()
        .max_size(2)
        .build(ConnectionManager::<PgConnection>::new(url))
        .expect("connection pool");
    Some(PgContext {
        repository: PostgresTaskRepository::new(pool),
        runtime: test_runtime().expect("tokio runtime"),
        admin_url,
        db_name,
    })
}

/// Builds an unsaved task with the given assignment.
pub fn task_for(title: &str, created_by: UserId, assignment: Assignment) -> Task {
    Task::new(TaskDraft::new(title), created_by, assignment, &DefaultClock).expect("valid task")
}

/// Builds an unsaved personal task.
pub fn personal(title: &str, owner: UserId) -> Task {
    task_for(title, owner, Assignment::Personal { owner })
}

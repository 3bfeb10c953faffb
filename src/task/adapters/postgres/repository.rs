//! `PostgreSQL` repository implementation for task storage and querying.

use super::{
    models::{DepartmentAssigneeRow, NewTaskRow, TaskRow, UserAssigneeRow},
    schema::{task_department_assignees, task_user_assignees, tasks},
};
use crate::task::{
    domain::{
        Assignment, Cancellation, DepartmentId, PersistedTaskData, ProvinceId, Reason, Task,
        TaskId, TaskKind, TaskPriority, TaskStatus, UserId,
    },
    ports::{
        DeletionScope, SortDirection, SortField, TaskFilter, TaskPage, TaskQuery, TaskRepository,
        TaskRepositoryError, TaskRepositoryResult, TaskSort,
    },
};
use async_trait::async_trait;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::dsl::sql;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Integer;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

type BoxedTasks = tasks::BoxedQuery<'static, Pg>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }

    async fn run_transaction<F>(&self, f: F) -> TaskRepositoryResult<()>
    where
        F: FnOnce(&mut PgConnection) -> Result<(), TransactionError> + Send + 'static,
    {
        self.run_blocking(move |connection| {
            connection
                .transaction(f)
                .map_err(TransactionError::into_repository_error)
        })
        .await
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let record = TaskRecord::from_task(task);
        self.run_transaction(move |connection| record.insert(connection))
            .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let record = TaskRecord::from_task(task);
        self.run_transaction(move |connection| record.replace(connection))
            .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            let Some(found) = row else {
                return Ok(None);
            };
            let mut loaded = hydrate(connection, vec![found])?;
            Ok(loaded.pop())
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(tasks::table.find(id.into_inner()))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if removed == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn store_delegation(
        &self,
        original: &Task,
        children: &[Task],
    ) -> TaskRepositoryResult<()> {
        let parent = TaskRecord::from_task(original);
        let child_records: Vec<TaskRecord> = children.iter().map(TaskRecord::from_task).collect();
        self.run_transaction(move |connection| {
            parent.replace(connection)?;
            for child in &child_records {
                child.insert(connection)?;
            }
            Ok(())
        })
        .await
    }

    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<TaskPage> {
        let request = query.clone();
        self.run_blocking(move |connection| {
            let counted = filtered(&request.filter)
                .count()
                .get_result::<i64>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            let total = u64::try_from(counted).map_err(TaskRepositoryError::persistence)?;

            let mut rows_query = ordered(filtered(&request.filter), request.sort);
            if let Some(page) = request.page {
                let offset = i64::try_from(page.offset()).map_err(TaskRepositoryError::persistence)?;
                rows_query = rows_query
                    .offset(offset)
                    .limit(i64::from(page.per_page));
            }
            let rows = rows_query
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            let items = hydrate(connection, rows)?;

            let (page, per_page) = request.page.map_or_else(
                || (1, u32::try_from(total).unwrap_or(u32::MAX)),
                |page| (page.page, page.per_page),
            );
            Ok(TaskPage {
                items,
                total,
                page,
                per_page,
            })
        })
        .await
    }
}

/// Errors raised inside a write transaction.
#[derive(Debug)]
enum TransactionError {
    Repository(TaskRepositoryError),
    Database(DieselError),
}

impl From<DieselError> for TransactionError {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

impl TransactionError {
    fn into_repository_error(self) -> TaskRepositoryError {
        match self {
            Self::Repository(err) => err,
            Self::Database(err) => TaskRepositoryError::persistence(err),
        }
    }
}

/// A task row together with its assignee rows.
#[derive(Debug, Clone)]
struct TaskRecord {
    row: NewTaskRow,
    users: Vec<UserAssigneeRow>,
    departments: Vec<DepartmentAssigneeRow>,
}

impl TaskRecord {
    fn from_task(task: &Task) -> Self {
        let task_id = task.id().into_inner();
        let assignment = task.assignment();
        Self {
            row: to_new_row(task),
            users: assignment
                .user_ids()
                .into_iter()
                .map(|user| UserAssigneeRow {
                    task_id,
                    user_id: user.into_inner(),
                })
                .collect(),
            departments: assignment
                .department_ids()
                .map(|department| DepartmentAssigneeRow {
                    task_id,
                    department_id: department.into_inner(),
                })
                .collect(),
        }
    }

    fn insert(&self, connection: &mut PgConnection) -> Result<(), TransactionError> {
        diesel::insert_into(tasks::table)
            .values(&self.row)
            .execute(connection)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    TransactionError::Repository(TaskRepositoryError::DuplicateTask(
                        TaskId::from_uuid(self.row.id),
                    ))
                }
                other => TransactionError::Database(other),
            })?;
        self.insert_assignees(connection)
    }

    fn replace(&self, connection: &mut PgConnection) -> Result<(), TransactionError> {
        let updated = diesel::update(tasks::table.find(self.row.id))
            .set(&self.row)
            .execute(connection)?;
        if updated == 0 {
            return Err(TransactionError::Repository(TaskRepositoryError::NotFound(
                TaskId::from_uuid(self.row.id),
            )));
        }
        diesel::delete(
            task_user_assignees::table.filter(task_user_assignees::task_id.eq(self.row.id)),
        )
        .execute(connection)?;
        diesel::delete(
            task_department_assignees::table
                .filter(task_department_assignees::task_id.eq(self.row.id)),
        )
        .execute(connection)?;
        self.insert_assignees(connection)
    }

    fn insert_assignees(&self, connection: &mut PgConnection) -> Result<(), TransactionError> {
        if !self.users.is_empty() {
            diesel::insert_into(task_user_assignees::table)
                .values(self.users.as_slice())
                .execute(connection)?;
        }
        if !self.departments.is_empty() {
            diesel::insert_into(task_department_assignees::table)
                .values(self.departments.as_slice())
                .execute(connection)?;
        }
        Ok(())
    }
}

/// Translates a filter into a boxed `tasks` query.
fn filtered(filter: &TaskFilter) -> BoxedTasks {
    let query = match filter.deletion {
        DeletionScope::Active => tasks::table.into_boxed().filter(tasks::deleted_at.is_null()),
        DeletionScope::RecycleBin => tasks::table
            .into_boxed()
            .filter(tasks::deleted_at.is_not_null()),
    };
    let with_lifecycle = filter_lifecycle(query, filter);
    let with_ownership = filter_ownership(with_lifecycle, filter);
    let with_delegation = filter_delegation(with_ownership, filter);
    filter_text(with_delegation, filter)
}

fn filter_lifecycle(mut query: BoxedTasks, filter: &TaskFilter) -> BoxedTasks {
    if !filter.statuses.is_empty() {
        let statuses: Vec<String> = filter
            .statuses
            .iter()
            .map(|status| status.as_str().to_owned())
            .collect();
        query = query.filter(tasks::status.eq_any(statuses));
    }
    if let Some(priority) = filter.priority {
        query = query.filter(tasks::priority.eq(priority.as_str()));
    }
    if let Some(from) = filter.due.from {
        query = query.filter(tasks::due_date.ge(from));
    }
    if let Some(to) = filter.due.to {
        query = query.filter(tasks::due_date.le(to));
    }
    if let Some(from) = filter.deleted.from {
        query = query.filter(tasks::deleted_at.ge(from));
    }
    if let Some(to) = filter.deleted.to {
        query = query.filter(tasks::deleted_at.le(to));
    }
    if let Some(user) = filter.deleted_by {
        query = query.filter(tasks::deleted_by.eq(user.into_inner()));
    }
    query
}

fn filter_ownership(mut query: BoxedTasks, filter: &TaskFilter) -> BoxedTasks {
    if let Some(user) = filter.created_by {
        query = query.filter(tasks::created_by.eq(user.into_inner()));
    }
    if !filter.kinds.is_empty() {
        let kinds: Vec<String> = filter
            .kinds
            .iter()
            .map(|kind| kind.as_str().to_owned())
            .collect();
        query = query.filter(tasks::kind.eq_any(kinds));
    }
    if let Some(user) = filter.assigned_user {
        query = query.filter(
            tasks::id.eq_any(
                task_user_assignees::table
                    .filter(task_user_assignees::user_id.eq(user.into_inner()))
                    .select(task_user_assignees::task_id),
            ),
        );
    }
    if !filter.assigned_departments.is_empty() {
        query = query.filter(
            tasks::id.eq_any(
                task_department_assignees::table
                    .filter(
                        task_department_assignees::department_id
                            .eq_any(uuids(&filter.assigned_departments)),
                    )
                    .select(task_department_assignees::task_id),
            ),
        );
    }
    if let Some(scope) = &filter.province {
        query = query.filter(
            tasks::province_id.eq(scope.province.into_inner()).or(tasks::id.eq_any(
                task_department_assignees::table
                    .filter(
                        task_department_assignees::department_id.eq_any(uuids(&scope.departments)),
                    )
                    .select(task_department_assignees::task_id),
            )),
        );
    }
    if let Some(scope) = &filter.visible_to {
        let viewer = scope.user.into_inner();
        query = query.filter(
            tasks::created_by
                .eq(viewer)
                .or(tasks::id.eq_any(
                    task_user_assignees::table
                        .filter(task_user_assignees::user_id.eq(viewer))
                        .select(task_user_assignees::task_id),
                ))
                .or(tasks::id.eq_any(
                    task_department_assignees::table
                        .filter(
                            task_department_assignees::department_id
                                .eq_any(uuids(&scope.departments)),
                        )
                        .select(task_department_assignees::task_id),
                )),
        );
    }
    query
}

fn filter_delegation(mut query: BoxedTasks, filter: &TaskFilter) -> BoxedTasks {
    if let Some(user) = filter.delegated_by {
        query = query.filter(tasks::delegated_by.eq(user.into_inner()));
    }
    if let Some(flag) = filter.is_delegated {
        query = query.filter(tasks::is_delegated.eq(flag));
    }
    if let Some(parent) = filter.delegated_from {
        query = query.filter(tasks::delegated_from.eq(parent.into_inner()));
    }
    match filter.delegated_child {
        Some(true) => query.filter(tasks::delegated_by.is_not_null()),
        Some(false) => query.filter(tasks::delegated_by.is_null()),
        None => query,
    }
}

fn filter_text(query: BoxedTasks, filter: &TaskFilter) -> BoxedTasks {
    let Some(text) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        return query;
    };
    let pattern = format!("%{}%", escape_like(text));
    let details = tasks::title
        .ilike(pattern.clone())
        .or(tasks::description.ilike(pattern.clone()));
    match filter.deletion {
        DeletionScope::Active => query.filter(details),
        DeletionScope::RecycleBin => {
            query.filter(details.or(tasks::deletion_reason.ilike(pattern)))
        }
    }
}

/// Escapes `LIKE` metacharacters so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

fn uuids(departments: &[DepartmentId]) -> Vec<Uuid> {
    departments
        .iter()
        .map(|department| department.into_inner())
        .collect()
}

/// Orders priorities by urgency instead of spelling.
const PRIORITY_RANK: &str =
    "CASE tasks.priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END";

macro_rules! order_by_column {
    ($query:expr, $column:expr, $direction:expr) => {
        match $direction {
            SortDirection::Asc => $query
                .order_by($column.asc().nulls_first())
                .then_order_by(tasks::id.asc()),
            SortDirection::Desc => $query
                .order_by($column.desc().nulls_last())
                .then_order_by(tasks::id.desc()),
        }
    };
}

/// Applies the sort, breaking ties by task id.
fn ordered(query: BoxedTasks, sort: TaskSort) -> BoxedTasks {
    match sort.field {
        SortField::CreatedAt => order_by_column!(query, tasks::created_at, sort.direction),
        SortField::UpdatedAt => order_by_column!(query, tasks::updated_at, sort.direction),
        SortField::DueDate => order_by_column!(query, tasks::due_date, sort.direction),
        SortField::Title => order_by_column!(query, tasks::title, sort.direction),
        SortField::Priority => {
            order_by_column!(query, sql::<Integer>(PRIORITY_RANK), sort.direction)
        }
        SortField::Status => order_by_column!(query, tasks::status, sort.direction),
        SortField::DeletedAt => order_by_column!(query, tasks::deleted_at, sort.direction),
    }
}

/// Loads assignee rows for a batch of task rows and builds the aggregates,
/// preserving row order.
fn hydrate(connection: &mut PgConnection, rows: Vec<TaskRow>) -> TaskRepositoryResult<Vec<Task>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

    let user_rows = task_user_assignees::table
        .filter(task_user_assignees::task_id.eq_any(ids.as_slice()))
        .select(UserAssigneeRow::as_select())
        .load::<UserAssigneeRow>(connection)
        .map_err(TaskRepositoryError::persistence)?;
    let department_rows = task_department_assignees::table
        .filter(task_department_assignees::task_id.eq_any(ids.as_slice()))
        .select(DepartmentAssigneeRow::as_select())
        .load::<DepartmentAssigneeRow>(connection)
        .map_err(TaskRepositoryError::persistence)?;

    let mut users: HashMap<Uuid, BTreeSet<UserId>> = HashMap::new();
    for assignee in user_rows {
        users
            .entry(assignee.task_id)
            .or_default()
            .insert(UserId::from_uuid(assignee.user_id));
    }
    let mut departments: HashMap<Uuid, BTreeSet<DepartmentId>> = HashMap::new();
    for assignee in department_rows {
        departments
            .entry(assignee.task_id)
            .or_default()
            .insert(DepartmentId::from_uuid(assignee.department_id));
    }

    rows.into_iter()
        .map(|row| {
            let task_users = users.remove(&row.id).unwrap_or_default();
            let task_departments = departments.remove(&row.id).unwrap_or_default();
            row_to_task(row, task_users, task_departments)
        })
        .collect()
}

/// A cancelled row is missing part of its cancellation record.
#[derive(Debug, Error)]
#[error("task {0} has an incomplete cancellation record")]
struct IncompleteCancellation(Uuid);

fn to_new_row(task: &Task) -> NewTaskRow {
    let cancellation = task.cancellation();
    NewTaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().map(ToOwned::to_owned),
        due_date: task.due_date(),
        status: task.workflow_status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        kind: task.kind().as_str().to_owned(),
        province_id: task.assignment().province_id().map(ProvinceId::into_inner),
        created_by: task.created_by().into_inner(),
        is_delegated: task.is_delegated(),
        delegated_by: task.delegated_by().map(UserId::into_inner),
        delegated_from: task.delegated_from().map(TaskId::into_inner),
        delegation_reason: task.delegation_reason().map(ToOwned::to_owned),
        completed_at: task.completed_at(),
        cancelled_at: cancellation.map(|record| record.at),
        cancelled_by: cancellation.map(|record| record.by.into_inner()),
        cancellation_reason: cancellation.map(|record| record.reason.as_str().to_owned()),
        deleted_at: task.deleted_at(),
        deleted_by: task.deleted_by().map(UserId::into_inner),
        deletion_reason: task
            .deletion_reason()
            .map(|reason| reason.as_str().to_owned()),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(
    row: TaskRow,
    users: BTreeSet<UserId>,
    departments: BTreeSet<DepartmentId>,
) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        due_date,
        status,
        priority,
        kind,
        province_id,
        created_by,
        is_delegated,
        delegated_by,
        delegated_from,
        delegation_reason,
        completed_at,
        cancelled_at,
        cancelled_by,
        cancellation_reason,
        deleted_at,
        deleted_by,
        deletion_reason,
        created_at,
        updated_at,
    } = row;

    let task_kind = TaskKind::try_from(kind.as_str()).map_err(TaskRepositoryError::persistence)?;
    let assignment = Assignment::from_parts(
        task_kind,
        users,
        departments,
        province_id.map(ProvinceId::from_uuid),
    )
    .map_err(TaskRepositoryError::persistence)?;
    let cancellation = match (cancelled_at, cancelled_by, cancellation_reason) {
        (Some(at), Some(by), Some(reason)) => Some(Cancellation {
            at,
            by: UserId::from_uuid(by),
            reason: Reason::from_persisted(reason),
        }),
        (None, None, None) => None,
        _ => {
            return Err(TaskRepositoryError::persistence(IncompleteCancellation(id)));
        }
    };

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        title,
        description,
        due_date,
        status: TaskStatus::try_from(status.as_str()).map_err(TaskRepositoryError::persistence)?,
        priority: TaskPriority::try_from(priority.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        assignment,
        created_by: UserId::from_uuid(created_by),
        is_delegated,
        delegated_by: delegated_by.map(UserId::from_uuid),
        delegated_from: delegated_from.map(TaskId::from_uuid),
        delegation_reason,
        completed_at,
        cancellation,
        deleted_at,
        deleted_by: deleted_by.map(UserId::from_uuid),
        deletion_reason: deletion_reason.map(Reason::from_persisted),
        created_at,
        updated_at,
    };
    Ok(Task::from_persisted(data))
}

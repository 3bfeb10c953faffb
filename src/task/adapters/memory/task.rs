//! In-memory repository for tasks.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Task, TaskId},
    ports::{TaskPage, TaskQuery, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Each operation holds one lock for its whole duration, which makes the
/// delegation commit atomic with respect to other callers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tasks, including the recycle bin.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn len(&self) -> TaskRepositoryResult<usize> {
        Ok(self.read()?.tasks.len())
    }

    /// Returns `true` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn is_empty(&self) -> TaskRepositoryResult<bool> {
        Ok(self.read()?.tasks.is_empty())
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Slices one page out of the sorted matches.
fn paginate(matches: Vec<Task>, query: &TaskQuery) -> TaskPage {
    let total = u64::try_from(matches.len()).unwrap_or(u64::MAX);
    let Some(page) = query.page else {
        return TaskPage {
            per_page: u32::try_from(matches.len()).unwrap_or(u32::MAX),
            items: matches,
            total,
            page: 1,
        };
    };
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(page.per_page).unwrap_or(usize::MAX);
    TaskPage {
        items: matches.into_iter().skip(skip).take(take).collect(),
        total,
        page: page.page,
        per_page: page.per_page,
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let slot = state
            .tasks
            .get_mut(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        *slot = task.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .tasks
            .remove(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        // Mirrors `ON DELETE SET NULL` on the parent link.
        state
            .tasks
            .values_mut()
            .filter(|task| task.delegated_from() == Some(id))
            .for_each(Task::detach_from_parent);
        Ok(())
    }

    async fn store_delegation(
        &self,
        original: &Task,
        children: &[Task],
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&original.id()) {
            return Err(TaskRepositoryError::NotFound(original.id()));
        }
        if let Some(taken) = children
            .iter()
            .find(|child| state.tasks.contains_key(&child.id()))
        {
            return Err(TaskRepositoryError::DuplicateTask(taken.id()));
        }
        state.tasks.insert(original.id(), original.clone());
        for child in children {
            state.tasks.insert(child.id(), child.clone());
        }
        Ok(())
    }

    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<TaskPage> {
        let mut matches: Vec<Task> = {
            let state = self.read()?;
            state
                .tasks
                .values()
                .filter(|task| query.filter.matches(task))
                .cloned()
                .collect()
        };
        matches.sort_by(|left, right| query.sort.compare(left, right));
        Ok(paginate(matches, query))
    }
}

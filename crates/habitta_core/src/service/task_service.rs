//! Task use-case service.

use super::error::{require_found, ServiceError, ServiceResult};
use crate::model::day::CalendarDay;
use crate::model::item::EntityKind;
use crate::model::task::{Task, TaskId};
use crate::model::user::UserId;
use crate::repo::task_repo::{TaskFilter, TaskListQuery, TaskRepository};
use log::info;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: u32,
    pub completed: u32,
    pub pending: u32,
    /// Pending tasks due on `as_of`.
    pub due_today: u32,
    /// Pending tasks due before `as_of`.
    pub overdue: u32,
    /// `completed / total` in `0.0..=1.0`; zero without tasks.
    pub completion_rate: f64,
}

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_task(&self, task: &Task) -> ServiceResult<Task> {
        let id = self.repo.create_task(task)?;
        info!(
            "event=task_create module=service status=ok priority={}",
            task.priority.as_str()
        );
        self.repo
            .get_task(id)?
            .ok_or(ServiceError::InconsistentState(
                "created task not found in read-back",
            ))
    }

    /// Rewrites a task. Toggling `is_completed` stamps or clears
    /// `completed_on` with `as_of`; no XP is awarded here.
    pub fn update_task(&self, task: &Task, as_of: CalendarDay) -> ServiceResult<Task> {
        let stored = self.get_task(task.id)?;
        if stored.user_id != task.user_id {
            return Err(ServiceError::OwnershipMismatch {
                kind: EntityKind::Task,
                id: task.id,
            });
        }

        let mut next = task.clone();
        next.is_completed = stored.is_completed;
        next.completed_on = stored.completed_on;
        next.set_completed(task.is_completed, as_of);

        self.repo.update_task(&next)?;
        Ok(next)
    }

    pub fn get_task(&self, id: TaskId) -> ServiceResult<Task> {
        require_found(self.repo.get_task(id)?, EntityKind::Task, id)
    }

    pub fn list_tasks(&self, user_id: UserId, filter: TaskFilter) -> ServiceResult<Vec<Task>> {
        Ok(self.repo.list_tasks(&TaskListQuery { user_id, filter })?)
    }

    pub fn delete_task(&self, id: TaskId) -> ServiceResult<()> {
        self.repo.delete_task(id)?;
        info!("event=task_delete module=service status=ok");
        Ok(())
    }

    pub fn stats(&self, user_id: UserId, as_of: CalendarDay) -> ServiceResult<TaskStats> {
        let tasks = self.list_tasks(user_id, TaskFilter::All)?;

        let total = tasks.len() as u32;
        let completed = tasks.iter().filter(|task| task.is_completed).count() as u32;
        let completion_rate = if total == 0 {
            0.0
        } else {
            f64::from(completed) / f64::from(total)
        };

        Ok(TaskStats {
            total,
            completed,
            pending: total - completed,
            due_today: tasks.iter().filter(|task| task.is_due_on(as_of)).count() as u32,
            overdue: tasks.iter().filter(|task| task.is_overdue(as_of)).count() as u32,
            completion_rate,
        })
    }
}

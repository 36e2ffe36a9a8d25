use std::cell::RefCell;

use anyhow::Context;
use chrono_tz::Tz;
use starlist_shared::{
  Task,
  UpdateTaskRequest
};
use tracing::{
  debug,
  error,
  info
};

use crate::datetime::from_local_input_value;
use crate::rpc::TodoRpc;
use crate::store::TaskStore;
use crate::views::TaskViews;

/// User-facing task operations.
///
/// Every mutation is one RPC followed
/// by a full reload; nothing is applied
/// optimistically, so a failed call
/// leaves the last good snapshot in
/// place. Methods take `&self` and the
/// store borrow never spans an await,
/// so callers can share the service
/// between concurrent handlers.
pub struct TaskService<R> {
  rpc:   R,
  store: RefCell<TaskStore>
}

impl<R: TodoRpc> TaskService<R> {
  pub fn new(rpc: R) -> Self {
    Self {
      rpc,
      store: RefCell::new(
        TaskStore::new()
      )
    }
  }

  pub fn rpc(&self) -> &R {
    &self.rpc
  }

  pub fn snapshot(&self) -> Vec<Task> {
    self.store.borrow().tasks().to_vec()
  }

  pub fn views(&self) -> TaskViews {
    self.store.borrow().views()
  }

  pub fn is_loaded(&self) -> bool {
    self.store.borrow().is_loaded()
  }

  pub fn resolve(
    &self,
    id_or_prefix: &str
  ) -> anyhow::Result<Task> {
    self
      .store
      .borrow()
      .resolve(id_or_prefix)
      .cloned()
  }

  /// Replaces the snapshot with the
  /// backend's list and returns the
  /// newest snapshot held.
  #[tracing::instrument(skip(self))]
  pub async fn list(
    &self
  ) -> anyhow::Result<Vec<Task>> {
    let ticket =
      self.store.borrow_mut().begin_reload();

    let tasks = match self
      .rpc
      .get_tasks()
      .await
    {
      | Ok(tasks) => tasks,
      | Err(err) => {
        error!(
          error = %err,
          "failed to load tasks"
        );
        return Err(err.context(
          "failed to load tasks"
        ));
      }
    };

    self
      .store
      .borrow_mut()
      .apply(ticket, tasks);
    Ok(self.snapshot())
  }

  /// Adds a task. Blank text is
  /// rejected locally and yields
  /// `Ok(None)` without any request.
  #[tracing::instrument(
    skip(self, text),
    fields(text_len = text.len())
  )]
  pub async fn add(
    &self,
    text: &str
  ) -> anyhow::Result<Option<Task>> {
    if text.trim().is_empty() {
      debug!(
        "ignoring blank task text"
      );
      return Ok(None);
    }

    let task = self
      .rpc
      .add_task(text)
      .await
      .inspect_err(|err| {
        error!(
          error = %err,
          "add task failed"
        );
      })
      .context("failed to add task")?;
    info!(task_id = %task.id, "task added");

    self.list().await?;
    Ok(Some(task))
  }

  #[tracing::instrument(
    skip(self, request),
    fields(task_id = %request.id)
  )]
  pub async fn update(
    &self,
    request: UpdateTaskRequest
  ) -> anyhow::Result<Task> {
    let task = self
      .rpc
      .update_task(&request)
      .await
      .inspect_err(|err| {
        error!(
          error = %err,
          "update task failed"
        );
      })
      .with_context(|| {
        format!(
          "failed to update task {}",
          request.id
        )
      })?;
    debug!(
      completed = ?request.completed,
      favorite = ?request.favorite,
      due_at = ?request.due_at,
      "task updated"
    );

    self.list().await?;
    Ok(task)
  }

  #[tracing::instrument(skip(self))]
  pub async fn delete(
    &self,
    id: &str
  ) -> anyhow::Result<()> {
    self
      .rpc
      .delete_task(id)
      .await
      .inspect_err(|err| {
        error!(
          error = %err,
          "delete task failed"
        );
      })
      .with_context(|| {
        format!(
          "failed to delete task {id}"
        )
      })?;
    info!(task_id = %id, "task deleted");

    self.list().await?;
    Ok(())
  }

  pub async fn toggle_completed(
    &self,
    task: &Task
  ) -> anyhow::Result<Task> {
    self
      .update(
        UpdateTaskRequest::new(
          task.id.clone()
        )
        .completed(!task.completed)
      )
      .await
  }

  pub async fn toggle_favorite(
    &self,
    task: &Task
  ) -> anyhow::Result<Task> {
    self
      .update(
        UpdateTaskRequest::new(
          task.id.clone()
        )
        .favorite(!task.favorite)
      )
      .await
  }

  /// Sets the due date from a local
  /// edit-field value; an empty value
  /// clears it.
  pub async fn set_due(
    &self,
    task: &Task,
    local_value: &str,
    timezone: Tz
  ) -> anyhow::Result<Task> {
    let due_at = from_local_input_value(
      local_value,
      timezone
    )?;
    self
      .update(
        UpdateTaskRequest::new(
          task.id.clone()
        )
        .due_at(due_at)
      )
      .await
  }

  pub async fn clear_due(
    &self,
    task: &Task
  ) -> anyhow::Result<Task> {
    self
      .update(
        UpdateTaskRequest::new(
          task.id.clone()
        )
        .clear_due_at()
      )
      .await
  }
}

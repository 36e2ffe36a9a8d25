use anyhow::{
  anyhow,
  bail
};
use starlist_shared::Task;

use crate::views::{
  TaskViews,
  derive_views
};

/// Sequence stamp handed out when a
/// reload is issued.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
)]
pub struct ReloadTicket(u64);

impl ReloadTicket {
  pub fn seq(self) -> u64 {
    self.0
  }
}

/// Last task list fetched from the
/// backend.
///
/// The snapshot is only ever replaced
/// as a whole. A response is applied
/// only if it belongs to a reload
/// issued after the one currently
/// shown, so a slow response can not
/// roll the list back.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
  tasks:   Vec<Task>,
  issued:  u64,
  applied: u64
}

impl TaskStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn begin_reload(
    &mut self
  ) -> ReloadTicket {
    self.issued =
      self.issued.saturating_add(1);
    ReloadTicket(self.issued)
  }

  /// Returns `false` when the response
  /// is stale and was discarded.
  pub fn apply(
    &mut self,
    ticket: ReloadTicket,
    tasks: Vec<Task>
  ) -> bool {
    if ticket.0 <= self.applied {
      tracing::debug!(
        ticket = ticket.0,
        applied = self.applied,
        "discarding stale task list"
      );
      return false;
    }

    tracing::debug!(
      ticket = ticket.0,
      count = tasks.len(),
      "applied task list"
    );
    self.applied = ticket.0;
    self.tasks = tasks;
    true
  }

  pub fn is_loaded(&self) -> bool {
    self.applied > 0
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn views(&self) -> TaskViews {
    derive_views(&self.tasks)
  }

  pub fn find(
    &self,
    id: &str
  ) -> Option<&Task> {
    self
      .tasks
      .iter()
      .find(|task| task.id == id)
  }

  /// Looks a task up by its full id or
  /// a unique id prefix.
  pub fn resolve(
    &self,
    id_or_prefix: &str
  ) -> anyhow::Result<&Task> {
    let needle = id_or_prefix.trim();
    if needle.is_empty() {
      bail!("task id cannot be empty");
    }

    if let Some(task) = self.find(needle)
    {
      return Ok(task);
    }

    let mut matches = self
      .tasks
      .iter()
      .filter(|task| {
        task.id.starts_with(needle)
      });
    let first =
      matches.next().ok_or_else(|| {
        anyhow!(
          "no task matches id {needle}"
        )
      })?;
    if matches.next().is_some() {
      bail!(
        "task id {needle} is ambiguous"
      );
    }
    Ok(first)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn task(id: &str) -> Task {
    Task {
      id: id.to_string(),
      text: id.to_string(),
      ..Task::default()
    }
  }

  #[test]
  fn later_reload_wins_over_earlier_one() {
    let mut store = TaskStore::new();
    let first = store.begin_reload();
    let second = store.begin_reload();

    assert!(
      store.apply(second, vec![
        task("new")
      ])
    );
    assert!(
      !store.apply(first, vec![task(
        "old"
      )])
    );
    assert_eq!(store.tasks()[0].id, "new");
  }

  #[test]
  fn in_order_reloads_all_apply() {
    let mut store = TaskStore::new();
    assert!(!store.is_loaded());

    let first = store.begin_reload();
    assert!(
      store.apply(first, vec![task("a")])
    );
    let second = store.begin_reload();
    assert!(store.apply(second, vec![]));

    assert!(store.is_loaded());
    assert!(store.tasks().is_empty());
  }

  #[test]
  fn resolve_accepts_unique_prefix() {
    let mut store = TaskStore::new();
    let ticket = store.begin_reload();
    store.apply(ticket, vec![
      task("3f2a-0001"),
      task("3f2a-0002"),
      task("9c01-0003"),
    ]);

    assert_eq!(
      store
        .resolve("9c")
        .expect("unique prefix")
        .id,
      "9c01-0003"
    );
    assert_eq!(
      store
        .resolve("3f2a-0002")
        .expect("full id")
        .id,
      "3f2a-0002"
    );
    assert!(store.resolve("3f2a").is_err());
    assert!(store.resolve("ffff").is_err());
    assert!(store.resolve(" ").is_err());
  }
}

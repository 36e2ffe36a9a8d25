use starlist_shared::Task;

/// Display section a task is listed
/// under. Derived from
/// `(completed, favorite)` on every
/// render; never stored.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
)]
pub enum Bucket {
  Favorites,
  Unfinished,
  Finished
}

impl Bucket {
  pub const ALL: [Bucket; 3] = [
    Bucket::Favorites,
    Bucket::Unfinished,
    Bucket::Finished
  ];

  pub fn title(self) -> &'static str {
    match self {
      | Self::Favorites => "Favorites",
      | Self::Unfinished => "Unfinished",
      | Self::Finished => "Finished"
    }
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Favorites => "favorites",
      | Self::Unfinished => "unfinished",
      | Self::Finished => "finished"
    }
  }

  /// Unfinished work is always shown.
  pub fn collapsible(self) -> bool {
    !matches!(self, Self::Unfinished)
  }
}

pub fn bucket_of(task: &Task) -> Bucket {
  if task.favorite {
    Bucket::Favorites
  } else if task.completed {
    Bucket::Finished
  } else {
    Bucket::Unfinished
  }
}

#[derive(
  Debug, Clone, Default, PartialEq,
)]
pub struct TaskViews {
  pub favorites:  Vec<Task>,
  pub unfinished: Vec<Task>,
  pub finished:   Vec<Task>
}

impl TaskViews {
  pub fn section(
    &self,
    bucket: Bucket
  ) -> &[Task] {
    match bucket {
      | Bucket::Favorites => {
        &self.favorites
      }
      | Bucket::Unfinished => {
        &self.unfinished
      }
      | Bucket::Finished => {
        &self.finished
      }
    }
  }

  pub fn len(&self) -> usize {
    self.favorites.len()
      + self.unfinished.len()
      + self.finished.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Splits a snapshot into the three
/// display sections, keeping the
/// snapshot's relative order inside
/// each one.
pub fn derive_views(
  tasks: &[Task]
) -> TaskViews {
  let mut views = TaskViews::default();

  for task in tasks {
    let target = match bucket_of(task) {
      | Bucket::Favorites => {
        &mut views.favorites
      }
      | Bucket::Unfinished => {
        &mut views.unfinished
      }
      | Bucket::Finished => {
        &mut views.finished
      }
    };
    target.push(task.clone());
  }

  tracing::trace!(
    total = tasks.len(),
    favorites = views.favorites.len(),
    unfinished = views.unfinished.len(),
    finished = views.finished.len(),
    "derived task views"
  );
  views
}

/// Collapsed/expanded state of the
/// collapsible sections. Purely visual.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct SectionToggles {
  favorites_collapsed: bool,
  finished_collapsed:  bool
}

impl Default for SectionToggles {
  fn default() -> Self {
    Self {
      favorites_collapsed: false,
      finished_collapsed:  true
    }
  }
}

impl SectionToggles {
  pub fn is_collapsed(
    &self,
    bucket: Bucket
  ) -> bool {
    match bucket {
      | Bucket::Favorites => {
        self.favorites_collapsed
      }
      | Bucket::Unfinished => false,
      | Bucket::Finished => {
        self.finished_collapsed
      }
    }
  }

  #[must_use]
  pub fn toggled(
    mut self,
    bucket: Bucket
  ) -> Self {
    match bucket {
      | Bucket::Favorites => {
        self.favorites_collapsed =
          !self.favorites_collapsed;
      }
      | Bucket::Unfinished => {}
      | Bucket::Finished => {
        self.finished_collapsed =
          !self.finished_collapsed;
      }
    }
    self
  }
}

/// Whether a section gets rendered at
/// all. An empty favorites section is
/// hidden; the others always show.
pub fn section_visible(
  bucket: Bucket,
  views: &TaskViews
) -> bool {
  match bucket {
    | Bucket::Favorites => {
      !views.favorites.is_empty()
    }
    | _ => true
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  fn task(
    id: &str,
    completed: bool,
    favorite: bool
  ) -> Task {
    Task {
      id: id.to_string(),
      text: format!("task {id}"),
      completed,
      favorite,
      ..Task::default()
    }
  }

  fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks
      .iter()
      .map(|task| task.id.as_str())
      .collect()
  }

  #[test]
  fn sections_partition_the_snapshot() {
    let mut tasks = Vec::new();
    for n in 0..64_u32 {
      tasks.push(task(
        &n.to_string(),
        n % 2 == 0,
        n % 3 == 0
      ));
    }

    let views = derive_views(&tasks);
    assert_eq!(views.len(), tasks.len());

    let mut seen = HashSet::new();
    for bucket in Bucket::ALL {
      for entry in views.section(bucket) {
        assert_eq!(
          bucket_of(entry),
          bucket
        );
        assert!(
          seen.insert(entry.id.clone()),
          "task {} listed twice",
          entry.id
        );
      }
    }
    assert_eq!(seen.len(), tasks.len());
  }

  #[test]
  fn sections_keep_snapshot_order() {
    let tasks = vec![
      task("a", false, false),
      task("b", true, true),
      task("c", true, false),
      task("d", false, false),
      task("e", false, true),
      task("f", true, false),
    ];

    let views = derive_views(&tasks);
    assert_eq!(
      ids(&views.favorites),
      ["b", "e"]
    );
    assert_eq!(
      ids(&views.unfinished),
      ["a", "d"]
    );
    assert_eq!(
      ids(&views.finished),
      ["c", "f"]
    );
  }

  #[test]
  fn favoriting_a_finished_task_moves_it_to_favorites(
  ) {
    let mut tasks = vec![
      task("a", true, false),
      task("b", false, false),
    ];
    let before = derive_views(&tasks);
    assert_eq!(
      ids(&before.finished),
      ["a"]
    );
    assert!(before.favorites.is_empty());

    tasks[0].favorite = true;
    let after = derive_views(&tasks);
    assert_eq!(
      ids(&after.favorites),
      ["a"]
    );
    assert!(after.finished.is_empty());
  }

  #[test]
  fn empty_snapshot_yields_empty_sections(
  ) {
    let views = derive_views(&[]);
    assert!(views.is_empty());
    assert!(!section_visible(
      Bucket::Favorites,
      &views
    ));
    assert!(section_visible(
      Bucket::Unfinished,
      &views
    ));
  }

  #[test]
  fn toggles_start_with_finished_collapsed(
  ) {
    let toggles =
      SectionToggles::default();
    assert!(!toggles.is_collapsed(
      Bucket::Favorites
    ));
    assert!(toggles.is_collapsed(
      Bucket::Finished
    ));

    let toggles = toggles
      .toggled(Bucket::Finished)
      .toggled(Bucket::Favorites)
      .toggled(Bucket::Unfinished);
    assert!(!toggles.is_collapsed(
      Bucket::Finished
    ));
    assert!(toggles.is_collapsed(
      Bucket::Favorites
    ));
    assert!(!toggles.is_collapsed(
      Bucket::Unfinished
    ));
  }
}

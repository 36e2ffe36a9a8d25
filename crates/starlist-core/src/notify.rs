//! Due-date alerts.
//!
//! A periodic check walks the latest
//! snapshot and fires one notification
//! per `(task id, due timestamp)` pair
//! once the due time has passed. Which
//! pairs already fired is kept in a
//! [`NotifiedSet`] owned by the caller
//! for the lifetime of the session.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use starlist_shared::Task;

use crate::datetime::{
  format_local_display,
  parse_wire_timestamp
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
  Unsupported,
  Default,
  Granted,
  Denied
}

/// What the permission banner should
/// offer.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum PermissionPrompt {
  Hidden,
  OfferOptIn,
  Blocked
}

impl NotificationPermission {
  pub fn as_label(
    self
  ) -> &'static str {
    match self {
      | Self::Default => {
        "Notifications are off. Enable \
         them to get an alert when a \
         task is due."
      }
      | Self::Granted => {
        "Notifications enabled"
      }
      | Self::Denied => {
        "Notifications are blocked. \
         Allow them in the site \
         settings of your browser."
      }
      | Self::Unsupported => {
        "Notifications unsupported"
      }
    }
  }

  pub fn allows_delivery(self) -> bool {
    self == Self::Granted
  }

  /// The opt-in is only offered while
  /// the user has not decided yet; it
  /// is never requested without a
  /// gesture.
  pub fn prompt(
    self
  ) -> PermissionPrompt {
    match self {
      | Self::Default => {
        PermissionPrompt::OfferOptIn
      }
      | Self::Denied => {
        PermissionPrompt::Blocked
      }
      | Self::Granted
      | Self::Unsupported => {
        PermissionPrompt::Hidden
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
)]
pub struct DueKey {
  pub task_id: String,
  pub due_at:  String
}

impl DueKey {
  pub fn for_task(task: &Task) -> Self {
    Self {
      task_id: task.id.clone(),
      due_at:  task.due_at.clone()
    }
  }
}

impl fmt::Display for DueKey {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{}|{}",
      self.task_id, self.due_at
    )
  }
}

/// Due events that already alerted the
/// user in this session.
#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct NotifiedSet {
  keys: BTreeSet<DueKey>
}

impl NotifiedSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contains(
    &self,
    key: &DueKey
  ) -> bool {
    self.keys.contains(key)
  }

  /// Returns `false` when the key was
  /// already present.
  pub fn insert(
    &mut self,
    key: DueKey
  ) -> bool {
    self.keys.insert(key)
  }

  pub fn len(&self) -> usize {
    self.keys.len()
  }

  pub fn is_empty(&self) -> bool {
    self.keys.is_empty()
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct DueNotification {
  pub key:   DueKey,
  pub title: String,
  pub body:  String
}

/// Platform capability that displays
/// alerts.
pub trait Notifier {
  fn permission(
    &self
  ) -> NotificationPermission;

  fn show(
    &self,
    notification: &DueNotification
  ) -> anyhow::Result<()>;
}

/// Tasks whose due event should fire
/// now and has not fired yet. Does not
/// touch `notified`.
pub fn collect_due_notifications(
  tasks: &[Task],
  now: DateTime<Utc>,
  timezone: Tz,
  title: &str,
  notified: &NotifiedSet
) -> Vec<DueNotification> {
  let mut events = Vec::new();

  for task in tasks {
    if task.completed || !task.has_due()
    {
      continue;
    }

    let Some(due) =
      parse_wire_timestamp(&task.due_at)
    else {
      tracing::debug!(
        task_id = %task.id,
        due_at = %task.due_at,
        "skipping malformed due \
         timestamp"
      );
      continue;
    };

    if due > now {
      continue;
    }

    let key = DueKey::for_task(task);
    if notified.contains(&key) {
      continue;
    }

    events.push(DueNotification {
      key,
      title: title.to_string(),
      body: format!(
        "{} - due: {}",
        task.text,
        format_local_display(
          due, timezone
        )
      )
    });
  }

  events
}

#[derive(Debug, Clone)]
pub struct DueAlerts {
  enabled:  bool,
  title:    String,
  timezone: Tz
}

impl DueAlerts {
  pub fn new(
    enabled: bool,
    title: impl Into<String>,
    timezone: Tz
  ) -> Self {
    Self {
      enabled,
      title: title.into(),
      timezone
    }
  }

  pub fn timezone(&self) -> Tz {
    self.timezone
  }

  /// One periodic evaluation. Returns
  /// how many due events fired.
  ///
  /// Each key is recorded before its
  /// notification is handed to the
  /// platform, so a slow or failing
  /// display never produces a second
  /// alert for the same event.
  pub fn check<N>(
    &self,
    tasks: &[Task],
    now: DateTime<Utc>,
    notified: &mut NotifiedSet,
    notifier: &N
  ) -> usize
  where
    N: Notifier + ?Sized
  {
    if !self.enabled {
      return 0;
    }

    let permission =
      notifier.permission();
    if !permission.allows_delivery() {
      tracing::trace!(
        ?permission,
        "skipping due check because \
         permission is not granted"
      );
      return 0;
    }

    let events =
      collect_due_notifications(
        tasks,
        now,
        self.timezone,
        &self.title,
        notified
      );

    for event in &events {
      notified.insert(event.key.clone());
      match notifier.show(event) {
        | Ok(()) => {
          tracing::info!(
            key = %event.key,
            "emitted due notification"
          );
        }
        | Err(error) => {
          tracing::error!(
            key = %event.key,
            error = %error,
            "failed to emit due \
             notification"
          );
        }
      }
    }

    events.len()
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use anyhow::anyhow;
  use chrono::{
    Duration,
    TimeZone
  };

  use super::*;

  struct RecordingNotifier {
    permission: NotificationPermission,
    fail:       bool,
    shown: RefCell<Vec<DueNotification>>
  }

  impl RecordingNotifier {
    fn granted() -> Self {
      Self::with(
        NotificationPermission::Granted
      )
    }

    fn with(
      permission: NotificationPermission
    ) -> Self {
      Self {
        permission,
        fail: false,
        shown: RefCell::new(Vec::new())
      }
    }

    fn shown(&self) -> usize {
      self.shown.borrow().len()
    }
  }

  impl Notifier for RecordingNotifier {
    fn permission(
      &self
    ) -> NotificationPermission {
      self.permission
    }

    fn show(
      &self,
      notification: &DueNotification
    ) -> anyhow::Result<()> {
      self
        .shown
        .borrow_mut()
        .push(notification.clone());
      if self.fail {
        return Err(anyhow!(
          "display failed"
        ));
      }
      Ok(())
    }
  }

  fn at(raw: &str) -> DateTime<Utc> {
    parse_wire_timestamp(raw)
      .expect("valid timestamp")
  }

  fn due_task(
    id: &str,
    due_at: &str
  ) -> Task {
    Task {
      id: id.to_string(),
      text: format!("task {id}"),
      due_at: due_at.to_string(),
      ..Task::default()
    }
  }

  fn alerts() -> DueAlerts {
    DueAlerts::new(
      true,
      "Task due",
      chrono_tz::UTC
    )
  }

  #[test]
  fn overdue_task_fires_once() {
    let tasks = vec![due_task(
      "a",
      "2024-01-01T09:00:00Z"
    )];
    let notifier =
      RecordingNotifier::granted();
    let mut notified = NotifiedSet::new();

    let fired = alerts().check(
      &tasks,
      at("2024-01-01T09:00:01Z"),
      &mut notified,
      &notifier
    );
    assert_eq!(fired, 1);
    assert_eq!(notifier.shown(), 1);

    let fired = alerts().check(
      &tasks,
      at("2024-01-01T09:00:02Z"),
      &mut notified,
      &notifier
    );
    assert_eq!(fired, 0);
    assert_eq!(notifier.shown(), 1);
  }

  #[test]
  fn thousands_of_checks_still_fire_once(
  ) {
    let tasks = vec![
      due_task(
        "a",
        "2024-01-01T09:00:00Z"
      ),
      due_task(
        "b",
        "2024-01-01T09:30:00Z"
      ),
    ];
    let notifier =
      RecordingNotifier::granted();
    let mut notified = NotifiedSet::new();
    let start = at("2024-01-01T08:59:00Z");

    for tick in 0..5_000_i64 {
      alerts().check(
        &tasks,
        start + Duration::seconds(tick),
        &mut notified,
        &notifier
      );
    }

    assert_eq!(notifier.shown(), 2);
    assert_eq!(notified.len(), 2);
  }

  #[test]
  fn future_completed_and_undated_tasks_are_skipped(
  ) {
    let mut done = due_task(
      "done",
      "2024-01-01T08:00:00Z"
    );
    done.completed = true;
    let tasks = vec![
      done,
      due_task(
        "later",
        "2024-01-01T10:00:00Z"
      ),
      due_task("none", ""),
      due_task("junk", "tomorrow-ish"),
    ];
    let notifier =
      RecordingNotifier::granted();
    let mut notified = NotifiedSet::new();

    let fired = alerts().check(
      &tasks,
      at("2024-01-01T09:00:00Z"),
      &mut notified,
      &notifier
    );
    assert_eq!(fired, 0);
    assert!(notified.is_empty());
  }

  #[test]
  fn due_exactly_now_fires() {
    let tasks = vec![due_task(
      "a",
      "2024-01-01T09:00:00Z"
    )];
    let events =
      collect_due_notifications(
        &tasks,
        at("2024-01-01T09:00:00Z"),
        chrono_tz::UTC,
        "Task due",
        &NotifiedSet::new()
      );
    assert_eq!(events.len(), 1);
    assert_eq!(
      events[0].body,
      "task a - due: 2024-01-01 09:00:00"
    );
  }

  #[test]
  fn changing_due_date_makes_task_eligible_again(
  ) {
    let notifier =
      RecordingNotifier::granted();
    let mut notified = NotifiedSet::new();
    let mut tasks = vec![due_task(
      "a",
      "2024-01-01T09:00:00Z"
    )];

    alerts().check(
      &tasks,
      at("2024-01-01T09:00:05Z"),
      &mut notified,
      &notifier
    );
    tasks[0].due_at =
      "2024-01-01T09:01:00.000Z"
        .to_string();
    alerts().check(
      &tasks,
      at("2024-01-01T09:01:00Z"),
      &mut notified,
      &notifier
    );

    assert_eq!(notifier.shown(), 2);
  }

  #[test]
  fn cleared_due_date_is_never_eligible(
  ) {
    let notifier =
      RecordingNotifier::granted();
    let mut notified = NotifiedSet::new();
    let tasks = vec![due_task("a", "")];

    let fired = alerts().check(
      &tasks,
      at("2030-01-01T00:00:00Z"),
      &mut notified,
      &notifier
    );
    assert_eq!(fired, 0);
  }

  #[test]
  fn nothing_fires_or_is_marked_without_permission(
  ) {
    let tasks = vec![due_task(
      "a",
      "2024-01-01T09:00:00Z"
    )];
    let now = at("2024-01-01T09:00:01Z");
    let mut notified = NotifiedSet::new();

    for permission in [
      NotificationPermission::Default,
      NotificationPermission::Denied,
      NotificationPermission::Unsupported,
    ] {
      let notifier =
        RecordingNotifier::with(permission);
      let fired = alerts().check(
        &tasks,
        now,
        &mut notified,
        &notifier
      );
      assert_eq!(fired, 0);
      assert_eq!(notifier.shown(), 0);
    }
    assert!(notified.is_empty());

    let notifier =
      RecordingNotifier::granted();
    alerts().check(
      &tasks,
      now,
      &mut notified,
      &notifier
    );
    assert_eq!(notifier.shown(), 1);
  }

  #[test]
  fn failed_display_still_marks_the_key(
  ) {
    let tasks = vec![due_task(
      "a",
      "2024-01-01T09:00:00Z"
    )];
    let mut notifier =
      RecordingNotifier::granted();
    notifier.fail = true;
    let mut notified = NotifiedSet::new();

    for _ in 0..3 {
      alerts().check(
        &tasks,
        at("2024-01-01T09:05:00Z"),
        &mut notified,
        &notifier
      );
    }

    assert_eq!(notifier.shown(), 1);
    assert!(notified.contains(
      &DueKey::for_task(&tasks[0])
    ));
  }

  #[test]
  fn disabled_alerts_do_nothing() {
    let tasks = vec![due_task(
      "a",
      "2024-01-01T09:00:00Z"
    )];
    let notifier =
      RecordingNotifier::granted();
    let mut notified = NotifiedSet::new();

    let fired = DueAlerts::new(
      false,
      "Task due",
      chrono_tz::UTC
    )
    .check(
      &tasks,
      at("2024-01-01T10:00:00Z"),
      &mut notified,
      &notifier
    );
    assert_eq!(fired, 0);
    assert_eq!(notifier.shown(), 0);
  }

  #[test]
  fn body_uses_viewer_timezone() {
    let tokyo: Tz = "Asia/Tokyo"
      .parse()
      .expect("known timezone");
    let tasks = vec![due_task(
      "a",
      "2024-01-01T09:00:00Z"
    )];
    let events =
      collect_due_notifications(
        &tasks,
        Utc
          .with_ymd_and_hms(
            2024, 1, 2, 0, 0, 0
          )
          .single()
          .expect("valid instant"),
        tokyo,
        "Task due",
        &NotifiedSet::new()
      );
    assert_eq!(
      events[0].body,
      "task a - due: 2024-01-01 18:00:00"
    );
  }

  #[test]
  fn prompt_follows_permission() {
    assert_eq!(
      NotificationPermission::Default
        .prompt(),
      PermissionPrompt::OfferOptIn
    );
    assert_eq!(
      NotificationPermission::Denied
        .prompt(),
      PermissionPrompt::Blocked
    );
    assert_eq!(
      NotificationPermission::Granted
        .prompt(),
      PermissionPrompt::Hidden
    );
    assert_eq!(
      NotificationPermission::Unsupported
        .prompt(),
      PermissionPrompt::Hidden
    );
  }
}

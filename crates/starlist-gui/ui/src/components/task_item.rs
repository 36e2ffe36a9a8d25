use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use starlist_core::datetime::{
  display_stamp,
  parse_wire_timestamp,
  to_local_input_value
};
use starlist_shared::Task;
use web_sys::{
  Event,
  HtmlInputElement
};
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  TargetCast,
  classes,
  function_component,
  html
};

use crate::app::TaskOp;

#[derive(Properties, PartialEq)]
pub struct TaskItemProps {
  pub task:      Task,
  pub now:       DateTime<Utc>,
  pub timezone:  Tz,
  pub on_action: Callback<TaskOp>
}

fn is_overdue(
  task: &Task,
  now: DateTime<Utc>
) -> bool {
  !task.completed
    && parse_wire_timestamp(&task.due_at)
      .is_some_and(|due| due <= now)
}

fn created_line(
  task: &Task,
  timezone: Tz
) -> Option<String> {
  display_stamp(&task.created_at, timezone)
    .map(|created| format!("Created {created}"))
}

#[function_component(TaskItem)]
pub fn task_item(
  props: &TaskItemProps
) -> Html {
  let task = &props.task;
  let overdue = is_overdue(task, props.now);

  let on_complete = {
    let on_action = props.on_action.clone();
    let task = task.clone();
    Callback::from(move |_: MouseEvent| {
      on_action.emit(
        TaskOp::ToggleCompleted(task.clone())
      )
    })
  };

  let on_favorite = {
    let on_action = props.on_action.clone();
    let task = task.clone();
    Callback::from(move |_: MouseEvent| {
      on_action.emit(
        TaskOp::ToggleFavorite(task.clone())
      )
    })
  };

  let on_due_change = {
    let on_action = props.on_action.clone();
    let task = task.clone();
    Callback::from(move |e: Event| {
      let input: HtmlInputElement =
        e.target_unchecked_into();
      on_action.emit(TaskOp::SetDue(
        task.clone(),
        input.value()
      ));
    })
  };

  let on_clear_due = {
    let on_action = props.on_action.clone();
    let task = task.clone();
    Callback::from(move |_: MouseEvent| {
      on_action.emit(TaskOp::SetDue(
        task.clone(),
        String::new()
      ))
    })
  };

  let on_delete = {
    let on_action = props.on_action.clone();
    let id = task.id.clone();
    Callback::from(move |_: MouseEvent| {
      on_action
        .emit(TaskOp::Delete(id.clone()))
    })
  };

  let due_value = to_local_input_value(
    &task.due_at,
    props.timezone
  );
  let due_title =
    display_stamp(&task.due_at, props.timezone)
      .unwrap_or_default();
  let created =
    created_line(task, props.timezone);

  html! {
    <li class={classes!(
      "task",
      task.completed.then_some("done"),
      overdue.then_some("overdue")
    )}>
      <input
        type="checkbox"
        class="task-check"
        checked={task.completed}
        onclick={on_complete}
      />
      <div class="task-body">
        <span class="task-text">{ &task.text }</span>
        {
          if let Some(created) = created {
            html! { <span class="task-created">{ created }</span> }
          } else {
            html! {}
          }
        }
      </div>
      <input
        type="datetime-local"
        class="task-due"
        title={due_title}
        value={due_value}
        onchange={on_due_change}
      />
      {
        if task.has_due() {
          html! {
            <button class="btn" title="Clear due date" onclick={on_clear_due}>
              { "✕" }
            </button>
          }
        } else {
          html! {}
        }
      }
      <button
        class={classes!("btn", "star", task.favorite.then_some("on"))}
        title={if task.favorite { "Remove from favorites" } else { "Add to favorites" }}
        onclick={on_favorite}
      >
        { if task.favorite { "★" } else { "☆" } }
      </button>
      <button class="btn danger" onclick={on_delete}>{ "Delete" }</button>
    </li>
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn task(
    completed: bool,
    due_at: &str
  ) -> Task {
    Task {
      id: "a".to_string(),
      completed,
      due_at: due_at.to_string(),
      ..Task::default()
    }
  }

  #[test]
  fn created_line_uses_display_timezone() {
    let mut created = task(false, "");
    created.created_at =
      "2024-01-01T09:00:00.000Z".to_string();

    assert_eq!(
      created_line(
        &created,
        "Asia/Tokyo".parse().expect("tz")
      )
      .as_deref(),
      Some("Created 2024-01-01 18:00:00")
    );
    assert_eq!(
      created_line(
        &task(false, ""),
        chrono_tz::UTC
      ),
      None
    );
  }

  #[test]
  fn overdue_needs_past_due_and_open_task() {
    let now =
      parse_wire_timestamp("2024-01-01T10:00:00Z")
        .expect("timestamp");

    assert!(is_overdue(
      &task(false, "2024-01-01T09:00:00Z"),
      now
    ));
    assert!(is_overdue(
      &task(false, "2024-01-01T10:00:00Z"),
      now
    ));
    assert!(!is_overdue(
      &task(true, "2024-01-01T09:00:00Z"),
      now
    ));
    assert!(!is_overdue(
      &task(false, "2024-01-01T11:00:00Z"),
      now
    ));
    assert!(!is_overdue(&task(false, ""), now));
  }
}

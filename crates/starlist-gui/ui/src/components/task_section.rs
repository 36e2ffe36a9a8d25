use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use starlist_core::views::Bucket;
use starlist_shared::Task;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  classes,
  function_component,
  html
};

use super::TaskItem;
use crate::app::TaskOp;

#[derive(Properties, PartialEq)]
pub struct TaskSectionProps {
  pub bucket:            Bucket,
  pub tasks:             Vec<Task>,
  pub collapsed:         bool,
  pub now:               DateTime<Utc>,
  pub timezone:          Tz,
  pub on_toggle_section: Callback<Bucket>,
  pub on_action:         Callback<TaskOp>
}

/// Only collapsible sections carry a
/// count.
fn count_badge(
  bucket: Bucket,
  len: usize
) -> Option<usize> {
  bucket.collapsible().then_some(len)
}

#[function_component(TaskSection)]
pub fn task_section(
  props: &TaskSectionProps
) -> Html {
  let bucket = props.bucket;
  let collapsible = bucket.collapsible();
  let on_header = {
    let on_toggle =
      props.on_toggle_section.clone();
    Callback::from(move |_: MouseEvent| {
      if collapsible {
        on_toggle.emit(bucket);
      }
    })
  };
  let marker = match (
    collapsible,
    props.collapsed
  ) {
    | (false, _) => "",
    | (true, true) => "▸ ",
    | (true, false) => "▾ "
  };

  html! {
    <section class={classes!("section", bucket.as_key())}>
      <div
        class={classes!("section-header", collapsible.then_some("collapsible"))}
        onclick={on_header}
      >
        <span>{ format!("{marker}{}", bucket.title()) }</span>
        {
          if let Some(count) = count_badge(bucket, props.tasks.len()) {
            html! { <span class="badge">{ count }</span> }
          } else {
            html! {}
          }
        }
      </div>
      {
        if props.collapsed {
          html! {}
        } else if props.tasks.is_empty() {
          html! { <div class="section-empty">{ "No tasks" }</div> }
        } else {
          html! {
            <ul class="task-list">
              {
                for props.tasks.iter().map(|task| html! {
                  <TaskItem
                    key={task.id.clone()}
                    task={task.clone()}
                    now={props.now}
                    timezone={props.timezone}
                    on_action={props.on_action.clone()}
                  />
                })
              }
            </ul>
          }
        }
      }
    </section>
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unfinished_section_has_no_count() {
    assert_eq!(
      count_badge(Bucket::Unfinished, 3),
      None
    );
    assert_eq!(
      count_badge(Bucket::Favorites, 2),
      Some(2)
    );
    assert_eq!(
      count_badge(Bucket::Finished, 0),
      Some(0)
    );
  }
}

use web_sys::{
  HtmlInputElement,
  SubmitEvent
};
use yew::{
  Callback,
  Html,
  InputEvent,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct NewTaskBarProps {
  pub value:     String,
  /// An add call is in flight.
  #[prop_or_default]
  pub loading:   bool,
  pub on_input:  Callback<String>,
  pub on_submit: Callback<()>
}

/// Whether the bar may send `value`
/// now. One add at a time.
pub fn can_submit(
  value: &str,
  loading: bool
) -> bool {
  !loading && !value.trim().is_empty()
}

fn submit_label(
  loading: bool
) -> &'static str {
  if loading { "Adding..." } else { "Add" }
}

#[function_component(NewTaskBar)]
pub fn new_task_bar(
  props: &NewTaskBarProps
) -> Html {
  let oninput = {
    let on_input = props.on_input.clone();
    Callback::from(move |e: InputEvent| {
      let input: HtmlInputElement =
        e.target_unchecked_into();
      on_input.emit(input.value());
    })
  };

  let onsubmit = {
    let on_submit = props.on_submit.clone();
    Callback::from(move |e: SubmitEvent| {
      e.prevent_default();
      on_submit.emit(());
    })
  };

  let enabled =
    can_submit(&props.value, props.loading);

  html! {
    <form class="new-task" {onsubmit}>
      <input
        class="new-task-input"
        type="text"
        placeholder="Add a task"
        value={props.value.clone()}
        {oninput}
      />
      <button
        class="btn ok"
        type="submit"
        disabled={!enabled}
        aria-busy={props.loading.to_string()}
      >
        { submit_label(props.loading) }
      </button>
    </form>
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_is_blocked_while_a_call_is_in_flight()
  {
    assert!(can_submit("milk", false));
    assert!(!can_submit("milk", true));
    assert!(!can_submit("   ", false));
    assert_eq!(submit_label(true), "Adding...");
    assert_eq!(submit_label(false), "Add");
  }
}

use std::rc::Rc;

use chrono::Utc;
use chrono_tz::Tz;
use gloo::timers::callback::Interval;
use starlist_core::config::AppConfig;
use starlist_core::datetime::resolve_timezone;
use starlist_core::notify::NotifiedSet;
use starlist_core::views::{
  Bucket,
  SectionToggles,
  derive_views,
  section_visible
};
use starlist_shared::Task;
use yew::{
  Callback,
  Html,
  UseStateHandle,
  function_component,
  html,
  use_effect_with,
  use_memo,
  use_mut_ref,
  use_state
};

use crate::api::{
  BrowserTaskService,
  task_service
};
use crate::components::{
  Header,
  NewTaskBar,
  PermissionBanner,
  TaskSection,
  can_submit
};
use crate::notifications::{
  BrowserNotifier,
  browser_permission,
  request_permission
};

const CONFIG_TOML: &str =
  include_str!("../assets/starlist.toml");

/// A user action against the task
/// service.
#[derive(Debug, Clone)]
pub enum TaskOp {
  Reload,
  Add(String),
  ToggleCompleted(Task),
  ToggleFavorite(Task),
  SetDue(Task, String),
  Delete(String)
}

fn load_config() -> AppConfig {
  match AppConfig::from_toml_str(
    CONFIG_TOML
  ) {
    | Ok(config) => config,
    | Err(error) => {
      tracing::error!(
        error = %error,
        "embedded config invalid; using \
         defaults"
      );
      AppConfig::default()
    }
  }
}

fn browser_timezone() -> Option<String> {
  let format =
    js_sys::Intl::DateTimeFormat::new(
      &js_sys::Array::new(),
      &js_sys::Object::new()
    );
  js_sys::Reflect::get(
    &format.resolved_options(),
    &wasm_bindgen::JsValue::from_str(
      "timeZone"
    )
  )
  .ok()?
  .as_string()
}

fn display_timezone(
  config: &AppConfig
) -> Tz {
  let browser = browser_timezone();
  resolve_timezone([
    (
      config.display.timezone.as_deref(),
      "config"
    ),
    (browser.as_deref(), "browser"),
  ])
}

async fn perform(
  service: &BrowserTaskService,
  op: TaskOp,
  timezone: Tz
) -> anyhow::Result<()> {
  match op {
    | TaskOp::Reload => {
      service.list().await?;
    }
    | TaskOp::Add(text) => {
      service.add(&text).await?;
    }
    | TaskOp::ToggleCompleted(task) => {
      service
        .toggle_completed(&task)
        .await?;
    }
    | TaskOp::ToggleFavorite(task) => {
      service
        .toggle_favorite(&task)
        .await?;
    }
    | TaskOp::SetDue(task, value) => {
      service
        .set_due(&task, &value, timezone)
        .await?;
    }
    | TaskOp::Delete(id) => {
      service.delete(&id).await?;
    }
  }
  Ok(())
}

/// Runs `op`, then publishes the
/// snapshot and the error banner.
/// Returns whether the op succeeded.
async fn run_op(
  service: &BrowserTaskService,
  op: TaskOp,
  timezone: Tz,
  tasks: &UseStateHandle<Vec<Task>>,
  last_error: &UseStateHandle<
    Option<String>
  >
) -> bool {
  let result =
    perform(service, op, timezone).await;
  tasks.set(service.snapshot());
  match result {
    | Ok(()) => {
      last_error.set(None);
      true
    }
    | Err(error) => {
      last_error
        .set(Some(format!("{error:#}")));
      false
    }
  }
}

#[function_component(App)]
pub fn app() -> Html {
  let config = use_memo((), |_| load_config());
  let timezone = {
    let config = config.clone();
    *use_memo((), move |_| {
      display_timezone(&config)
    })
  };
  let service = {
    let config = config.clone();
    use_memo((), move |_| {
      task_service(&config.backend)
    })
  };

  let tasks = use_state(Vec::<Task>::new);
  let now = use_state(Utc::now);
  let toggles =
    use_state(SectionToggles::default);
  let permission =
    use_state(browser_permission);
  let draft = use_state(String::new);
  let adding = use_state(|| false);
  let last_error =
    use_state(|| None::<String>);
  let notified =
    use_mut_ref(NotifiedSet::new);

  let on_action = {
    let service = service.clone();
    let tasks = tasks.clone();
    let last_error = last_error.clone();
    Callback::from(move |op: TaskOp| {
      let service: Rc<BrowserTaskService> =
        service.clone();
      let tasks = tasks.clone();
      let last_error = last_error.clone();
      tracing::debug!(op = ?op, "task action");
      wasm_bindgen_futures::spawn_local(
        async move {
          run_op(
            &service,
            op,
            timezone,
            &tasks,
            &last_error
          )
          .await;
        }
      );
    })
  };

  {
    let on_action = on_action.clone();
    use_effect_with((), move |_| {
      on_action.emit(TaskOp::Reload);
      || ()
    });
  }

  {
    let now = now.clone();
    let service = service.clone();
    let notified = notified.clone();
    let alerts = config.due_alerts(timezone);
    let period = config.clock.tick_millis;
    use_effect_with((), move |_| {
      let ticker =
        Interval::new(period, move || {
          let instant = Utc::now();
          now.set(instant);
          alerts.check(
            &service.snapshot(),
            instant,
            &mut notified.borrow_mut(),
            &BrowserNotifier
          );
        });
      move || drop(ticker)
    });
  }

  let on_enable_notifications = {
    let permission = permission.clone();
    Callback::from(move |()| {
      let permission = permission.clone();
      wasm_bindgen_futures::spawn_local(
        async move {
          permission
            .set(request_permission().await);
        }
      );
    })
  };

  let on_draft = {
    let draft = draft.clone();
    Callback::from(move |value: String| {
      draft.set(value)
    })
  };

  // The draft survives a failed add.
  let on_submit = {
    let service = service.clone();
    let tasks = tasks.clone();
    let last_error = last_error.clone();
    let draft = draft.clone();
    let adding = adding.clone();
    Callback::from(move |()| {
      let text = (*draft).clone();
      if !can_submit(&text, *adding) {
        return;
      }
      adding.set(true);
      let service = service.clone();
      let tasks = tasks.clone();
      let last_error = last_error.clone();
      let draft = draft.clone();
      let adding = adding.clone();
      wasm_bindgen_futures::spawn_local(
        async move {
          let added = run_op(
            &service,
            TaskOp::Add(text),
            timezone,
            &tasks,
            &last_error
          )
          .await;
          if added {
            draft.set(String::new());
          }
          adding.set(false);
        }
      );
    })
  };

  let on_toggle_section = {
    let toggles = toggles.clone();
    Callback::from(move |bucket: Bucket| {
      toggles.set((*toggles).toggled(bucket))
    })
  };

  let views = derive_views(&tasks);

  html! {
    <div class="app">
      <Header now={*now} {timezone} />
      <PermissionBanner
        permission={*permission}
        on_enable={on_enable_notifications}
      />
      {
        if let Some(message) = (*last_error).clone() {
          html! { <div class="error-banner">{ message }</div> }
        } else {
          html! {}
        }
      }
      <NewTaskBar
        value={(*draft).clone()}
        loading={*adding}
        on_input={on_draft}
        on_submit={on_submit}
      />
      {
        for Bucket::ALL
          .into_iter()
          .filter(|bucket| section_visible(*bucket, &views))
          .map(|bucket| html! {
            <TaskSection
              key={bucket.as_key()}
              {bucket}
              tasks={views.section(bucket).to_vec()}
              collapsed={toggles.is_collapsed(bucket)}
              now={*now}
              {timezone}
              on_toggle_section={on_toggle_section.clone()}
              on_action={on_action.clone()}
            />
          })
      }
    </div>
  }
}

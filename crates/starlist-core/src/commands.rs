use std::time::Duration;

use anyhow::{
  Context,
  bail
};
use starlist_shared::Task;
use tokio::time::{
  Instant,
  MissedTickBehavior
};
use tracing::{
  debug,
  info,
  instrument,
  warn
};

use crate::cli::{
  Command,
  TerminalNotifier
};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::notify::{
  DueAlerts,
  NotifiedSet,
  Notifier
};
use crate::render::Renderer;
use crate::rpc::TodoRpc;
use crate::service::TaskService;

pub async fn dispatch<R, C>(
  service: &TaskService<R>,
  config: &AppConfig,
  renderer: &Renderer,
  clock: &C,
  command: Command
) -> anyhow::Result<()>
where
  R: TodoRpc,
  C: Clock
{
  debug!(?command, "dispatching command");

  match command {
    | Command::List => {
      cmd_list(service, renderer, clock)
        .await
    }
    | Command::Add {
      text
    } => {
      cmd_add(
        service,
        renderer,
        &text.join(" ")
      )
      .await
    }
    | Command::Done {
      id
    } => {
      cmd_set_completed(
        service, renderer, &id, true
      )
      .await
    }
    | Command::Undone {
      id
    } => {
      cmd_set_completed(
        service, renderer, &id, false
      )
      .await
    }
    | Command::Star {
      id
    } => {
      cmd_set_favorite(
        service, renderer, &id, true
      )
      .await
    }
    | Command::Unstar {
      id
    } => {
      cmd_set_favorite(
        service, renderer, &id, false
      )
      .await
    }
    | Command::Due {
      id,
      when,
      clear
    } => {
      let value = if clear {
        String::new()
      } else {
        when.unwrap_or_default()
      };
      cmd_due(
        service, renderer, &id, &value
      )
      .await
    }
    | Command::Rm {
      id
    } => {
      cmd_rm(service, renderer, &id).await
    }
    | Command::Watch {
      reload_secs
    } => {
      cmd_watch(
        service,
        config,
        renderer,
        clock,
        Duration::from_secs(
          reload_secs.max(1)
        )
      )
      .await
    }
  }
}

#[instrument(skip_all)]
async fn cmd_list<R, C>(
  service: &TaskService<R>,
  renderer: &Renderer,
  clock: &C
) -> anyhow::Result<()>
where
  R: TodoRpc,
  C: Clock
{
  service.list().await?;
  renderer
    .print_views(&service.views(), clock.now())
}

#[instrument(skip_all)]
async fn cmd_add<R: TodoRpc>(
  service: &TaskService<R>,
  renderer: &Renderer,
  text: &str
) -> anyhow::Result<()> {
  match service.add(text).await? {
    | Some(task) => {
      renderer.print_task("added", &task)
    }
    | None => {
      bail!("task text cannot be empty")
    }
  }
}

async fn load_task<R: TodoRpc>(
  service: &TaskService<R>,
  id: &str
) -> anyhow::Result<Task> {
  service.list().await?;
  service.resolve(id)
}

#[instrument(skip(service, renderer))]
async fn cmd_set_completed<R: TodoRpc>(
  service: &TaskService<R>,
  renderer: &Renderer,
  id: &str,
  completed: bool
) -> anyhow::Result<()> {
  let task = load_task(service, id).await?;
  if task.completed == completed {
    debug!(
      task_id = %task.id,
      "completion already set"
    );
    return renderer
      .print_task("unchanged", &task);
  }

  let task =
    service.toggle_completed(&task).await?;
  renderer.print_task(
    if completed {
      "finished"
    } else {
      "reopened"
    },
    &task
  )
}

#[instrument(skip(service, renderer))]
async fn cmd_set_favorite<R: TodoRpc>(
  service: &TaskService<R>,
  renderer: &Renderer,
  id: &str,
  favorite: bool
) -> anyhow::Result<()> {
  let task = load_task(service, id).await?;
  if task.favorite == favorite {
    debug!(task_id = %task.id, "favorite already set");
    return renderer
      .print_task("unchanged", &task);
  }

  let task =
    service.toggle_favorite(&task).await?;
  renderer.print_task(
    if favorite {
      "starred"
    } else {
      "unstarred"
    },
    &task
  )
}

#[instrument(skip(service, renderer))]
async fn cmd_due<R: TodoRpc>(
  service: &TaskService<R>,
  renderer: &Renderer,
  id: &str,
  value: &str
) -> anyhow::Result<()> {
  let task = load_task(service, id).await?;
  let task = service
    .set_due(
      &task,
      value,
      renderer.timezone()
    )
    .await?;
  renderer.print_task(
    if task.has_due() {
      "due set"
    } else {
      "due cleared"
    },
    &task
  )
}

#[instrument(skip(service, renderer))]
async fn cmd_rm<R: TodoRpc>(
  service: &TaskService<R>,
  renderer: &Renderer,
  id: &str
) -> anyhow::Result<()> {
  let task = load_task(service, id).await?;
  service.delete(&task.id).await?;
  renderer.print_task("deleted", &task)
}

/// One pass of the watch loop: reload
/// the list if asked, then run the due
/// check against the newest snapshot.
/// A failed reload keeps the previous
/// snapshot. Returns how many alerts
/// fired.
pub async fn watch_step<R, N>(
  service: &TaskService<R>,
  alerts: &DueAlerts,
  notifier: &N,
  notified: &mut NotifiedSet,
  now: chrono::DateTime<chrono::Utc>,
  reload: bool
) -> usize
where
  R: TodoRpc,
  N: Notifier
{
  if reload {
    if let Err(err) = service.list().await {
      warn!(
        error = %err,
        "reload failed; keeping previous \
         list"
      );
    }
  }

  alerts.check(
    &service.snapshot(),
    now,
    notified,
    notifier
  )
}

#[instrument(
  skip_all,
  fields(reload_every = ?reload_every)
)]
async fn cmd_watch<R, C>(
  service: &TaskService<R>,
  config: &AppConfig,
  renderer: &Renderer,
  clock: &C,
  reload_every: Duration
) -> anyhow::Result<()>
where
  R: TodoRpc,
  C: Clock
{
  let alerts =
    config.due_alerts(renderer.timezone());
  let notifier =
    TerminalNotifier::new(renderer.clone());
  let mut notified = NotifiedSet::new();

  let mut ticker = tokio::time::interval(
    config.tick_interval()
  );
  ticker.set_missed_tick_behavior(
    MissedTickBehavior::Skip
  );
  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  let mut last_reload: Option<Instant> =
    None;
  let mut shown: Option<Vec<Task>> = None;
  info!(
    tick_millis = config.clock.tick_millis,
    "watching for due tasks"
  );

  loop {
    tokio::select! {
      signal = &mut ctrl_c => {
        signal.context(
          "failed to listen for ctrl-c"
        )?;
        info!("interrupted; stopping watch");
        break;
      }
      _ = ticker.tick() => {}
    }

    let reload = last_reload.is_none_or(
      |at| at.elapsed() >= reload_every
    );
    if reload {
      last_reload = Some(Instant::now());
    }

    let fired = watch_step(
      service,
      &alerts,
      &notifier,
      &mut notified,
      clock.now(),
      reload
    )
    .await;
    if fired > 0 {
      debug!(
        fired,
        notified = notified.len(),
        "due alerts fired"
      );
    }

    let snapshot = service.snapshot();
    if service.is_loaded()
      && shown.as_ref() != Some(&snapshot)
    {
      renderer.print_views(
        &service.views(),
        clock.now()
      )?;
      shown = Some(snapshot);
    }
    renderer.print_clock(clock.now())?;
  }

  renderer.end_clock()?;
  Ok(())
}

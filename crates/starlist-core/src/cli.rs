use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{
  ArgAction,
  Parser,
  Subcommand
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::notify::{
  DueNotification,
  NotificationPermission,
  Notifier
};
use crate::render::Renderer;

#[derive(Parser, Debug, Clone)]
#[command(
  name = "starlist",
  version,
  about = "Starlist: terminal client \
           for a Connect todo service",
  disable_help_subcommand = true
)]
pub struct GlobalCli {
  #[arg(
    short = 'v',
    long = "verbose",
    action = ArgAction::Count,
    global = true
  )]
  pub verbose: u8,

  #[arg(
    short = 'q',
    long = "quiet",
    action = ArgAction::Count,
    global = true
  )]
  pub quiet: u8,

  /// Config file to read instead of
  /// the default location.
  #[arg(long = "config", global = true)]
  pub config: Option<PathBuf>,

  /// Backend base URL, overriding config
  /// and environment.
  #[arg(long = "url", global = true)]
  pub url: Option<String>,

  /// IANA timezone used to show and
  /// enter due dates.
  #[arg(
    long = "timezone",
    global = true
  )]
  pub timezone: Option<String>,

  #[command(subcommand)]
  pub command: Option<Command>
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Show favorites, unfinished and
  /// finished tasks.
  #[command(alias = "ls")]
  List,

  /// Add a task.
  Add {
    #[arg(
      required = true,
      trailing_var_arg = true,
      allow_hyphen_values = true
    )]
    text: Vec<String>
  },

  /// Mark a task finished.
  Done { id: String },

  /// Mark a task unfinished.
  Undone { id: String },

  /// Add a task to favorites.
  Star { id: String },

  /// Remove a task from favorites.
  Unstar { id: String },

  /// Set or clear a due date, given as
  /// local time `YYYY-MM-DDTHH:MM`.
  Due {
    id:    String,
    #[arg(
      required_unless_present = "clear",
      conflicts_with = "clear"
    )]
    when:  Option<String>,
    #[arg(long = "clear")]
    clear: bool
  },

  /// Delete a task.
  #[command(alias = "delete")]
  Rm { id: String },

  /// Keep running, reloading the list
  /// and alerting when tasks fall due.
  Watch {
    /// Seconds between list reloads.
    #[arg(
      long = "reload-secs",
      default_value_t = 30
    )]
    reload_secs: u64
  }
}

pub fn init_tracing(
  verbose: u8,
  quiet: u8
) -> anyhow::Result<()> {
  let default_level = if quiet >= 2 {
    "error"
  } else if quiet == 1 {
    "warn"
  } else if verbose >= 3 {
    "trace"
  } else if verbose == 2 {
    "debug"
  } else if verbose == 1 {
    "info"
  } else {
    "warn"
  };

  let env_filter =
    EnvFilter::try_from_default_env()
      .or_else(|_| {
        EnvFilter::try_new(default_level)
      })
      .map_err(|e| {
        anyhow!(
          "invalid RUST_LOG / log filter: \
           {e}"
        )
      })?;

  let init_result =
    tracing_subscriber::fmt()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_level(true)
      .with_writer(std::io::stderr)
      .with_ansi(
        std::io::stderr().is_terminal()
      )
      .try_init();

  if let Err(err) = init_result {
    debug!(error = %err, "tracing subscriber already set, continuing");
  }

  Ok(())
}

/// Prints alerts to stdout. A terminal
/// needs no opt-in, so delivery is
/// always allowed.
#[derive(Debug, Clone)]
pub struct TerminalNotifier {
  renderer: Renderer
}

impl TerminalNotifier {
  pub fn new(renderer: Renderer) -> Self {
    Self {
      renderer
    }
  }
}

impl Notifier for TerminalNotifier {
  fn permission(
    &self
  ) -> NotificationPermission {
    NotificationPermission::Granted
  }

  fn show(
    &self,
    notification: &DueNotification
  ) -> anyhow::Result<()> {
    self.renderer.print_alert(notification)
  }
}

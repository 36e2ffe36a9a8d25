#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  warn
};

use crate::notify::DueAlerts;

pub const CONFIG_ENV_VAR: &str =
  "STARLIST_CONFIG";
pub const BACKEND_URL_ENV_VAR: &str =
  "STARLIST_BACKEND_URL";
pub const TIMEZONE_ENV_VAR: &str =
  "STARLIST_TIMEZONE";

const MIN_TICK_MILLIS: u32 = 250;
const MAX_TICK_MILLIS: u32 = 60_000;

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Default,
)]
pub struct AppConfig {
  #[serde(default)]
  pub backend:       BackendConfig,
  #[serde(default)]
  pub clock:         ClockConfig,
  #[serde(default)]
  pub notifications: NotificationConfig,
  #[serde(default)]
  pub display:       DisplayConfig
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct BackendConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_service")]
  pub service:  String
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      service:  default_service()
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct ClockConfig {
  #[serde(
    default = "default_tick_millis"
  )]
  pub tick_millis: u32
}

impl Default for ClockConfig {
  fn default() -> Self {
    Self {
      tick_millis: default_tick_millis()
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct NotificationConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  #[serde(
    default = "default_notification_title"
  )]
  pub title:   String
}

impl Default for NotificationConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      title:   default_notification_title(
      )
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct DisplayConfig {
  #[serde(default)]
  pub timezone: Option<String>,
  #[serde(default = "default_true")]
  pub color:    bool
}

impl Default for DisplayConfig {
  fn default() -> Self {
    Self {
      timezone: None,
      color:    true
    }
  }
}

fn default_base_url() -> String {
  "http://localhost:8080".to_string()
}

fn default_service() -> String {
  "todo.v1.TodoService".to_string()
}

fn default_tick_millis() -> u32 {
  1_000
}

fn default_true() -> bool {
  true
}

fn default_notification_title()
-> String {
  "Task due".to_string()
}

impl AppConfig {
  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut config =
      toml::from_str::<AppConfig>(raw)
        .context(
          "failed to parse starlist \
           config"
        )?;
    config.sanitize();
    Ok(config)
  }

  /// Restores defaults for blank values
  /// and clamps the tick period.
  pub fn sanitize(&mut self) {
    let base_url = self
      .backend
      .base_url
      .trim()
      .trim_end_matches('/')
      .to_string();
    self.backend.base_url =
      if base_url.is_empty() {
        default_base_url()
      } else {
        base_url
      };

    if self
      .backend
      .service
      .trim()
      .is_empty()
    {
      self.backend.service =
        default_service();
    }

    if self
      .notifications
      .title
      .trim()
      .is_empty()
    {
      self.notifications.title =
        default_notification_title();
    }

    let tick = self
      .clock
      .tick_millis
      .clamp(
        MIN_TICK_MILLIS,
        MAX_TICK_MILLIS
      );
    if tick != self.clock.tick_millis {
      warn!(
        configured = self
          .clock
          .tick_millis,
        using = tick,
        "clock tick out of range"
      );
      self.clock.tick_millis = tick;
    }

    if self
      .display
      .timezone
      .as_deref()
      .is_some_and(|tz| {
        tz.trim().is_empty()
      })
    {
      self.display.timezone = None;
    }
  }

  /// Applies `STARLIST_BACKEND_URL` and
  /// `STARLIST_TIMEZONE` through
  /// `lookup`.
  pub fn apply_env_overrides<F>(
    &mut self,
    lookup: F
  ) where
    F: Fn(&str) -> Option<String>
  {
    if let Some(url) =
      lookup(BACKEND_URL_ENV_VAR)
    {
      debug!(url = %url, "backend url from environment");
      self.set_backend_url(&url);
    }

    if let Some(tz) =
      lookup(TIMEZONE_ENV_VAR)
    {
      debug!(timezone = %tz, "timezone from environment");
      self.display.timezone = Some(tz);
    }

    self.sanitize();
  }

  pub fn set_backend_url(
    &mut self,
    url: &str
  ) {
    self.backend.base_url =
      url.to_string();
    self.sanitize();
  }

  pub fn tick_interval(
    &self
  ) -> std::time::Duration {
    std::time::Duration::from_millis(
      u64::from(self.clock.tick_millis)
    )
  }

  pub fn due_alerts(
    &self,
    timezone: Tz
  ) -> DueAlerts {
    DueAlerts::new(
      self.notifications.enabled,
      self.notifications.title.clone(),
      timezone
    )
  }

  /// Built-in defaults, then the config
  /// file if one is found.
  #[cfg(feature = "cli")]
  #[tracing::instrument]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(override_path)
    else {
      tracing::info!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    tracing::info!(config = %path.display(), "loading config");
    let raw = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    Self::from_toml_str(&raw)
      .with_context(|| {
        format!(
          "invalid config file {}",
          path.display()
        )
      })
  }
}

/// Explicit path, then
/// `$STARLIST_CONFIG`, then
/// `<config dir>/starlist/starlist.toml`
/// when it exists.
#[cfg(feature = "cli")]
pub fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  let candidate = dirs::config_dir()?
    .join("starlist")
    .join("starlist.toml");
  if candidate.exists() {
    Some(candidate)
  } else {
    debug!(candidate = %candidate.display(), "default config file absent");
    None
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  #[test]
  fn empty_document_gives_defaults() {
    let config =
      AppConfig::from_toml_str("")
        .expect("empty config");
    assert_eq!(
      config,
      AppConfig::default()
    );
    assert_eq!(
      config.backend.base_url,
      "http://localhost:8080"
    );
    assert_eq!(
      config.tick_interval(),
      std::time::Duration::from_secs(1)
    );
  }

  #[test]
  fn values_are_sanitized() {
    let config = AppConfig::from_toml_str(
      r#"
        [backend]
        base_url = "https://todo.example.com/api/"
        service = "  "

        [clock]
        tick_millis = 5

        [notifications]
        enabled = false
        title = ""

        [display]
        timezone = " "
      "#
    )
    .expect("valid config");

    assert_eq!(
      config.backend.base_url,
      "https://todo.example.com/api"
    );
    assert_eq!(
      config.backend.service,
      "todo.v1.TodoService"
    );
    assert_eq!(
      config.clock.tick_millis,
      MIN_TICK_MILLIS
    );
    assert!(!config.notifications.enabled);
    assert_eq!(
      config.notifications.title,
      "Task due"
    );
    assert_eq!(config.display.timezone, None);
  }

  #[test]
  fn invalid_toml_is_an_error() {
    assert!(
      AppConfig::from_toml_str(
        "[clock]\ntick_millis = \"fast\""
      )
      .is_err()
    );
  }

  #[test]
  fn environment_overrides_file_values(
  ) {
    let env = HashMap::from([
      (
        BACKEND_URL_ENV_VAR,
        "http://10.0.0.5:9090/"
          .to_string()
      ),
      (
        TIMEZONE_ENV_VAR,
        "Europe/Paris".to_string()
      ),
    ]);
    let mut config = AppConfig::default();
    config.apply_env_overrides(|key| {
      env.get(key).cloned()
    });

    assert_eq!(
      config.backend.base_url,
      "http://10.0.0.5:9090"
    );
    assert_eq!(
      config.display.timezone.as_deref(),
      Some("Europe/Paris")
    );
  }

  #[cfg(feature = "cli")]
  #[test]
  fn load_reads_explicit_file() {
    let temp =
      tempfile::tempdir().expect("tempdir");
    let path =
      temp.path().join("starlist.toml");
    fs::write(
      &path,
      "[backend]\nbase_url = \"http://127.0.0.1:7000\"\n",
    )
    .expect("write config");

    let config = AppConfig::load(Some(
      path.as_path()
    ))
    .expect("load config");
    assert_eq!(
      config.backend.base_url,
      "http://127.0.0.1:7000"
    );
  }

  #[cfg(feature = "cli")]
  #[test]
  fn load_fails_for_missing_explicit_file(
  ) {
    let temp =
      tempfile::tempdir().expect("tempdir");
    let missing =
      temp.path().join("nope.toml");
    assert!(
      AppConfig::load(Some(
        missing.as_path()
      ))
        .is_err()
    );
  }
}

pub mod clock;
pub mod config;
pub mod datetime;
pub mod notify;
pub mod rpc;
pub mod service;
pub mod store;
pub mod views;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod commands;
#[cfg(feature = "cli")]
pub mod http;
#[cfg(feature = "cli")]
pub mod render;

#[cfg(feature = "cli")]
use std::ffi::OsString;

#[cfg(feature = "cli")]
use anyhow::Context;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use tracing::{
  debug,
  info
};

#[cfg(feature = "cli")]
#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting starlist CLI"
  );

  let mut cfg = config::AppConfig::load(
    cli.config.as_deref()
  )?;
  cfg.apply_env_overrides(|key| {
    std::env::var(key).ok()
  });
  if let Some(url) = cli.url.as_deref() {
    cfg.set_backend_url(url);
  }
  debug!(
    base_url = %cfg.backend.base_url,
    service = %cfg.backend.service,
    "backend resolved"
  );

  let tz_env = std::env::var("TZ").ok();
  let system = datetime::system_timezone();
  let timezone =
    datetime::terminal_timezone(
      cli.timezone.as_deref(),
      cfg.display.timezone.as_deref(),
      tz_env.as_deref(),
      system.as_deref()
    );

  let renderer =
    render::Renderer::new(&cfg, timezone);
  let transport =
    http::ReqwestTransport::new()?;
  let service =
    service::TaskService::new(
      rpc::ConnectClient::from_config(
        transport,
        &cfg.backend
      )
    );

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  runtime.block_on(commands::dispatch(
    &service,
    &cfg,
    &renderer,
    &clock::SystemClock,
    cli
      .command
      .unwrap_or(cli::Command::List)
  ))?;

  info!("done");
  Ok(())
}

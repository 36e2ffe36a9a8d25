use std::io::{
  self,
  IsTerminal,
  Write
};

use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use starlist_shared::Task;
use unicode_width::UnicodeWidthStr;

use crate::config::AppConfig;
use crate::datetime::{
  display_stamp,
  format_local_display,
  parse_wire_timestamp
};
use crate::notify::DueNotification;
use crate::views::{
  Bucket,
  TaskViews,
  section_visible
};

const SHORT_ID_CHARS: usize = 8;
const CLEAR_LINE: &str = "\r\x1b[2K";

#[derive(Debug, Clone)]
pub struct Renderer {
  color:    bool,
  /// Stdout is a terminal, so the clock
  /// line can be redrawn in place.
  live:     bool,
  timezone: Tz
}

impl Renderer {
  pub fn new(
    config: &AppConfig,
    timezone: Tz
  ) -> Self {
    let live = io::stdout().is_terminal();
    Self {
      color: config.display.color && live,
      live,
      timezone
    }
  }

  pub fn timezone(&self) -> Tz {
    self.timezone
  }

  #[tracing::instrument(skip(self, views, now))]
  pub fn print_views(
    &self,
    views: &TaskViews,
    now: DateTime<Utc>
  ) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    self.clear_status(&mut out)?;
    self.write_views(&mut out, views, now)
  }

  /// Redraws the clock on the current
  /// line. No-op unless stdout is a
  /// terminal.
  pub fn print_clock(
    &self,
    now: DateTime<Utc>
  ) -> anyhow::Result<()> {
    if !self.live {
      return Ok(());
    }
    let mut out = io::stdout().lock();
    self.write_clock(&mut out, now)?;
    out.flush()?;
    Ok(())
  }

  pub fn write_clock<W: Write>(
    &self,
    mut writer: W,
    now: DateTime<Utc>
  ) -> anyhow::Result<()> {
    write!(
      writer,
      "{CLEAR_LINE}{}",
      self.paint(&self.clock_line(now), "2")
    )?;
    Ok(())
  }

  /// Moves past the clock line before
  /// the process exits.
  pub fn end_clock(
    &self
  ) -> anyhow::Result<()> {
    if self.live {
      writeln!(io::stdout().lock())?;
    }
    Ok(())
  }

  fn clear_status<W: Write>(
    &self,
    mut writer: W
  ) -> anyhow::Result<()> {
    if self.live {
      write!(writer, "{CLEAR_LINE}")?;
    }
    Ok(())
  }

  pub fn write_views<W: Write>(
    &self,
    mut writer: W,
    views: &TaskViews,
    now: DateTime<Utc>
  ) -> anyhow::Result<()> {
    writeln!(
      writer,
      "{}  {}",
      self.paint("Starlist", "1"),
      self.clock_line(now)
    )?;

    for bucket in Bucket::ALL {
      if !section_visible(bucket, views) {
        continue;
      }

      let tasks = views.section(bucket);
      writeln!(writer)?;
      writeln!(
        writer,
        "{} ({})",
        self.paint(bucket.title(), "1"),
        tasks.len()
      )?;

      if tasks.is_empty() {
        writeln!(writer, "  (none)")?;
        continue;
      }

      let rows = tasks
        .iter()
        .map(|task| self.task_row(task, now))
        .collect();
      write_table(
        &mut writer,
        vec![
          "ID".to_string(),
          "Done".to_string(),
          "Due".to_string(),
          "Task".to_string(),
        ],
        rows
      )?;
    }

    Ok(())
  }

  pub fn print_task(
    &self,
    verb: &str,
    task: &Task
  ) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    let due = display_stamp(
      &task.due_at,
      self.timezone
    )
    .map(|due| format!(" (due {due})"))
    .unwrap_or_default();
    writeln!(
      out,
      "{verb} {} {}{due}",
      self.paint(short_id(&task.id), "33"),
      task.text
    )?;
    Ok(())
  }

  pub fn print_alert(
    &self,
    notification: &DueNotification
  ) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    self.clear_status(&mut out)?;
    writeln!(
      out,
      "\x07{} {}",
      self.paint(
        &format!("[{}]", notification.title),
        "31;1"
      ),
      notification.body
    )?;
    out.flush()?;
    Ok(())
  }

  fn clock_line(
    &self,
    now: DateTime<Utc>
  ) -> String {
    format!(
      "{} ({})",
      format_local_display(
        now,
        self.timezone
      ),
      self.timezone
    )
  }

  fn task_row(
    &self,
    task: &Task,
    now: DateTime<Utc>
  ) -> Vec<String> {
    let id =
      self.paint(short_id(&task.id), "33");
    let done = if task.completed {
      "x".to_string()
    } else {
      String::new()
    };

    let due = match parse_wire_timestamp(
      &task.due_at
    ) {
      | Some(instant) => {
        let shown = format_local_display(
          instant,
          self.timezone
        );
        if !task.completed && instant <= now
        {
          self.paint(&shown, "31")
        } else {
          shown
        }
      }
      | None => String::new()
    };

    vec![id, done, due, task.text.clone()]
  }

  fn paint(
    &self,
    text: &str,
    code: &str
  ) -> String {
    if !self.color {
      return text.to_string();
    }
    format!("\x1b[{code}m{text}\x1b[0m")
  }
}

/// Leading characters of an id, enough
/// to address it as a prefix.
pub fn short_id(id: &str) -> &str {
  match id
    .char_indices()
    .nth(SHORT_ID_CHARS)
  {
    | Some((cut, _)) => &id[..cut],
    | None => id
  }
}

fn write_table<W: Write>(
  mut writer: W,
  headers: Vec<String>,
  rows: Vec<Vec<String>>
) -> anyhow::Result<()> {
  let mut widths = headers
    .iter()
    .map(|header| header.width())
    .collect::<Vec<_>>();

  for row in &rows {
    for (width, cell) in
      widths.iter_mut().zip(row)
    {
      *width = (*width)
        .max(strip_ansi(cell).width());
    }
  }

  write!(writer, " ")?;
  for (header, &width) in
    headers.iter().zip(&widths)
  {
    write!(writer, " {header:width$}")?;
  }
  writeln!(writer)?;

  write!(writer, " ")?;
  for &width in &widths {
    write!(writer, " {:-<width$}", "")?;
  }
  writeln!(writer)?;

  for row in rows {
    write!(writer, " ")?;
    for (cell, &width) in
      row.iter().zip(&widths)
    {
      let visible =
        strip_ansi(cell).width();
      let padding =
        width.saturating_sub(visible);
      write!(
        writer,
        " {cell}{}",
        " ".repeat(padding)
      )?;
    }
    writeln!(writer)?;
  }

  Ok(())
}

fn strip_ansi(s: &str) -> String {
  let mut out =
    String::with_capacity(s.len());
  let mut escaped = false;

  for ch in s.chars() {
    if escaped {
      if ch == 'm' {
        escaped = false;
      }
      continue;
    }

    if ch == '\x1b' {
      escaped = true;
      continue;
    }

    out.push(ch);
  }

  out
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::views::derive_views;

  fn renderer(timezone: Tz) -> Renderer {
    Renderer {
      color: false,
      live: false,
      timezone
    }
  }

  fn task(
    id: &str,
    text: &str,
    completed: bool,
    favorite: bool,
    due_at: &str
  ) -> Task {
    Task {
      id: id.to_string(),
      text: text.to_string(),
      completed,
      favorite,
      due_at: due_at.to_string(),
      ..Task::default()
    }
  }

  fn render(
    tasks: &[Task],
    timezone: Tz
  ) -> String {
    let now = Utc
      .with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
      .single()
      .expect("valid instant");
    let mut out = Vec::new();
    renderer(timezone)
      .write_views(
        &mut out,
        &derive_views(tasks),
        now
      )
      .expect("render");
    String::from_utf8(out).expect("utf8")
  }

  #[test]
  fn empty_favorites_section_is_hidden() {
    let text = render(
      &[task("a1", "milk", false, false, "")],
      chrono_tz::UTC
    );

    assert!(!text.contains("Favorites"));
    assert!(text.contains("Unfinished (1)"));
    assert!(text.contains("Finished (0)"));
    assert!(text.contains("(none)"));
    assert!(text.contains("milk"));
  }

  #[test]
  fn due_dates_use_display_timezone() {
    let text = render(
      &[task(
        "a1",
        "report",
        false,
        true,
        "2026-01-05T08:30:00.000Z"
      )],
      "Asia/Tokyo".parse().expect("tz")
    );

    assert!(text.contains("Favorites (1)"));
    assert!(
      text.contains("2026-01-05 17:30:00")
    );
    assert!(
      text.contains("2026-01-05 18:00:00 (Asia/Tokyo)")
    );
  }

  #[test]
  fn clock_redraws_in_place() {
    let now = Utc
      .with_ymd_and_hms(2026, 1, 5, 9, 0, 1)
      .single()
      .expect("valid instant");
    let mut out = Vec::new();
    renderer("Asia/Tokyo".parse().expect("tz"))
      .write_clock(&mut out, now)
      .expect("clock");
    let text =
      String::from_utf8(out).expect("utf8");

    assert!(text.starts_with(CLEAR_LINE));
    assert!(!text.contains('\n'));
    assert!(
      text.ends_with("2026-01-05 18:00:01 (Asia/Tokyo)")
    );
  }

  #[test]
  fn columns_align_with_wide_text() {
    let mut out = Vec::new();
    write_table(
      &mut out,
      vec!["A".to_string(), "B".to_string()],
      vec![
        vec![
          "\x1b[33m牛乳\x1b[0m".to_string(),
          "x".to_string(),
        ],
        vec!["abc".to_string(), "y".to_string()],
      ]
    )
    .expect("table");
    let text =
      String::from_utf8(out).expect("utf8");
    let lines =
      text.lines().collect::<Vec<_>>();

    assert_eq!(lines[0], "  A    B");
    assert_eq!(
      strip_ansi(lines[2]),
      "  牛乳 x"
    );
    assert_eq!(lines[3], "  abc  y");
  }

  #[test]
  fn short_id_cuts_on_char_boundary() {
    assert_eq!(
      short_id("3f2a9c01-77aa"),
      "3f2a9c01"
    );
    assert_eq!(short_id("abc"), "abc");
    assert_eq!(
      short_id("ééééééééé"),
      "éééééééé"
    );
  }
}

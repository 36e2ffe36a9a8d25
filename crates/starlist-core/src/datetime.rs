use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Duration,
  LocalResult,
  NaiveDateTime,
  Offset,
  SecondsFormat,
  TimeZone,
  Utc
};
use chrono_tz::Tz;

/// Format of a local datetime edit
/// field value.
pub const LOCAL_INPUT_FORMAT: &str =
  "%Y-%m-%dT%H:%M";

pub const DISPLAY_FORMAT: &str =
  "%Y-%m-%d %H:%M:%S";

const LOCAL_INPUT_FORMATS: [&str; 4] = [
  LOCAL_INPUT_FORMAT,
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M",
  "%Y-%m-%d %H:%M:%S"
];

pub fn parse_wire_timestamp(
  raw: &str
) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  DateTime::parse_from_rfc3339(trimmed)
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

/// UTC, millisecond precision, `Z`
/// suffix: `2024-01-01T09:00:00.000Z`.
pub fn format_wire_timestamp(
  dt: DateTime<Utc>
) -> String {
  dt.to_rfc3339_opts(
    SecondsFormat::Millis,
    true
  )
}

/// Renders a wire timestamp as a naive
/// wall-clock value in `timezone`,
/// seconds dropped.
///
/// Empty in, empty out. Unparseable
/// input also yields an empty string so
/// the edit field shows blank.
pub fn to_local_input_value(
  stamp: &str,
  timezone: Tz
) -> String {
  if stamp.is_empty() {
    return String::new();
  }

  match parse_wire_timestamp(stamp) {
    | Some(instant) => {
      instant
        .with_timezone(&timezone)
        .format(LOCAL_INPUT_FORMAT)
        .to_string()
    }
    | None => {
      tracing::warn!(
        stamp,
        "unparseable due timestamp; \
         showing empty field"
      );
      String::new()
    }
  }
}

/// Interprets a naive wall-clock value
/// in `timezone` and returns the wire
/// timestamp. Empty in, empty out.
pub fn from_local_input_value(
  value: &str,
  timezone: Tz
) -> anyhow::Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Ok(String::new());
  }

  let naive =
    parse_local_naive(trimmed)
      .with_context(|| {
        format!(
          "invalid local datetime: \
           {trimmed}"
        )
      })?;
  let instant =
    local_to_utc(naive, timezone)
      .ok_or_else(|| {
        anyhow!(
          "local datetime {trimmed} \
           is out of range in \
           {timezone}"
        )
      })?;

  Ok(format_wire_timestamp(instant))
}

fn parse_local_naive(
  raw: &str
) -> anyhow::Result<NaiveDateTime> {
  for format in LOCAL_INPUT_FORMATS {
    if let Ok(parsed) =
      NaiveDateTime::parse_from_str(
        raw, format
      )
    {
      return Ok(parsed);
    }
  }

  Err(anyhow!(
    "expected YYYY-MM-DDTHH:MM"
  ))
}

/// Maps a wall-clock time to an
/// instant using the offset the
/// timezone database gives for that
/// moment.
///
/// Ambiguous times (clocks turned back)
/// take the earliest instant. Times
/// inside a gap (clocks turned forward)
/// use the offset in force before the
/// gap, landing after it.
pub fn local_to_utc(
  naive: NaiveDateTime,
  timezone: Tz
) -> Option<DateTime<Utc>> {
  match timezone
    .from_local_datetime(&naive)
  {
    | LocalResult::Single(local) => {
      Some(local.with_timezone(&Utc))
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::debug!(
        %naive,
        %timezone,
        "ambiguous local datetime; \
         using earliest"
      );
      let chosen = if first <= second {
        first
      } else {
        second
      };
      Some(chosen.with_timezone(&Utc))
    }
    | LocalResult::None => {
      let probe = naive
        .checked_sub_signed(
          Duration::days(1)
        )?;
      let before = timezone
        .offset_from_utc_datetime(
          &probe
        )
        .fix();
      let utc_naive = naive
        .checked_sub_signed(
          Duration::seconds(i64::from(
            before.local_minus_utc()
          ))
        )?;
      tracing::debug!(
        %naive,
        %timezone,
        "local datetime falls in a \
         gap; shifting past it"
      );
      Some(Utc.from_utc_datetime(
        &utc_naive
      ))
    }
  }
}

pub fn format_local_display(
  instant: DateTime<Utc>,
  timezone: Tz
) -> String {
  instant
    .with_timezone(&timezone)
    .format(DISPLAY_FORMAT)
    .to_string()
}

/// Display form of a wire timestamp,
/// or `None` when it is empty or
/// malformed.
pub fn display_stamp(
  raw: &str,
  timezone: Tz
) -> Option<String> {
  parse_wire_timestamp(raw).map(
    |instant| {
      format_local_display(
        instant, timezone
      )
    }
  )
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(error) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %error,
        "invalid timezone id"
      );
      None
    }
  }
}

/// First valid timezone among
/// `(raw, source)` candidates, in
/// order; UTC when none parse.
pub fn resolve_timezone<'a, I>(
  candidates: I
) -> Tz
where
  I: IntoIterator<
    Item = (Option<&'a str>, &'a str)
  >
{
  for (raw, source) in candidates {
    let Some(raw) = raw else {
      continue;
    };
    if let Some(tz) =
      parse_timezone(raw, source)
    {
      tracing::debug!(
        source,
        timezone = %tz,
        "resolved display timezone"
      );
      return tz;
    }
  }

  tracing::info!(
    "no timezone configured; using UTC"
  );
  chrono_tz::UTC
}

/// Terminal display zone: `--timezone`,
/// config, `TZ` (leading `:` dropped),
/// then the system zone, then UTC.
pub fn terminal_timezone(
  flag: Option<&str>,
  config: Option<&str>,
  tz_env: Option<&str>,
  system: Option<&str>
) -> Tz {
  resolve_timezone([
    (flag, "--timezone"),
    (config, "config"),
    (
      tz_env.map(|tz| tz.trim_start_matches(':')),
      "TZ"
    ),
    (system, "system"),
  ])
}

/// IANA id of the machine's local
/// zone (`/etc/localtime` and the
/// platform equivalents).
#[cfg(feature = "cli")]
pub fn system_timezone() -> Option<String> {
  iana_time_zone::get_timezone()
    .inspect_err(|error| {
      tracing::debug!(
        error = %error,
        "system timezone unavailable"
      );
    })
    .ok()
}

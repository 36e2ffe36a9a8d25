use std::cell::Cell;

use chrono::{
  DateTime,
  Duration,
  Utc
};

/// Source of "now" for overdue checks
/// and the live clock.
pub trait Clock {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(
  Debug, Clone, Copy, Default,
)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A clock that only moves when told
/// to.
#[derive(Debug)]
pub struct ManualClock {
  now: Cell<DateTime<Utc>>
}

impl ManualClock {
  pub fn new(
    start: DateTime<Utc>
  ) -> Self {
    Self {
      now: Cell::new(start)
    }
  }

  pub fn set(
    &self,
    now: DateTime<Utc>
  ) {
    self.now.set(now);
  }

  pub fn advance(
    &self,
    step: Duration
  ) {
    self.now.set(self.now.get() + step);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    self.now.get()
  }
}

impl<C: Clock + ?Sized> Clock for &C {
  fn now(&self) -> DateTime<Utc> {
    (**self).now()
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn manual_clock_moves_only_on_request(
  ) {
    let start = Utc
      .with_ymd_and_hms(
        2024, 1, 1, 9, 0, 0
      )
      .single()
      .expect("valid instant");
    let clock = ManualClock::new(start);

    assert_eq!(clock.now(), start);
    clock.advance(Duration::seconds(1));
    assert_eq!(
      clock.now(),
      start + Duration::seconds(1)
    );
  }
}

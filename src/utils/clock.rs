// src/utils/clock.rs

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use std::sync::{Arc, Mutex};

/// Source of "now" for the attempt lifecycle.
///
/// Production code uses `Clock::System`; tests use `Clock::manual` so that
/// session timeouts and the rolling window can be crossed deterministically.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    #[default]
    System,
    Manual(Arc<Mutex<DateTime<Utc>>>),
}

impl Clock {
    /// Returns a clock pinned at `at` that only moves through `advance`.
    pub fn manual(at: DateTime<Utc>) -> Self {
        Self::Manual(Arc::new(Mutex::new(at)))
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Manual(t) => match t.lock() {
                Ok(guard) => *guard,
                Err(poisoned) => *poisoned.into_inner(),
            },
        }
    }

    /// Moves a manual clock forward. Has no effect on the system clock.
    pub fn advance(&self, delta: Duration) {
        if let Clock::Manual(t) = self {
            let mut guard = match t.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard += delta;
        }
    }
}

/// India Standard Time, the timezone results are displayed in.
fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap_or_else(|| Utc.fix())
}

/// Display date in the en-IN long style, e.g. "16 October 2026".
pub fn display_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&ist()).format("%-d %B %Y").to_string()
}

/// Display time in the en-IN short style, e.g. "02:05 pm".
pub fn display_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&ist()).format("%I:%M %P").to_string()
}

/// Combined IST date and time used by the results export, e.g. "16/10/2026, 02:05 pm".
pub fn display_ist(at: DateTime<Utc>) -> String {
    at.with_timezone(&ist()).format("%d/%m/%Y, %I:%M %P").to_string()
}

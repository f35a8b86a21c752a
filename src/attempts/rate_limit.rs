// src/attempts/rate_limit.rs

use chrono::{DateTime, Duration, Utc};

use crate::config::{ATTEMPT_WINDOW_HOURS, MAX_ATTEMPTS_PER_WINDOW};

/// Rolling-window attempt limit: at most `max_attempts` inside the trailing `window`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub max_attempts: usize,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS_PER_WINDOW,
            window: Duration::hours(ATTEMPT_WINDOW_HOURS),
        }
    }
}

impl RateLimit {
    /// Checks the limit against the given attempt instants.
    ///
    /// Returns `Err(blocked_until)` when the window is full, where
    /// `blocked_until` is the moment the oldest windowed attempt leaves the
    /// window. Instants at or before `now - window` are outside it.
    pub fn check<I>(&self, now: DateTime<Utc>, instants: I) -> Result<(), DateTime<Utc>>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let window_start = now - self.window;

        let mut count = 0;
        let mut oldest: Option<DateTime<Utc>> = None;
        for at in instants.into_iter().filter(|at| *at > window_start) {
            count += 1;
            oldest = Some(oldest.map_or(at, |o| o.min(at)));
        }

        match oldest {
            Some(oldest) if count >= self.max_attempts => Err(oldest + self.window),
            _ => Ok(()),
        }
    }
}

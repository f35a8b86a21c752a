// src/attempts/mod.rs

//! Attempt lifecycle: timed sessions, the rolling rate limit and the
//! background expiry sweep.

pub mod lifecycle;
pub mod rate_limit;
pub mod report;
pub mod sweep;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::store::StoreError;

pub use lifecycle::{AbandonOutcome, AttemptManager, StartedAttempt};
pub use sweep::{SweepHandle, spawn_expiry_sweep};

/// Failures of lifecycle operations. All are recoverable and user-facing
/// except `Store`.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("No active attempt found")]
    NoActiveAttempt,

    #[error("Your quiz session has expired. Please start again.")]
    SessionExpired,

    #[error("You have used all 3 attempts in the last 24 hours.")]
    RateLimitExceeded { blocked_until: DateTime<Utc> },

    #[error("Inactive quiz")]
    QuizInactive,

    #[error("Quiz not found")]
    QuizNotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

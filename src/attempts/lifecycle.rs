// src/attempts/lifecycle.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{AttemptError, rate_limit::RateLimit};
use crate::{
    catalog::Catalog,
    models::attempt::{
        Attempt, AttemptBook, AttemptHistory, AttemptStatus, EndReason, QuizAttempts,
        SessionStatus,
    },
    store::{Shared, Store, StoreError},
    utils::clock::{Clock, display_date, display_time},
};

/// Result of a successful `start_attempt`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedAttempt {
    /// 1-based position of the new record in the history.
    pub attempt_id: usize,
    pub attempt: Attempt,
}

/// Result of `abandon_attempt`; both variants are successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonOutcome {
    Abandoned,
    NothingToDo,
}

/// Owns the attempt book and every transition of the attempt state machine.
///
/// All mutations run as one locked read-modify-write of the whole book, so
/// concurrent starts for the same identity cannot lose each other's records.
pub struct AttemptManager {
    book: Shared<AttemptBook>,
    catalog: Arc<Catalog>,
    clock: Clock,
    timeout: Duration,
    limit: RateLimit,
}

impl AttemptManager {
    pub fn new(store: Arc<dyn Store<AttemptBook>>, catalog: Arc<Catalog>, timeout: Duration) -> Self {
        Self {
            book: Shared::new(store),
            catalog,
            clock: Clock::default(),
            timeout,
            limit: RateLimit::default(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rate_limit(mut self, limit: RateLimit) -> Self {
        self.limit = limit;
        self
    }

    pub fn session_timeout(&self) -> Duration {
        self.timeout
    }

    /// Opens a new in-progress attempt for `(identity, quiz_id)`.
    ///
    /// Stale sessions of the pair are expired first. A younger session that
    /// is still open is closed as abandoned, so exactly one record is in
    /// progress afterwards.
    pub async fn start_attempt(
        &self,
        identity: &str,
        quiz_id: &str,
    ) -> Result<StartedAttempt, AttemptError> {
        let quiz = self
            .catalog
            .get_quiz(quiz_id)
            .await?
            .ok_or(AttemptError::QuizNotFound)?;
        if !quiz.active {
            return Err(AttemptError::QuizInactive);
        }

        let now = self.clock.now();
        let mut book = self.book.begin().await?;

        let outcome = {
            let history = book
                .entry(identity.to_string())
                .or_default()
                .entry(quiz_id.to_string())
                .or_default();

            let expired = expire_stale(history, now, self.timeout);

            match self.limit.check(now, window_instants(history, None)) {
                Err(blocked_until) => Err((blocked_until, expired > 0)),
                Ok(()) => {
                    for open in history.0.iter_mut().filter(|a| a.is_in_progress()) {
                        close_unsubmitted(open, now, EndReason::Abandoned);
                    }

                    let attempt = Attempt {
                        status: AttemptStatus::InProgress,
                        abandoned: false,
                        end_reason: None,
                        score: None,
                        passed: false,
                        started_at: Some(now),
                        timestamp: Some(now),
                        finished_at: None,
                        expired_at: None,
                        date: display_date(now),
                        time: display_time(now),
                        attempt_number: history.0.len() as u32 + 1,
                    };
                    history.0.push(attempt.clone());

                    Ok(StartedAttempt {
                        attempt_id: history.0.len(),
                        attempt,
                    })
                }
            }
        };

        match outcome {
            Ok(started) => {
                book.commit().await?;
                tracing::info!(
                    "Attempt {} started: identity={} quiz={}",
                    started.attempt_id,
                    identity,
                    quiz_id
                );
                Ok(started)
            }
            Err((blocked_until, changed)) => {
                if changed {
                    book.commit().await?;
                }
                tracing::info!(
                    "Attempt limit reached: identity={} quiz={} blocked_until={}",
                    identity,
                    quiz_id,
                    blocked_until
                );
                Err(AttemptError::RateLimitExceeded { blocked_until })
            }
        }
    }

    /// Closes the open attempt of the pair, if any. Safe to call from
    /// fire-and-forget clients: a missing attempt is not an error.
    pub async fn abandon_attempt(
        &self,
        identity: &str,
        quiz_id: &str,
    ) -> Result<AbandonOutcome, AttemptError> {
        let now = self.clock.now();
        let mut book = self.book.begin().await?;

        let closed = match history_mut(&mut book, identity, quiz_id).and_then(|h| h.active_mut()) {
            Some(active) => {
                let reason = if active.is_stale(now, self.timeout) {
                    EndReason::TimedOut
                } else {
                    EndReason::Abandoned
                };
                close_unsubmitted(active, now, reason);
                true
            }
            None => false,
        };

        if !closed {
            return Ok(AbandonOutcome::NothingToDo);
        }

        book.commit().await?;
        tracing::info!("Attempt abandoned: identity={} quiz={}", identity, quiz_id);
        Ok(AbandonOutcome::Abandoned)
    }

    /// Finalizes the open attempt of the pair with `score` (percent).
    ///
    /// A session older than the timeout is closed as expired and the call
    /// fails with `SessionExpired`.
    pub async fn submit_attempt(
        &self,
        identity: &str,
        quiz_id: &str,
        score: f64,
    ) -> Result<Attempt, AttemptError> {
        if !score.is_finite() || !(0.0..=100.0).contains(&score) {
            return Err(AttemptError::InvalidInput(
                "Score must be a number between 0 and 100".to_string(),
            ));
        }

        let quiz = self
            .catalog
            .get_quiz(quiz_id)
            .await?
            .ok_or(AttemptError::QuizNotFound)?;
        let threshold = quiz.passing_percentage();

        let now = self.clock.now();
        let mut book = self.book.begin().await?;

        let history =
            history_mut(&mut book, identity, quiz_id).ok_or(AttemptError::NoActiveAttempt)?;
        let index = history
            .0
            .iter()
            .position(Attempt::is_in_progress)
            .ok_or(AttemptError::NoActiveAttempt)?;

        if history.0[index].is_stale(now, self.timeout) {
            let active = &mut history.0[index];
            close_unsubmitted(active, now, EndReason::TimedOut);
            active.timestamp = Some(now);
            book.commit().await?;
            tracing::info!(
                "Submit after session timeout: identity={} quiz={}",
                identity,
                quiz_id
            );
            return Err(AttemptError::SessionExpired);
        }

        if let Err(blocked_until) = self.limit.check(now, window_instants(history, Some(index))) {
            return Err(AttemptError::RateLimitExceeded { blocked_until });
        }

        let active = &mut history.0[index];
        active.status = AttemptStatus::Completed;
        active.abandoned = false;
        active.end_reason = None;
        active.score = Some(score);
        active.passed = score >= threshold;
        active.timestamp = Some(now);
        active.finished_at = Some(now);
        active.date = display_date(now);
        active.time = display_time(now);
        let finalized = active.clone();

        book.commit().await?;
        tracing::info!(
            "Attempt {} recorded: identity={} quiz={} score={} passed={}",
            finalized.attempt_number,
            identity,
            quiz_id,
            score,
            finalized.passed
        );
        Ok(finalized)
    }

    /// Session state of the pair, for client polling. Never mutates.
    pub async fn status_of(&self, identity: &str, quiz_id: &str) -> Result<SessionStatus, StoreError> {
        let now = self.clock.now();
        let book = self.book.snapshot().await?;

        let Some(history) = book.get(identity).and_then(|q| q.get(quiz_id)) else {
            return Ok(SessionStatus::None);
        };
        if history.0.is_empty() {
            return Ok(SessionStatus::None);
        }

        Ok(match history.active() {
            Some(active) if !active.is_stale(now, self.timeout) => SessionStatus::Active,
            _ => SessionStatus::Expired,
        })
    }

    /// Every history of one identity, keyed by quiz id.
    pub async fn list_attempts(&self, identity: &str) -> Result<QuizAttempts, StoreError> {
        let mut book = self.book.snapshot().await?;
        Ok(book.remove(identity).unwrap_or_default())
    }

    /// The whole attempt book.
    pub async fn list_all_attempts(&self) -> Result<AttemptBook, StoreError> {
        self.book.snapshot().await
    }

    /// Expires every in-progress attempt older than the session timeout.
    ///
    /// Writes the book only when something changed; returns how many
    /// attempts were expired.
    pub async fn run_expiry_sweep(&self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let mut book = self.book.begin().await?;

        let expired: usize = book
            .values_mut()
            .flat_map(|quizzes| quizzes.values_mut())
            .map(|history| expire_stale(history, now, self.timeout))
            .sum();

        if expired > 0 {
            book.commit().await?;
            tracing::info!("Expired {} abandoned quiz sessions", expired);
        }
        Ok(expired)
    }
}

fn history_mut<'a>(
    book: &'a mut AttemptBook,
    identity: &str,
    quiz_id: &str,
) -> Option<&'a mut AttemptHistory> {
    book.get_mut(identity).and_then(|q| q.get_mut(quiz_id))
}

/// Instants counted by the rate limit, optionally leaving one record out.
fn window_instants(
    history: &AttemptHistory,
    skip: Option<usize>,
) -> impl Iterator<Item = DateTime<Utc>> + '_ {
    history
        .0
        .iter()
        .enumerate()
        .filter(move |(i, _)| Some(*i) != skip)
        .filter_map(|(_, a)| a.timestamp)
}

/// Closes every stale session in `history`; returns how many were closed.
fn expire_stale(history: &mut AttemptHistory, now: DateTime<Utc>, timeout: Duration) -> usize {
    let mut expired = 0;
    for attempt in history.0.iter_mut().filter(|a| a.is_stale(now, timeout)) {
        close_unsubmitted(attempt, now, EndReason::TimedOut);
        expired += 1;
    }
    expired
}

/// Terminal transition for attempts that end without a submit.
fn close_unsubmitted(attempt: &mut Attempt, now: DateTime<Utc>, reason: EndReason) {
    attempt.status = AttemptStatus::Expired;
    attempt.abandoned = true;
    attempt.end_reason = Some(reason);
    attempt.passed = false;
    attempt.score = Some(0.0);
    attempt.expired_at = Some(now);
}

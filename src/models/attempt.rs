// src/models/attempt.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a single attempt.
///
/// Records written before sessions were tracked carry no status; they were
/// always finished attempts, hence the `Completed` default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptStatus {
    InProgress,
    #[default]
    Completed,
    Expired,
}

/// Why an attempt ended as `expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The session outlived the timeout.
    TimedOut,
    /// The client signalled it left the quiz.
    Abandoned,
}

/// One timed pass at a quiz by one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    #[serde(default)]
    pub status: AttemptStatus,

    /// Set for every attempt that ended without a submit.
    #[serde(default)]
    pub abandoned: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,

    /// Percentage score; `None` until the attempt is finalized.
    #[serde(default)]
    pub score: Option<f64>,

    #[serde(default)]
    pub passed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Start time, replaced by the finalization time. The rate-limit window
    /// is measured against this instant.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<DateTime<Utc>>,

    /// Display date (IST).
    #[serde(default)]
    pub date: String,

    /// Display time (IST).
    #[serde(default)]
    pub time: String,

    #[serde(default = "first_attempt")]
    pub attempt_number: u32,
}

fn first_attempt() -> u32 {
    1
}

impl Attempt {
    pub fn is_in_progress(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }

    /// True when the attempt is in progress and its session is older than `timeout`.
    /// Records without a start time never go stale.
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.is_in_progress()
            && self
                .started_at
                .is_some_and(|started| now.signed_duration_since(started) > timeout)
    }
}

/// The shape an attempt list had before attempts were kept per number:
/// a single finished record.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyAttempt {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl From<LegacyAttempt> for Attempt {
    fn from(legacy: LegacyAttempt) -> Self {
        Attempt {
            status: AttemptStatus::Completed,
            abandoned: false,
            end_reason: None,
            score: legacy.score,
            passed: legacy.passed,
            started_at: None,
            timestamp: legacy.timestamp,
            finished_at: legacy.timestamp,
            expired_at: None,
            date: legacy.date.unwrap_or_default(),
            time: legacy.time.unwrap_or_default(),
            attempt_number: 1,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryRepr {
    List(Vec<Attempt>),
    Legacy(LegacyAttempt),
}

/// Ordered attempts of one identity at one quiz.
///
/// Deserialization accepts the legacy single-object form and normalizes it to
/// a one-element list; serialization always writes the list form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HistoryRepr")]
pub struct AttemptHistory(pub Vec<Attempt>);

impl From<HistoryRepr> for AttemptHistory {
    fn from(repr: HistoryRepr) -> Self {
        match repr {
            HistoryRepr::List(list) => AttemptHistory(list),
            HistoryRepr::Legacy(legacy) => AttemptHistory(vec![legacy.into()]),
        }
    }
}

impl AttemptHistory {
    pub fn active(&self) -> Option<&Attempt> {
        self.0.iter().find(|a| a.is_in_progress())
    }

    pub fn active_mut(&mut self) -> Option<&mut Attempt> {
        self.0.iter_mut().find(|a| a.is_in_progress())
    }
}

/// quiz id -> history, for one identity.
pub type QuizAttempts = BTreeMap<String, AttemptHistory>;

/// identity -> quiz id -> history. Persisted as `attempts.json`.
pub type AttemptBook = BTreeMap<String, QuizAttempts>;

/// Session state reported to polling clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    None,
    Active,
    Expired,
}

/// DTO for starting or abandoning an attempt.
///
/// `token` lets page-unload beacons, which cannot set headers, authenticate
/// through the body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptRequest {
    pub quiz_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// DTO for submitting a finished attempt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    pub quiz_id: Option<String>,
    pub score: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_single_object_becomes_one_element_list() {
        let raw = json!({
            "alice": {
                "q1": {
                    "score": 80.0,
                    "passed": true,
                    "timestamp": "2026-10-01T10:00:00Z",
                    "date": "1 October 2026",
                    "time": "03:30 pm"
                }
            }
        });

        let book: AttemptBook = serde_json::from_value(raw).unwrap();
        let history = &book["alice"]["q1"];
        assert_eq!(history.0.len(), 1);

        let attempt = &history.0[0];
        assert_eq!(attempt.attempt_number, 1);
        assert_eq!(attempt.status, AttemptStatus::Completed);
        assert_eq!(attempt.score, Some(80.0));
        assert!(attempt.passed);
        assert_eq!(attempt.date, "1 October 2026");
        assert_eq!(attempt.time, "03:30 pm");
        assert_eq!(
            attempt.timestamp.unwrap().to_rfc3339(),
            "2026-10-01T10:00:00+00:00"
        );

        // Written back in list form.
        let written = serde_json::to_value(&book).unwrap();
        assert!(written["alice"]["q1"].is_array());
    }

    #[test]
    fn list_form_is_read_as_is() {
        let raw = json!([
            {
                "status": "expired",
                "abandoned": true,
                "endReason": "timed_out",
                "score": 0.0,
                "passed": false,
                "startedAt": "2026-10-01T10:00:00Z",
                "timestamp": "2026-10-01T10:00:00Z",
                "date": "1 October 2026",
                "time": "03:30 pm",
                "attemptNumber": 1
            },
            {
                "status": "in-progress",
                "score": null,
                "startedAt": "2026-10-01T11:00:00Z",
                "timestamp": "2026-10-01T11:00:00Z",
                "attemptNumber": 2
            }
        ]);

        let history: AttemptHistory = serde_json::from_value(raw).unwrap();
        assert_eq!(history.0.len(), 2);
        assert_eq!(history.0[0].end_reason, Some(EndReason::TimedOut));
        assert_eq!(history.active().unwrap().attempt_number, 2);
    }

    #[test]
    fn staleness_is_strictly_older_than_timeout() {
        let started: DateTime<Utc> = "2026-10-01T10:00:00Z".parse().unwrap();
        let attempt = Attempt {
            status: AttemptStatus::InProgress,
            abandoned: false,
            end_reason: None,
            score: None,
            passed: false,
            started_at: Some(started),
            timestamp: Some(started),
            finished_at: None,
            expired_at: None,
            date: String::new(),
            time: String::new(),
            attempt_number: 1,
        };
        let timeout = chrono::Duration::minutes(15);

        assert!(!attempt.is_stale(started + timeout, timeout));
        assert!(attempt.is_stale(started + timeout + chrono::Duration::seconds(1), timeout));
    }
}

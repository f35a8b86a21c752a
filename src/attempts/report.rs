// src/attempts/report.rs

//! Flattened attempt results for the admin / manager export.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{models::attempt::AttemptBook, utils::clock::display_ist};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdentityKind {
    Seller,
    Student,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    /// Seller ids are shown upper-cased, usernames as registered.
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: IdentityKind,
    pub attempt_number: usize,
    pub score: f64,
    /// "Pass" or "Fail".
    pub status: &'static str,
    /// IST display of the attempt's timestamp.
    pub timestamp: String,
    pub date: String,
    pub time: String,
    #[serde(skip)]
    sort_key: Option<DateTime<Utc>>,
}

/// Every attempt at `quiz_id`, newest first.
pub fn results_rows(book: &AttemptBook, quiz_id: &str, sellers: &HashSet<String>) -> Vec<ResultRow> {
    let mut rows = Vec::new();

    for (identity, by_quiz) in book {
        let Some(history) = by_quiz.get(quiz_id) else {
            continue;
        };
        let (kind, user_id) = if sellers.contains(identity) {
            (IdentityKind::Seller, identity.to_uppercase())
        } else {
            (IdentityKind::Student, identity.clone())
        };

        for (index, attempt) in history.0.iter().enumerate() {
            rows.push(ResultRow {
                user_id: user_id.clone(),
                kind,
                attempt_number: index + 1,
                score: attempt.score.unwrap_or(0.0),
                status: if attempt.passed { "Pass" } else { "Fail" },
                timestamp: attempt.timestamp.map(display_ist).unwrap_or_default(),
                date: if attempt.date.is_empty() {
                    "Unknown".to_string()
                } else {
                    attempt.date.clone()
                },
                time: attempt.time.clone(),
                sort_key: attempt.timestamp,
            });
        }
    }

    // Undated legacy rows sort last.
    rows.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
    rows
}

/// Renders rows as CSV with the export's column set.
pub fn to_csv(rows: &[ResultRow]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    wtr.write_record(["MCID", "Attempt #", "Score (%)", "Status", "Timestamp"])?;
    for row in rows {
        let attempt_number = row.attempt_number.to_string();
        let score = row.score.to_string();
        wtr.write_record([
            row.user_id.as_str(),
            attempt_number.as_str(),
            score.as_str(),
            row.status,
            row.timestamp.as_str(),
        ])?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book() -> AttemptBook {
        serde_json::from_value(json!({
            "alice": {
                "q1": [
                    { "status": "completed", "score": 40.0, "passed": false,
                      "timestamp": "2026-10-01T10:00:00Z", "date": "1 October 2026", "time": "03:30 pm" },
                    { "status": "completed", "score": 80.0, "passed": true,
                      "timestamp": "2026-10-03T10:00:00Z", "date": "3 October 2026", "time": "03:30 pm" }
                ]
            },
            "amzn12345678": {
                "q1": { "score": 65.0, "passed": true,
                        "timestamp": "2026-10-02T10:00:00Z", "date": "2 October 2026", "time": "03:30 pm" },
                "q2": [ { "score": 10.0 } ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn rows_are_newest_first_with_seller_ids_upper_cased() {
        let sellers: HashSet<String> = ["amzn12345678".to_string()].into();
        let rows = results_rows(&book(), "q1", &sellers);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].user_id, "alice");
        assert_eq!(rows[0].attempt_number, 2);
        assert_eq!(rows[0].status, "Pass");
        assert_eq!(rows[1].user_id, "AMZN12345678");
        assert_eq!(rows[1].kind, IdentityKind::Seller);
        assert_eq!(rows[1].attempt_number, 1);
        assert_eq!(rows[2].status, "Fail");
        assert_eq!(rows[2].timestamp, "01/10/2026, 03:30 pm");
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let sellers = HashSet::new();
        let bytes = to_csv(&results_rows(&book(), "q1", &sellers)).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(lines[0], "MCID,Attempt #,Score (%),Status,Timestamp");
        assert_eq!(lines[1], "alice,2,80,Pass,\"03/10/2026, 03:30 pm\"");
        assert_eq!(lines.len(), 5);
    }
}

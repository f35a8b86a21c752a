// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{DEFAULT_PASSING_PERCENTAGE, DEFAULT_QUESTIONS_TO_SHOW};

/// Question kinds the player knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleSelect,
    MultiSelect,
    Integer,
    Text,
}

/// Correct answer: a single value, or a list for `multi_select`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Question {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub section: String,

    /// The prompt shown to the player.
    #[validate(length(min = 1, max = 2000))]
    pub text: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,

    pub correct: CorrectAnswer,
}

/// Stored quiz, as persisted in `quizzes.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions_to_show: Option<usize>,

    #[serde(
        rename = "passpercentage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pass_percentage: Option<f64>,

    #[serde(default)]
    pub questions: Vec<Question>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Quiz {
    /// Passing threshold in percent.
    pub fn passing_percentage(&self) -> f64 {
        self.pass_percentage.unwrap_or(DEFAULT_PASSING_PERCENTAGE)
    }

    /// Number of questions sampled into one attempt.
    pub fn sample_size(&self) -> usize {
        match self.questions_to_show {
            Some(n) if n > 0 => n,
            _ => DEFAULT_QUESTIONS_TO_SHOW,
        }
    }
}

/// Entry of the public quiz list.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
}

/// Per-quiz aggregate shown on the manager dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStats {
    pub id: String,
    pub title: String,
    pub questions_count: usize,
    pub total_attempts: usize,
    pub unique_users: usize,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// `0` is what a blank form field sends; it means "use the default".
    #[validate(range(max = 500))]
    pub questions_to_show: Option<usize>,
    #[serde(rename = "passpercentage")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub pass_percentage: Option<f64>,
    #[validate(nested)]
    pub questions: Vec<Question>,
}

/// DTO for updating a quiz. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(range(max = 500))]
    pub questions_to_show: Option<usize>,
    #[serde(rename = "passpercentage")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub pass_percentage: Option<f64>,
    #[validate(nested)]
    pub questions: Option<Vec<Question>>,
    pub active: Option<bool>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_quiz_written_by_the_admin_form() {
        let quiz: Quiz = serde_json::from_value(json!({
            "id": "1760000000000",
            "title": "Safety basics",
            "questionsToShow": 2,
            "passpercentage": 70,
            "questions": [
                {
                    "section": "A",
                    "text": "Pick one",
                    "type": "single_select",
                    "options": ["x", "y"],
                    "correct": "x"
                },
                {
                    "section": "A",
                    "text": "Pick many",
                    "type": "multi_select",
                    "options": ["x", "y", "z"],
                    "correct": ["x", "z"]
                }
            ]
        }))
        .unwrap();

        assert!(quiz.active);
        assert_eq!(quiz.passing_percentage(), 70.0);
        assert_eq!(quiz.sample_size(), 2);
        assert_eq!(
            quiz.questions[1].correct,
            CorrectAnswer::Many(vec!["x".into(), "z".into()])
        );
    }

    #[test]
    fn defaults_apply_when_unset() {
        let quiz: Quiz = serde_json::from_value(json!({
            "id": "1",
            "title": "Empty",
            "questionsToShow": 0
        }))
        .unwrap();

        assert_eq!(quiz.passing_percentage(), DEFAULT_PASSING_PERCENTAGE);
        assert_eq!(quiz.sample_size(), DEFAULT_QUESTIONS_TO_SHOW);
    }
}

// src/catalog.rs

//! Quiz catalog over `quizzes.json`.

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use rand::{Rng, seq::SliceRandom};

use crate::{
    models::{
        attempt::AttemptBook,
        quiz::{CreateQuizRequest, Question, Quiz, QuizStats, QuizSummary, UpdateQuizRequest},
    },
    store::{Shared, Store, StoreError},
    utils::html::strip_tags,
};

pub struct Catalog {
    quizzes: Shared<Vec<Quiz>>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store<Vec<Quiz>>>) -> Self {
        Self {
            quizzes: Shared::new(store),
        }
    }

    /// Looks a quiz up by id.
    pub async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, StoreError> {
        let quizzes = self.quizzes.snapshot().await?;
        Ok(quizzes.into_iter().find(|q| q.id == id))
    }

    /// Id and title of every active quiz.
    pub async fn list_active(&self) -> Result<Vec<QuizSummary>, StoreError> {
        let quizzes = self.quizzes.snapshot().await?;
        Ok(quizzes
            .into_iter()
            .filter(|q| q.active)
            .map(|q| QuizSummary {
                id: q.id,
                title: q.title,
            })
            .collect())
    }

    pub async fn list_all(&self) -> Result<Vec<Quiz>, StoreError> {
        self.quizzes.snapshot().await
    }

    /// Creates an active quiz. The id is the creation time in milliseconds,
    /// bumped until unique.
    pub async fn create(&self, req: CreateQuizRequest) -> Result<Quiz, StoreError> {
        let mut quizzes = self.quizzes.begin().await?;

        let taken: HashSet<&str> = quizzes.iter().map(|q| q.id.as_str()).collect();
        let mut stamp = Utc::now().timestamp_millis();
        while taken.contains(stamp.to_string().as_str()) {
            stamp += 1;
        }

        let quiz = Quiz {
            id: stamp.to_string(),
            title: strip_tags(&req.title),
            questions_to_show: req.questions_to_show.filter(|&n| n > 0),
            pass_percentage: req.pass_percentage,
            questions: sanitize_questions(req.questions),
            active: true,
        };
        quizzes.push(quiz.clone());
        quizzes.commit().await?;

        tracing::info!("Quiz created: id={} title={}", quiz.id, quiz.title);
        Ok(quiz)
    }

    /// Applies the present fields of `req`. Returns `None` if the quiz does not exist.
    pub async fn update(&self, id: &str, req: UpdateQuizRequest) -> Result<Option<Quiz>, StoreError> {
        let mut quizzes = self.quizzes.begin().await?;

        let Some(quiz) = quizzes.iter_mut().find(|q| q.id == id) else {
            return Ok(None);
        };

        if let Some(title) = req.title {
            quiz.title = strip_tags(&title);
        }
        if let Some(n) = req.questions_to_show {
            quiz.questions_to_show = Some(n).filter(|&n| n > 0);
        }
        if let Some(p) = req.pass_percentage {
            quiz.pass_percentage = Some(p);
        }
        if let Some(questions) = req.questions {
            quiz.questions = sanitize_questions(questions);
        }
        if let Some(active) = req.active {
            quiz.active = active;
        }
        let updated = quiz.clone();

        quizzes.commit().await?;
        tracing::info!("Quiz updated: id={} active={}", updated.id, updated.active);
        Ok(Some(updated))
    }

    /// Removes a quiz. Attempt history for it is kept. Returns `false` if it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut quizzes = self.quizzes.begin().await?;

        let Some(index) = quizzes.iter().position(|q| q.id == id) else {
            return Ok(false);
        };
        quizzes.remove(index);
        quizzes.commit().await?;

        tracing::info!("Quiz deleted: id={}", id);
        Ok(true)
    }
}

/// Strips markup from sections and prompts. Options and correct answers are
/// compared verbatim and stay untouched.
fn sanitize_questions(questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .map(|q| Question {
            section: strip_tags(q.section.trim()),
            text: strip_tags(q.text.trim()),
            ..q
        })
        .collect()
}

/// The quiz as a player receives it: `sample_size` questions drawn at random,
/// each with its options shuffled.
pub fn player_view<R: Rng + ?Sized>(quiz: &Quiz, rng: &mut R) -> Quiz {
    let mut questions = quiz.questions.clone();
    questions.shuffle(rng);
    questions.truncate(quiz.sample_size());
    for q in &mut questions {
        q.options.shuffle(rng);
    }

    Quiz {
        questions,
        ..quiz.clone()
    }
}

/// Attempt totals and distinct identities for every active quiz.
pub fn quiz_stats(quizzes: &[Quiz], book: &AttemptBook) -> Vec<QuizStats> {
    quizzes
        .iter()
        .filter(|q| q.active)
        .map(|quiz| {
            let mut total_attempts = 0;
            let mut unique_users = 0;
            for history in book.values().filter_map(|by_quiz| by_quiz.get(&quiz.id)) {
                total_attempts += history.0.len();
                unique_users += 1;
            }

            QuizStats {
                id: quiz.id.clone(),
                title: quiz.title.clone(),
                questions_count: quiz.questions.len(),
                total_attempts,
                unique_users,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DEFAULT_QUESTIONS_TO_SHOW,
        models::quiz::{CorrectAnswer, QuestionType},
        store::MemoryStore,
    };
    use rand::{SeedableRng, rngs::StdRng};
    use serde_json::json;

    fn question(i: usize) -> Question {
        Question {
            section: "S".to_string(),
            text: format!("Question {}", i),
            question_type: QuestionType::SingleSelect,
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct: CorrectAnswer::One("a".into()),
        }
    }

    fn create_request(title: &str) -> CreateQuizRequest {
        CreateQuizRequest {
            title: title.to_string(),
            questions_to_show: Some(3),
            pass_percentage: Some(75.0),
            questions: (0..5).map(question).collect(),
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(Arc::new(MemoryStore::new(Vec::<Quiz>::new())))
    }

    #[tokio::test]
    async fn create_update_delete() {
        let catalog = catalog();

        let quiz = catalog.create(create_request("Fire safety")).await.unwrap();
        assert!(quiz.active);
        assert_eq!(catalog.get_quiz(&quiz.id).await.unwrap(), Some(quiz.clone()));

        let update = UpdateQuizRequest {
            title: None,
            questions_to_show: None,
            pass_percentage: Some(50.0),
            questions: None,
            active: Some(false),
        };
        let updated = catalog.update(&quiz.id, update).await.unwrap().unwrap();
        assert_eq!(updated.title, "Fire safety");
        assert_eq!(updated.passing_percentage(), 50.0);
        assert!(catalog.list_active().await.unwrap().is_empty());
        assert_eq!(catalog.list_all().await.unwrap().len(), 1);

        assert!(catalog.delete(&quiz.id).await.unwrap());
        assert!(!catalog.delete(&quiz.id).await.unwrap());
        assert!(catalog.get_quiz(&quiz.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_are_unique_within_one_millisecond() {
        let catalog = catalog();
        let a = catalog.create(create_request("A")).await.unwrap();
        let b = catalog.create(create_request("B")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn update_of_missing_quiz_is_none() {
        let update = UpdateQuizRequest {
            title: Some("x".into()),
            questions_to_show: None,
            pass_percentage: None,
            questions: None,
            active: None,
        };
        assert!(catalog().update("missing", update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn titles_are_sanitized() {
        let quiz = catalog()
            .create(create_request("Quiz<script>alert(1)</script>"))
            .await
            .unwrap();
        assert_eq!(quiz.title, "Quiz");
    }

    #[tokio::test]
    async fn zero_sample_size_is_stored_as_unset() {
        let mut req = create_request("Blank");
        req.questions_to_show = Some(0);

        let quiz = catalog().create(req).await.unwrap();

        assert_eq!(quiz.questions_to_show, None);
        assert_eq!(quiz.sample_size(), DEFAULT_QUESTIONS_TO_SHOW);
    }

    #[tokio::test]
    async fn quiz_text_is_stored_as_typed() {
        let mut req = create_request("Q&A: 3 < 5");
        req.questions[0].section = "Fees & Charges".to_string();
        req.questions[0].text = "Is 3 < 5?".to_string();

        let quiz = catalog().create(req).await.unwrap();

        assert_eq!(quiz.title, "Q&A: 3 < 5");
        assert_eq!(quiz.questions[0].section, "Fees & Charges");
        assert_eq!(quiz.questions[0].text, "Is 3 < 5?");
    }

    #[test]
    fn player_view_samples_and_shuffles() {
        let quiz = Quiz {
            id: "1".into(),
            title: "T".into(),
            questions_to_show: Some(3),
            pass_percentage: None,
            questions: (0..5).map(question).collect(),
            active: true,
        };
        let mut rng = StdRng::seed_from_u64(7);

        let view = player_view(&quiz, &mut rng);
        assert_eq!(view.questions.len(), 3);
        for q in &view.questions {
            assert!(quiz.questions.iter().any(|orig| orig.text == q.text));
            let mut options = q.options.clone();
            options.sort();
            assert_eq!(options, vec!["a", "b", "c", "d"]);
        }
    }

    #[test]
    fn stats_count_attempts_and_identities() {
        let quizzes = vec![
            Quiz {
                id: "q1".into(),
                title: "One".into(),
                questions_to_show: None,
                pass_percentage: None,
                questions: (0..4).map(question).collect(),
                active: true,
            },
            Quiz {
                id: "q2".into(),
                title: "Hidden".into(),
                questions_to_show: None,
                pass_percentage: None,
                questions: Vec::new(),
                active: false,
            },
        ];
        let book: AttemptBook = serde_json::from_value(json!({
            "alice": { "q1": [ { "score": 10.0 }, { "score": 20.0 } ] },
            "bob": { "q1": { "score": 70.0, "passed": true } },
            "carol": { "q2": [ { "score": 10.0 } ] }
        }))
        .unwrap();

        let stats = quiz_stats(&quizzes, &book);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].questions_count, 4);
        assert_eq!(stats[0].total_attempts, 3);
        assert_eq!(stats[0].unique_users, 2);
    }
}

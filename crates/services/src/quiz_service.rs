use std::sync::Arc;

use lms_core::model::{
    Answer, AnswerId, CourseId, DirectoryId, Question, QuestionId, QuestionKind, Quiz, QuizId,
};
use storage::repository::{QuizRepository, StorageError};

use crate::auth::{Actor, AuthPolicy};
use crate::error::QuizServiceError;

/// Orchestrates quiz, question and answer authoring.
#[derive(Clone)]
pub struct QuizService {
    policy: AuthPolicy,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>) -> Self {
        Self {
            policy: AuthPolicy::new(),
            quizzes,
        }
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Auth` for non-staff actors, plus
    /// validation and storage errors.
    pub async fn create_quiz(
        &self,
        actor: Actor,
        id: QuizId,
        name: String,
        description: Option<String>,
        directory: Option<DirectoryId>,
        course_id: Option<CourseId>,
    ) -> Result<Quiz, QuizServiceError> {
        self.policy.ensure_staff(actor)?;
        let quiz = Quiz::new(id, name, description, directory, course_id)?;
        self.quizzes.upsert_quiz(&quiz).await?;
        Ok(quiz)
    }

    /// Update an existing quiz in place.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Auth` for non-staff actors,
    /// `QuizServiceError::Storage` when the quiz does not exist, plus
    /// validation errors.
    pub async fn edit_quiz(
        &self,
        actor: Actor,
        id: QuizId,
        name: String,
        description: Option<String>,
        directory: Option<DirectoryId>,
        course_id: Option<CourseId>,
    ) -> Result<Quiz, QuizServiceError> {
        self.policy.ensure_staff(actor)?;
        self.quizzes.get_quiz(id).await?;
        let quiz = Quiz::new(id, name, description, directory, course_id)?;
        self.quizzes.upsert_quiz(&quiz).await?;
        Ok(quiz)
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Auth` for non-staff actors, or storage
    /// errors.
    pub async fn delete_quiz(&self, actor: Actor, id: QuizId) -> Result<(), QuizServiceError> {
        self.policy.ensure_staff(actor)?;
        self.quizzes.delete_quiz(id).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if missing or on repository
    /// failures.
    pub async fn get_quiz(&self, id: QuizId) -> Result<Quiz, QuizServiceError> {
        Ok(self.quizzes.get_quiz(id).await?)
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Auth` for non-staff actors, plus
    /// validation and storage errors.
    pub async fn add_question(
        &self,
        actor: Actor,
        id: QuestionId,
        quiz_id: QuizId,
        text: String,
        kind: QuestionKind,
    ) -> Result<Question, QuizServiceError> {
        self.policy.ensure_staff(actor)?;
        // reject questions pointing at a missing quiz
        self.quizzes.get_quiz(quiz_id).await?;
        let question = Question::new(id, quiz_id, text, kind)?;
        self.quizzes.upsert_question(&question).await?;
        Ok(question)
    }

    /// Rewrite a question's text or kind, keeping it on its quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Auth` for non-staff actors,
    /// `QuizServiceError::Storage` when the question is not on the quiz,
    /// plus validation errors.
    pub async fn update_question(
        &self,
        actor: Actor,
        id: QuestionId,
        quiz_id: QuizId,
        text: String,
        kind: QuestionKind,
    ) -> Result<Question, QuizServiceError> {
        self.policy.ensure_staff(actor)?;
        let existing = self.quizzes.questions_for_quiz(quiz_id).await?;
        if !existing.iter().any(|q| q.id() == id) {
            return Err(QuizServiceError::Storage(StorageError::NotFound));
        }
        let question = Question::new(id, quiz_id, text, kind)?;
        self.quizzes.upsert_question(&question).await?;
        Ok(question)
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Auth` for non-staff actors, or storage
    /// errors.
    pub async fn delete_question(
        &self,
        actor: Actor,
        id: QuestionId,
    ) -> Result<(), QuizServiceError> {
        self.policy.ensure_staff(actor)?;
        self.quizzes.delete_question(id).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Auth` for non-staff actors, plus
    /// validation and storage errors.
    pub async fn add_answer(
        &self,
        actor: Actor,
        id: AnswerId,
        question_id: QuestionId,
        text: String,
        is_correct: bool,
    ) -> Result<Answer, QuizServiceError> {
        self.policy.ensure_staff(actor)?;
        let answer = Answer::new(id, question_id, text, is_correct)?;
        self.quizzes.upsert_answer(&answer).await?;
        Ok(answer)
    }

    /// Rewrite an answer's text or correctness, keeping it on its question.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Auth` for non-staff actors,
    /// `QuizServiceError::Storage` when the answer is not on the question,
    /// plus validation errors.
    pub async fn update_answer(
        &self,
        actor: Actor,
        id: AnswerId,
        question_id: QuestionId,
        text: String,
        is_correct: bool,
    ) -> Result<Answer, QuizServiceError> {
        self.policy.ensure_staff(actor)?;
        let existing = self.quizzes.answers_for_question(question_id).await?;
        if !existing.iter().any(|a| a.id() == id) {
            return Err(QuizServiceError::Storage(StorageError::NotFound));
        }
        let answer = Answer::new(id, question_id, text, is_correct)?;
        self.quizzes.upsert_answer(&answer).await?;
        Ok(answer)
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Auth` for non-staff actors, or storage
    /// errors.
    pub async fn delete_answer(&self, actor: Actor, id: AnswerId) -> Result<(), QuizServiceError> {
        self.policy.ensure_staff(actor)?;
        self.quizzes.delete_answer(id).await?;
        Ok(())
    }

    /// Questions with their answers, in attempt order.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on repository failures.
    pub async fn quiz_content(
        &self,
        quiz_id: QuizId,
    ) -> Result<Vec<(Question, Vec<Answer>)>, QuizServiceError> {
        let questions = self.quizzes.questions_for_quiz(quiz_id).await?;
        let mut out = Vec::with_capacity(questions.len());
        for question in questions {
            let answers = self.quizzes.answers_for_question(question.id()).await?;
            out.push((question, answers));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::UserId;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn authoring_requires_staff() {
        let repo = InMemoryRepository::new();
        let service = QuizService::new(Arc::new(repo));
        let err = service
            .create_quiz(
                Actor::learner(UserId::new(1)),
                QuizId::new(1),
                "Basics".to_owned(),
                None,
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::Auth(_)));
    }

    #[tokio::test]
    async fn question_requires_existing_quiz() {
        let repo = InMemoryRepository::new();
        let service = QuizService::new(Arc::new(repo));
        let staff = Actor::staff(UserId::new(1));

        let err = service
            .add_question(
                staff,
                QuestionId::new(1),
                QuizId::new(99),
                "2 + 2 = ?".to_owned(),
                QuestionKind::Single,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::Storage(_)));
    }

    #[tokio::test]
    async fn editing_reshapes_quiz_question_and_answer() {
        let repo = InMemoryRepository::new();
        let service = QuizService::new(Arc::new(repo));
        let staff = Actor::staff(UserId::new(1));

        service
            .create_quiz(staff, QuizId::new(1), "Basics".to_owned(), None, None, None)
            .await
            .unwrap();
        service
            .add_question(
                staff,
                QuestionId::new(1),
                QuizId::new(1),
                "2 + 2 = ?".to_owned(),
                QuestionKind::Single,
            )
            .await
            .unwrap();
        service
            .add_answer(staff, AnswerId::new(1), QuestionId::new(1), "5".to_owned(), true)
            .await
            .unwrap();

        let quiz = service
            .edit_quiz(
                staff,
                QuizId::new(1),
                "Arithmetic basics".to_owned(),
                Some("warm-up".to_owned()),
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(quiz.name(), "Arithmetic basics");

        let question = service
            .update_question(
                staff,
                QuestionId::new(1),
                QuizId::new(1),
                "What is 2 + 2?".to_owned(),
                QuestionKind::Single,
            )
            .await
            .unwrap();
        assert_eq!(question.text(), "What is 2 + 2?");

        let answer = service
            .update_answer(staff, AnswerId::new(1), QuestionId::new(1), "4".to_owned(), true)
            .await
            .unwrap();
        assert_eq!(answer.text(), "4");

        // still exactly one question with one answer
        let content = service.quiz_content(QuizId::new(1)).await.unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0].1.len(), 1);
    }

    #[tokio::test]
    async fn editing_missing_records_is_rejected() {
        let repo = InMemoryRepository::new();
        let service = QuizService::new(Arc::new(repo));
        let staff = Actor::staff(UserId::new(1));

        let err = service
            .edit_quiz(staff, QuizId::new(9), "Ghost".to_owned(), None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::Storage(_)));

        service
            .create_quiz(staff, QuizId::new(1), "Basics".to_owned(), None, None, None)
            .await
            .unwrap();
        let err = service
            .update_question(
                staff,
                QuestionId::new(9),
                QuizId::new(1),
                "?".to_owned(),
                QuestionKind::Single,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::Storage(StorageError::NotFound)));

        let err = service
            .update_answer(staff, AnswerId::new(9), QuestionId::new(9), "x".to_owned(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::Storage(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn quiz_content_pairs_questions_with_answers() {
        let repo = InMemoryRepository::new();
        let service = QuizService::new(Arc::new(repo));
        let staff = Actor::staff(UserId::new(1));

        service
            .create_quiz(staff, QuizId::new(1), "Basics".to_owned(), None, None, None)
            .await
            .unwrap();
        service
            .add_question(
                staff,
                QuestionId::new(1),
                QuizId::new(1),
                "2 + 2 = ?".to_owned(),
                QuestionKind::Single,
            )
            .await
            .unwrap();
        service
            .add_answer(staff, AnswerId::new(1), QuestionId::new(1), "4".to_owned(), true)
            .await
            .unwrap();
        service
            .add_answer(staff, AnswerId::new(2), QuestionId::new(1), "5".to_owned(), false)
            .await
            .unwrap();

        let content = service.quiz_content(QuizId::new(1)).await.unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0].1.len(), 2);
    }
}

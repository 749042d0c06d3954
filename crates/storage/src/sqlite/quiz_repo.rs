use lms_core::model::{Answer, AnswerId, DirectoryId, Question, QuestionId, Quiz, QuizId};

use super::{
    SqliteRepository,
    mapping::{map_answer_row, map_question_row, map_quiz_row, opt_to_i64, to_i64},
};
use crate::repository::{QuizRepository, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quizzes (id, name, description, directory_id, course_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                directory_id = excluded.directory_id,
                course_id = excluded.course_id
            ",
        )
        .bind(to_i64("quiz_id", quiz.id().value())?)
        .bind(quiz.name())
        .bind(quiz.description())
        .bind(opt_to_i64("directory_id", quiz.directory().map(|d| d.value()))?)
        .bind(opt_to_i64("course_id", quiz.course_id().map(|c| c.value()))?)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError> {
        let row = sqlx::query(
            "SELECT id, name, description, directory_id, course_id FROM quizzes WHERE id = ?1",
        )
        .bind(to_i64("quiz_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_quiz_row(&row)
    }

    async fn quizzes_by_ids(&self, ids: &[QuizId]) -> Result<Vec<Quiz>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            "SELECT id, name, description, directory_id, course_id FROM quizzes WHERE id IN (",
        );
        for i in 0..ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(") ORDER BY id");

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(to_i64("quiz_id", id.value())?);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in rows {
            quizzes.push(map_quiz_row(&row)?);
        }
        Ok(quizzes)
    }

    async fn quizzes_in_directory(
        &self,
        directory: DirectoryId,
    ) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, directory_id, course_id
            FROM quizzes
            WHERE directory_id = ?1
            ORDER BY id
            ",
        )
        .bind(to_i64("directory_id", directory.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in rows {
            quizzes.push(map_quiz_row(&row)?);
        }
        Ok(quizzes)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        // questions and answers cascade
        let done = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(to_i64("quiz_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO questions (id, quiz_id, text, kind)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                quiz_id = excluded.quiz_id,
                text = excluded.text,
                kind = excluded.kind
            ",
        )
        .bind(to_i64("question_id", question.id().value())?)
        .bind(to_i64("quiz_id", question.quiz_id().value())?)
        .bind(question.text())
        .bind(question.kind().as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn questions_for_quiz(&self, quiz: QuizId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, quiz_id, text, kind FROM questions WHERE quiz_id = ?1 ORDER BY id",
        )
        .bind(to_i64("quiz_id", quiz.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(map_question_row(&row)?);
        }
        Ok(questions)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let done = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(to_i64("question_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn upsert_answer(&self, answer: &Answer) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO answers (id, question_id, text, is_correct)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                question_id = excluded.question_id,
                text = excluded.text,
                is_correct = excluded.is_correct
            ",
        )
        .bind(to_i64("answer_id", answer.id().value())?)
        .bind(to_i64("question_id", answer.question_id().value())?)
        .bind(answer.text())
        .bind(answer.is_correct())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn answers_for_question(
        &self,
        question: QuestionId,
    ) -> Result<Vec<Answer>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, question_id, text, is_correct FROM answers WHERE question_id = ?1 ORDER BY id",
        )
        .bind(to_i64("question_id", question.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut answers = Vec::with_capacity(rows.len());
        for row in rows {
            answers.push(map_answer_row(&row)?);
        }
        Ok(answers)
    }

    async fn delete_answer(&self, id: AnswerId) -> Result<(), StorageError> {
        let done = sqlx::query("DELETE FROM answers WHERE id = ?1")
            .bind(to_i64("answer_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

use lms_core::model::{QuizResult, QuizResultId, UserAnswer, UserId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_quiz_result_row, map_user_answer_row, ser, to_i64},
};
use crate::repository::{QuizResultRepository, StorageError};

#[async_trait::async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<QuizResultId, StorageError> {
        let row = sqlx::query(
            r"
            INSERT INTO quiz_results (
                user_id, quiz_title, score, total_questions, percent, passed, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id
            ",
        )
        .bind(to_i64("user_id", result.user().value())?)
        .bind(result.quiz_title())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(i64::from(result.percent()))
        .bind(result.passed())
        .bind(result.completed_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let raw: i64 = row.try_get("id").map_err(ser)?;
        let value = u64::try_from(raw)
            .map_err(|_| StorageError::Serialization("quiz_result_id sign overflow".into()))?;
        Ok(QuizResultId::new(value))
    }

    async fn results_for_user(&self, user: UserId) -> Result<Vec<QuizResult>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, quiz_title, score, total_questions, percent, passed, completed_at
            FROM quiz_results
            WHERE user_id = ?1
            ORDER BY completed_at DESC, id DESC
            ",
        )
        .bind(to_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let (_, result) = map_quiz_result_row(&row)?;
            out.push(result);
        }
        Ok(out)
    }

    async fn passed_quiz_titles(&self, user: UserId) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT quiz_title
            FROM quiz_results
            WHERE user_id = ?1 AND passed = 1
            ORDER BY quiz_title
            ",
        )
        .bind(to_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut titles = Vec::with_capacity(rows.len());
        for row in rows {
            titles.push(row.try_get::<String, _>("quiz_title").map_err(ser)?);
        }
        Ok(titles)
    }

    async fn has_passed(&self, user: UserId, quiz_title: &str) -> Result<bool, StorageError> {
        let row = sqlx::query(
            "SELECT 1 FROM quiz_results WHERE user_id = ?1 AND quiz_title = ?2 AND passed = 1",
        )
        .bind(to_i64("user_id", user.value())?)
        .bind(quiz_title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn append_user_answer(&self, answer: &UserAnswer) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_answers (user_id, quiz_result_id, question_id, answer_id, is_correct)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(to_i64("user_id", answer.user().value())?)
        .bind(to_i64("quiz_result_id", answer.quiz_result().value())?)
        .bind(to_i64("question_id", answer.question().value())?)
        .bind(to_i64("answer_id", answer.selected_answer().value())?)
        .bind(answer.is_correct())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn answers_for_result(
        &self,
        result: QuizResultId,
    ) -> Result<Vec<UserAnswer>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, quiz_result_id, question_id, answer_id, is_correct
            FROM user_answers
            WHERE quiz_result_id = ?1
            ORDER BY id
            ",
        )
        .bind(to_i64("quiz_result_id", result.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_user_answer_row(&row)?);
        }
        Ok(out)
    }
}

use lms_core::model::{CourseId, UserId, UserLessonTrajectory};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{lesson_id_from_i64, ser, to_i64},
};
use crate::repository::{StorageError, TrajectoryRepository};

#[async_trait::async_trait]
impl TrajectoryRepository for SqliteRepository {
    async fn get_trajectory(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<UserLessonTrajectory>, StorageError> {
        let rows = sqlx::query(
            "SELECT lesson_id FROM trajectory_lessons \
             WHERE user_id = ?1 AND course_id = ?2 ORDER BY lesson_id",
        )
        .bind(to_i64("user_id", user.value())?)
        .bind(to_i64("course_id", course.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut lesson_ids = Vec::with_capacity(rows.len());
        for row in rows {
            lesson_ids.push(lesson_id_from_i64(
                row.try_get::<i64, _>("lesson_id").map_err(ser)?,
            )?);
        }
        Ok(Some(UserLessonTrajectory::new(user, course, lesson_ids)))
    }

    async fn set_trajectory(
        &self,
        trajectory: &UserLessonTrajectory,
    ) -> Result<(), StorageError> {
        let user_id = to_i64("user_id", trajectory.user().value())?;
        let course_id = to_i64("course_id", trajectory.course().value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM trajectory_lessons WHERE user_id = ?1 AND course_id = ?2")
            .bind(user_id)
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for lesson in trajectory.lesson_ids() {
            sqlx::query(
                "INSERT INTO trajectory_lessons (user_id, course_id, lesson_id) \
                 VALUES (?1, ?2, ?3)",
            )
            .bind(user_id)
            .bind(course_id)
            .bind(to_i64("lesson_id", lesson.value())?)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn clear_trajectory(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM trajectory_lessons WHERE user_id = ?1 AND course_id = ?2")
            .bind(to_i64("user_id", user.value())?)
            .bind(to_i64("course_id", course.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use lms_core::model::{CourseId, UserCourse, UserId, UserProgress};

use super::{
    SqliteRepository,
    mapping::{map_user_course_row, map_user_progress_row, opt_to_i64, to_i64},
};
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn upsert_enrollment(&self, enrollment: &UserCourse) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_courses (
                user_id, course_id, started_at, completed_at,
                is_completed, animation_shown, exp_eligible
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(user_id, course_id) DO UPDATE SET
                -- keep started_at from the original insert; only update mutable fields
                completed_at = excluded.completed_at,
                is_completed = excluded.is_completed,
                animation_shown = excluded.animation_shown,
                exp_eligible = excluded.exp_eligible
            ",
        )
        .bind(to_i64("user_id", enrollment.user().value())?)
        .bind(to_i64("course_id", enrollment.course().value())?)
        .bind(enrollment.started_at())
        .bind(enrollment.completed_at())
        .bind(enrollment.is_completed())
        .bind(enrollment.animation_shown())
        .bind(enrollment.exp_eligible())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_enrollment(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<UserCourse>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, course_id, started_at, completed_at,
                   is_completed, animation_shown, exp_eligible
            FROM user_courses
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(to_i64("user_id", user.value())?)
        .bind(to_i64("course_id", course.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.map(|r| map_user_course_row(&r)).transpose()
    }

    async fn enrollments_for_user(&self, user: UserId) -> Result<Vec<UserCourse>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, course_id, started_at, completed_at,
                   is_completed, animation_shown, exp_eligible
            FROM user_courses
            WHERE user_id = ?1
            ORDER BY course_id
            ",
        )
        .bind(to_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_user_course_row(&row)?);
        }
        Ok(out)
    }

    async fn complete_course_once(
        &self,
        user: UserId,
        course: CourseId,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        // Single conditional UPDATE: the gate flips for exactly one caller.
        let done = sqlx::query(
            r"
            UPDATE user_courses
            SET animation_shown = 1,
                is_completed = 1,
                completed_at = COALESCE(completed_at, ?3)
            WHERE user_id = ?1 AND course_id = ?2 AND animation_shown = 0
            ",
        )
        .bind(to_i64("user_id", user.value())?)
        .bind(to_i64("course_id", course.value())?)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if done.rows_affected() > 0 {
            return Ok(true);
        }

        // Gate already flipped, or no such enrollment.
        match self.get_enrollment(user, course).await? {
            Some(_) => Ok(false),
            None => Err(StorageError::NotFound),
        }
    }

    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let user_id = to_i64("user_id", progress.user().value())?;
        let lesson_id = to_i64("lesson_id", progress.lesson().value())?;
        let course_id = opt_to_i64("course_id", progress.course().map(|c| c.value()))?;

        // Rows are keyed by (user, lesson, course); `course_id IS ?` matches
        // the NULL (no course) row too, which an ON CONFLICT target cannot.
        let updated = sqlx::query(
            r"
            UPDATE user_progress
            -- completed never regresses
            SET completed = MAX(completed, ?4)
            WHERE user_id = ?1 AND lesson_id = ?2 AND course_id IS ?3
            ",
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(course_id)
        .bind(progress.is_completed())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r"
                INSERT INTO user_progress (user_id, lesson_id, course_id, completed)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(user_id)
            .bind(lesson_id)
            .bind(course_id)
            .bind(progress.is_completed())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }
        Ok(())
    }

    async fn progress_for_user(&self, user: UserId) -> Result<Vec<UserProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, lesson_id, course_id, completed
            FROM user_progress
            WHERE user_id = ?1
            ORDER BY lesson_id, course_id
            ",
        )
        .bind(to_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_user_progress_row(&row)?);
        }
        Ok(out)
    }
}

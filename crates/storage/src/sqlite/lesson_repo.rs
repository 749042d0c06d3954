use lms_core::model::{CourseId, DirectoryId, Lesson, LessonId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{course_id_from_i64, map_lesson_row, opt_to_i64, ser, to_i64},
};
use crate::repository::{LessonRepository, StorageError};

impl SqliteRepository {
    async fn hydrate_lesson(&self, mut lesson: Lesson) -> Result<Lesson, StorageError> {
        let rows = sqlx::query(
            "SELECT course_id FROM lesson_courses WHERE lesson_id = ?1 ORDER BY course_id",
        )
        .bind(to_i64("lesson_id", lesson.id().value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut course_ids = Vec::with_capacity(rows.len());
        for row in rows {
            course_ids.push(course_id_from_i64(
                row.try_get::<i64, _>("course_id").map_err(ser)?,
            )?);
        }
        lesson.set_courses(course_ids);
        Ok(lesson)
    }

    async fn hydrate_lessons(&self, rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Lesson>, StorageError> {
        let mut lessons = Vec::with_capacity(rows.len());
        for row in rows {
            lessons.push(self.hydrate_lesson(map_lesson_row(&row)?).await?);
        }
        Ok(lessons)
    }
}

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let lesson_id = to_i64("lesson_id", lesson.id().value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO lessons (id, title, content, video_id, ord, directory_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                video_id = excluded.video_id,
                ord = excluded.ord,
                directory_id = excluded.directory_id
            ",
        )
        .bind(lesson_id)
        .bind(lesson.title())
        .bind(lesson.content())
        .bind(lesson.video_id().map(|v| v.as_str().to_owned()))
        .bind(i64::from(lesson.order()))
        .bind(opt_to_i64("directory_id", lesson.directory().map(|d| d.value()))?)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM lesson_courses WHERE lesson_id = ?1")
            .bind(lesson_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for course in lesson.course_ids() {
            sqlx::query("INSERT INTO lesson_courses (lesson_id, course_id) VALUES (?1, ?2)")
                .bind(lesson_id)
                .bind(to_i64("course_id", course.value())?)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, StorageError> {
        let row = sqlx::query(
            "SELECT id, title, content, video_id, ord, directory_id FROM lessons WHERE id = ?1",
        )
        .bind(to_i64("lesson_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        self.hydrate_lesson(map_lesson_row(&row)?).await
    }

    async fn lessons_for_course(&self, course: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT l.id, l.title, l.content, l.video_id, l.ord, l.directory_id
            FROM lessons l
            JOIN lesson_courses lc ON lc.lesson_id = l.id
            WHERE lc.course_id = ?1
            ORDER BY l.ord, l.id
            ",
        )
        .bind(to_i64("course_id", course.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        self.hydrate_lessons(rows).await
    }

    async fn lessons_by_ids(&self, ids: &[LessonId]) -> Result<Vec<Lesson>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            "SELECT id, title, content, video_id, ord, directory_id FROM lessons WHERE id IN (",
        );
        for i in 0..ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(") ORDER BY ord, id");

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(to_i64("lesson_id", id.value())?);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        self.hydrate_lessons(rows).await
    }

    async fn max_order(&self, directory: Option<DirectoryId>) -> Result<u32, StorageError> {
        let row = match directory {
            Some(dir) => {
                sqlx::query("SELECT MAX(ord) AS max_ord FROM lessons WHERE directory_id = ?1")
                    .bind(to_i64("directory_id", dir.value())?)
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT MAX(ord) AS max_ord FROM lessons WHERE directory_id IS NULL")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let max: Option<i64> = row.try_get("max_ord").map_err(ser)?;
        match max {
            Some(v) => u32::try_from(v)
                .map_err(|_| StorageError::Serialization(format!("invalid ord: {v}"))),
            None => Ok(0),
        }
    }

    async fn lessons_in_directory(
        &self,
        directory: DirectoryId,
    ) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, content, video_id, ord, directory_id
            FROM lessons
            WHERE directory_id = ?1
            ORDER BY ord, id
            ",
        )
        .bind(to_i64("directory_id", directory.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        self.hydrate_lessons(rows).await
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        let done = sqlx::query("DELETE FROM lessons WHERE id = ?1")
            .bind(to_i64("lesson_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

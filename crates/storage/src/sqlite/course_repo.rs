use lms_core::model::{Course, CourseId, GroupId, UserId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_course_row, opt_to_i64, quiz_id_from_i64, ser, to_i64},
};
use crate::repository::{CourseRepository, StorageError};

impl SqliteRepository {
    /// Loads quiz and group association rows into a mapped course.
    async fn hydrate_course(&self, mut course: Course) -> Result<Course, StorageError> {
        let course_id = to_i64("course_id", course.id().value())?;

        let quiz_rows = sqlx::query(
            "SELECT quiz_id FROM course_quizzes WHERE course_id = ?1 ORDER BY quiz_id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut quiz_ids = Vec::with_capacity(quiz_rows.len());
        for row in quiz_rows {
            quiz_ids.push(quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?);
        }
        course.set_quizzes(quiz_ids);

        let group_rows = sqlx::query(
            "SELECT group_id FROM course_groups WHERE course_id = ?1 ORDER BY group_id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut group_ids = Vec::with_capacity(group_rows.len());
        for row in group_rows {
            let raw = row.try_get::<i64, _>("group_id").map_err(ser)?;
            let value = u64::try_from(raw)
                .map_err(|_| StorageError::Serialization("group_id sign overflow".into()))?;
            group_ids.push(GroupId::new(value));
        }
        course.set_groups(group_ids);

        Ok(course)
    }
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let course_id = to_i64("course_id", course.id().value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO courses (
                id, title, description, author_id, slug, image,
                directory_id, final_quiz_id, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                -- keep created_at from the original insert; only update mutable fields
                title = excluded.title,
                description = excluded.description,
                author_id = excluded.author_id,
                slug = excluded.slug,
                image = excluded.image,
                directory_id = excluded.directory_id,
                final_quiz_id = excluded.final_quiz_id
            ",
        )
        .bind(course_id)
        .bind(course.title())
        .bind(course.description())
        .bind(to_i64("author_id", course.author().value())?)
        .bind(course.slug())
        .bind(course.image())
        .bind(opt_to_i64("directory_id", course.directory().map(|d| d.value()))?)
        .bind(opt_to_i64("final_quiz_id", course.final_quiz().map(|q| q.value()))?)
        .bind(course.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM course_quizzes WHERE course_id = ?1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for quiz in course.quiz_ids() {
            sqlx::query("INSERT INTO course_quizzes (course_id, quiz_id) VALUES (?1, ?2)")
                .bind(course_id)
                .bind(to_i64("quiz_id", quiz.value())?)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        sqlx::query("DELETE FROM course_groups WHERE course_id = ?1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for group in course.group_ids() {
            sqlx::query("INSERT INTO course_groups (course_id, group_id) VALUES (?1, ?2)")
                .bind(course_id)
                .bind(to_i64("group_id", group.value())?)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Course, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, author_id, slug, image,
                   directory_id, final_quiz_id, created_at
            FROM courses
            WHERE id = ?1
            ",
        )
        .bind(to_i64("course_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        self.hydrate_course(map_course_row(&row)?).await
    }

    async fn get_course_by_slug(&self, slug: &str) -> Result<Course, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, author_id, slug, image,
                   directory_id, final_quiz_id, created_at
            FROM courses
            WHERE slug = ?1
            ",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        self.hydrate_course(map_course_row(&row)?).await
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, author_id, slug, image,
                   directory_id, final_quiz_id, created_at
            FROM courses
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            courses.push(self.hydrate_course(map_course_row(&row)?).await?);
        }
        Ok(courses)
    }

    async fn courses_for_group(&self, group: GroupId) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.title, c.description, c.author_id, c.slug, c.image,
                   c.directory_id, c.final_quiz_id, c.created_at
            FROM courses c
            JOIN course_groups cg ON cg.course_id = c.id
            WHERE cg.group_id = ?1
            ORDER BY c.id
            ",
        )
        .bind(to_i64("group_id", group.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            courses.push(self.hydrate_course(map_course_row(&row)?).await?);
        }
        Ok(courses)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM courses WHERE slug = ?1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn find_by_title_author(
        &self,
        title: &str,
        author: UserId,
    ) -> Result<Option<CourseId>, StorageError> {
        let row = sqlx::query("SELECT id FROM courses WHERE title = ?1 AND author_id = ?2")
            .bind(title)
            .bind(to_i64("author_id", author.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.map(|r| {
            let raw = r.try_get::<i64, _>("id").map_err(ser)?;
            let value = u64::try_from(raw)
                .map_err(|_| StorageError::Serialization("course_id sign overflow".into()))?;
            Ok(CourseId::new(value))
        })
        .transpose()
    }

    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError> {
        let done = sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(to_i64("course_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

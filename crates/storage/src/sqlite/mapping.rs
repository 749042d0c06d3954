use lms_core::model::{
    Answer, AnswerId, Course, CourseId, Directory, DirectoryId, Lesson, LessonId, Question,
    QuestionId, QuestionKind, Quiz, QuizId, QuizResult, QuizResultId, UserAnswer, UserCourse,
    UserId, UserProgress, VideoId,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn answer_id_from_i64(v: i64) -> Result<AnswerId, StorageError> {
    Ok(AnswerId::new(i64_to_u64("answer_id", v)?))
}

pub(crate) fn directory_id_from_i64(v: i64) -> Result<DirectoryId, StorageError> {
    Ok(DirectoryId::new(i64_to_u64("directory_id", v)?))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn opt_directory_id(v: Option<i64>) -> Result<Option<DirectoryId>, StorageError> {
    v.map(directory_id_from_i64).transpose()
}

pub(crate) fn opt_to_i64(
    field: &'static str,
    v: Option<u64>,
) -> Result<Option<i64>, StorageError> {
    v.map(|v| to_i64(field, v)).transpose()
}

pub(crate) fn parse_question_kind(s: &str) -> Result<QuestionKind, StorageError> {
    match s {
        "single" => Ok(QuestionKind::Single),
        "multiple" => Ok(QuestionKind::Multiple),
        _ => Err(StorageError::Serialization(format!(
            "invalid question kind: {s}"
        ))),
    }
}

/// Maps a `courses` row. Quiz and group association rows are loaded
/// separately and applied by the caller.
pub(crate) fn map_course_row(row: &sqlx::sqlite::SqliteRow) -> Result<Course, StorageError> {
    let final_quiz = row
        .try_get::<Option<i64>, _>("final_quiz_id")
        .map_err(ser)?
        .map(quiz_id_from_i64)
        .transpose()?;

    Course::new(
        course_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        user_id_from_i64(row.try_get::<i64, _>("author_id").map_err(ser)?)?,
        row.try_get::<String, _>("slug").map_err(ser)?,
        row.try_get::<Option<String>, _>("image").map_err(ser)?,
        opt_directory_id(row.try_get::<Option<i64>, _>("directory_id").map_err(ser)?)?,
        final_quiz,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

/// Maps a `lessons` row. Course association rows are applied by the caller.
pub(crate) fn map_lesson_row(row: &sqlx::sqlite::SqliteRow) -> Result<Lesson, StorageError> {
    let video_id = row
        .try_get::<Option<String>, _>("video_id")
        .map_err(ser)?
        .map(VideoId::from_persisted)
        .transpose()
        .map_err(ser)?;

    Lesson::new(
        lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("content").map_err(ser)?,
        video_id,
        i64_to_u32("ord", row.try_get::<i64, _>("ord").map_err(ser)?)?,
        opt_directory_id(row.try_get::<Option<i64>, _>("directory_id").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_quiz_row(row: &sqlx::sqlite::SqliteRow) -> Result<Quiz, StorageError> {
    let course_id = row
        .try_get::<Option<i64>, _>("course_id")
        .map_err(ser)?
        .map(course_id_from_i64)
        .transpose()?;

    Quiz::new(
        quiz_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        opt_directory_id(row.try_get::<Option<i64>, _>("directory_id").map_err(ser)?)?,
        course_id,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let kind: String = row.try_get("kind").map_err(ser)?;
    Question::new(
        question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?,
        row.try_get::<String, _>("text").map_err(ser)?,
        parse_question_kind(&kind)?,
    )
    .map_err(ser)
}

pub(crate) fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<Answer, StorageError> {
    Answer::new(
        answer_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        row.try_get::<String, _>("text").map_err(ser)?,
        row.try_get::<bool, _>("is_correct").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_directory_row(row: &sqlx::sqlite::SqliteRow) -> Result<Directory, StorageError> {
    Directory::new(
        directory_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        opt_directory_id(row.try_get::<Option<i64>, _>("parent_id").map_err(ser)?)?,
        i64_to_u32("ord", row.try_get::<i64, _>("ord").map_err(ser)?)?,
    )
    .map_err(ser)
}

pub(crate) fn map_user_course_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<UserCourse, StorageError> {
    Ok(UserCourse::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        row.try_get::<bool, _>("is_completed").map_err(ser)?,
        row.try_get::<bool, _>("animation_shown").map_err(ser)?,
        row.try_get::<bool, _>("exp_eligible").map_err(ser)?,
    ))
}

pub(crate) fn map_user_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<UserProgress, StorageError> {
    let user = user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?;
    let lesson = lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?;
    let course = row
        .try_get::<Option<i64>, _>("course_id")
        .map_err(ser)?
        .map(course_id_from_i64)
        .transpose()?;

    if row.try_get::<bool, _>("completed").map_err(ser)? {
        Ok(UserProgress::completed(user, lesson, course))
    } else {
        Ok(UserProgress::viewed(user, lesson, course))
    }
}

pub(crate) fn map_quiz_result_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(QuizResultId, QuizResult), StorageError> {
    let id = QuizResultId::new(i64_to_u64(
        "quiz_result_id",
        row.try_get::<i64, _>("id").map_err(ser)?,
    )?);

    let result = QuizResult::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        row.try_get::<String, _>("quiz_title").map_err(ser)?,
        i64_to_u32("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        i64_to_u32(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        i64_to_u32("percent", row.try_get::<i64, _>("percent").map_err(ser)?)?,
        row.try_get::<bool, _>("passed").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    );

    Ok((id, result))
}

pub(crate) fn map_user_answer_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<UserAnswer, StorageError> {
    Ok(UserAnswer::new(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        QuizResultId::new(i64_to_u64(
            "quiz_result_id",
            row.try_get::<i64, _>("quiz_result_id").map_err(ser)?,
        )?),
        question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        answer_id_from_i64(row.try_get::<i64, _>("answer_id").map_err(ser)?)?,
        row.try_get::<bool, _>("is_correct").map_err(ser)?,
    ))
}

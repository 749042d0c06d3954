use thiserror::Error;

use crate::attempt::AttemptError;
use crate::model::course::CourseError;
use crate::model::directory::DirectoryError;
use crate::model::lesson::LessonError;
use crate::model::quiz::QuizError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
}

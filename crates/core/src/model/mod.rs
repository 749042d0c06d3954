//! Domain model: courses, lessons, quizzes, knowledge-base directories and
//! the per-user records derived from them.

pub mod course;
pub mod directory;
pub mod enrollment;
pub mod ids;
pub mod lesson;
pub mod progress;
pub mod quiz;
pub mod quiz_result;
pub mod trajectory;

pub use course::{Course, CourseError};
pub use directory::{Directory, DirectoryError};
pub use enrollment::{UserCourse, UserProgress};
pub use ids::{
    AnswerId, CourseId, DirectoryId, GroupId, LessonId, ParseIdError, QuestionId, QuizId,
    QuizResultId, UserId,
};
pub use lesson::{Lesson, LessonError, VideoId};
pub use progress::CourseProgress;
pub use quiz::{Answer, Question, QuestionKind, Quiz, QuizError};
pub use quiz_result::{PASS_THRESHOLD, QuizResult, UserAnswer};
pub use trajectory::UserLessonTrajectory;

#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CourseRepository, DirectoryRepository, EnrollmentRepository, InMemoryRepository,
    LessonRepository, ProfileRepository, QuizRepository, QuizResultRepository, Storage,
    StorageError, TrajectoryRepository,
};
pub use sqlite::{SqliteInitError, SqliteRepository};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lms_core::model::{
    Answer, AnswerId, Course, CourseId, Directory, DirectoryId, GroupId, Lesson, LessonId,
    Question, QuestionId, Quiz, QuizId, QuizResult, QuizResultId, UserAnswer, UserCourse, UserId,
    UserLessonTrajectory, UserProgress,
};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for courses and their quiz/group associations.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or update a course, including its quiz and group sets.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_course(&self, id: CourseId) -> Result<Course, StorageError>;

    /// Fetch a course by slug.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_course_by_slug(&self, slug: &str) -> Result<Course, StorageError>;

    /// All courses, ordered by id.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Courses auto-assigned to the given group.
    async fn courses_for_group(&self, group: GroupId) -> Result<Vec<Course>, StorageError>;

    /// Whether any course already uses this slug.
    async fn slug_exists(&self, slug: &str) -> Result<bool, StorageError>;

    /// The course (if any) with this exact title by this author.
    async fn find_by_title_author(
        &self,
        title: &str,
        author: UserId,
    ) -> Result<Option<CourseId>, StorageError>;

    /// Delete a course and its association rows.
    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError>;
}

/// Repository contract for lessons.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Fetch a lesson by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, StorageError>;

    /// Lessons attached to a course, ordered by (order, id).
    async fn lessons_for_course(&self, course: CourseId) -> Result<Vec<Lesson>, StorageError>;

    /// Fetch the listed lessons, ordered by (order, id). Ids with no backing
    /// lesson are silently skipped.
    async fn lessons_by_ids(&self, ids: &[LessonId]) -> Result<Vec<Lesson>, StorageError>;

    /// Highest order value among lessons in the given directory scope.
    async fn max_order(&self, directory: Option<DirectoryId>) -> Result<u32, StorageError>;

    /// Lessons filed under a knowledge-base directory, ordered by (order, id).
    async fn lessons_in_directory(
        &self,
        directory: DirectoryId,
    ) -> Result<Vec<Lesson>, StorageError>;

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError>;
}

/// Repository contract for quizzes, questions and answers.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError>;

    /// Fetch the listed quizzes, ordered by id. Missing ids are skipped.
    async fn quizzes_by_ids(&self, ids: &[QuizId]) -> Result<Vec<Quiz>, StorageError>;

    /// Quizzes filed under a knowledge-base directory, ordered by id.
    async fn quizzes_in_directory(&self, directory: DirectoryId)
    -> Result<Vec<Quiz>, StorageError>;

    /// Delete a quiz; its questions and answers go with it.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Questions of a quiz in ascending id order — the order attempts walk.
    async fn questions_for_quiz(&self, quiz: QuizId) -> Result<Vec<Question>, StorageError>;

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;

    async fn upsert_answer(&self, answer: &Answer) -> Result<(), StorageError>;

    /// Answers of a question in ascending id order.
    async fn answers_for_question(
        &self,
        question: QuestionId,
    ) -> Result<Vec<Answer>, StorageError>;

    async fn delete_answer(&self, id: AnswerId) -> Result<(), StorageError>;
}

/// Repository contract for knowledge-base directories.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn upsert_directory(&self, directory: &Directory) -> Result<(), StorageError>;

    /// Fetch a directory by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_directory(&self, id: DirectoryId) -> Result<Directory, StorageError>;

    /// Children of the given node (or root nodes for `None`), ordered by
    /// (order, name).
    async fn children_of(
        &self,
        parent: Option<DirectoryId>,
    ) -> Result<Vec<Directory>, StorageError>;

    async fn all_directories(&self) -> Result<Vec<Directory>, StorageError>;

    /// Delete a single node. Callers are responsible for relocating or
    /// removing children first.
    async fn delete_directory(&self, id: DirectoryId) -> Result<(), StorageError>;
}

/// Repository contract for per-(user, course) lesson trajectories.
#[async_trait]
pub trait TrajectoryRepository: Send + Sync {
    /// The user's curated trajectory within the course, if one exists.
    /// Absence means the full course lesson set applies.
    async fn get_trajectory(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<UserLessonTrajectory>, StorageError>;

    /// Replace the (user, course) trajectory wholesale.
    async fn set_trajectory(&self, trajectory: &UserLessonTrajectory)
    -> Result<(), StorageError>;

    async fn clear_trajectory(&self, user: UserId, course: CourseId)
    -> Result<(), StorageError>;
}

/// Repository contract for enrollments and lesson progress rows.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn upsert_enrollment(&self, enrollment: &UserCourse) -> Result<(), StorageError>;

    async fn get_enrollment(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<UserCourse>, StorageError>;

    async fn enrollments_for_user(&self, user: UserId) -> Result<Vec<UserCourse>, StorageError>;

    /// Atomically flips the completion-animation gate for an enrollment.
    ///
    /// Marks the enrollment completed and returns `true` exactly once per
    /// enrollment; every later call returns `false`. The experience award
    /// rides on the `true` return, which is what makes the reward idempotent
    /// under concurrent completion checks.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the enrollment does not exist.
    async fn complete_course_once(
        &self,
        user: UserId,
        course: CourseId,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Insert or update a lesson progress row, keyed by (user, lesson,
    /// course). A completed row never regresses to merely viewed.
    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError>;

    async fn progress_for_user(&self, user: UserId) -> Result<Vec<UserProgress>, StorageError>;
}

/// Repository contract for finished quiz results. Results are append-only.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Append a result; storage assigns and returns its id.
    async fn append_result(&self, result: &QuizResult) -> Result<QuizResultId, StorageError>;

    /// All results of a user, newest first.
    async fn results_for_user(&self, user: UserId) -> Result<Vec<QuizResult>, StorageError>;

    /// Distinct quiz titles this user has ever passed.
    async fn passed_quiz_titles(&self, user: UserId) -> Result<Vec<String>, StorageError>;

    /// Whether the user has at least one passing result for this quiz title.
    async fn has_passed(&self, user: UserId, quiz_title: &str) -> Result<bool, StorageError>;

    async fn append_user_answer(&self, answer: &UserAnswer) -> Result<(), StorageError>;

    async fn answers_for_result(
        &self,
        result: QuizResultId,
    ) -> Result<Vec<UserAnswer>, StorageError>;
}

/// Repository contract for user profile data: experience total and group
/// membership.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Add experience to a user's total and return the new total.
    async fn add_exp(&self, user: UserId, amount: u32) -> Result<u32, StorageError>;

    /// Current experience total; absent users report zero.
    async fn exp(&self, user: UserId) -> Result<u32, StorageError>;

    /// Replace a user's group memberships.
    async fn set_groups(&self, user: UserId, groups: &[GroupId]) -> Result<(), StorageError>;

    async fn groups_for_user(&self, user: UserId) -> Result<Vec<GroupId>, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    lessons: Arc<Mutex<HashMap<LessonId, Lesson>>>,
    quizzes: Arc<Mutex<HashMap<QuizId, Quiz>>>,
    questions: Arc<Mutex<HashMap<QuestionId, Question>>>,
    answers: Arc<Mutex<HashMap<AnswerId, Answer>>>,
    directories: Arc<Mutex<HashMap<DirectoryId, Directory>>>,
    trajectories: Arc<Mutex<HashMap<(UserId, CourseId), UserLessonTrajectory>>>,
    enrollments: Arc<Mutex<HashMap<(UserId, CourseId), UserCourse>>>,
    progress: Arc<Mutex<HashMap<(UserId, LessonId, Option<CourseId>), UserProgress>>>,
    results: Arc<Mutex<Vec<(QuizResultId, QuizResult)>>>,
    user_answers: Arc<Mutex<Vec<UserAnswer>>>,
    exp: Arc<Mutex<HashMap<UserId, u32>>>,
    user_groups: Arc<Mutex<HashMap<UserId, Vec<GroupId>>>>,
    next_result_id: Arc<Mutex<u64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<'a, T>(m: &'a Mutex<T>) -> Result<std::sync::MutexGuard<'a, T>, StorageError> {
        m.lock().map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn sort_lessons(lessons: &mut [Lesson]) {
    lessons.sort_by_key(|l| (l.order(), l.id().value()));
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.courses)?;
        guard.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Course, StorageError> {
        let guard = Self::lock(&self.courses)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn get_course_by_slug(&self, slug: &str) -> Result<Course, StorageError> {
        let guard = Self::lock(&self.courses)?;
        guard
            .values()
            .find(|c| c.slug() == slug)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = Self::lock(&self.courses)?;
        let mut courses: Vec<Course> = guard.values().cloned().collect();
        courses.sort_by_key(|c| c.id().value());
        Ok(courses)
    }

    async fn courses_for_group(&self, group: GroupId) -> Result<Vec<Course>, StorageError> {
        let guard = Self::lock(&self.courses)?;
        let mut courses: Vec<Course> = guard
            .values()
            .filter(|c| c.group_ids().contains(&group))
            .cloned()
            .collect();
        courses.sort_by_key(|c| c.id().value());
        Ok(courses)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, StorageError> {
        let guard = Self::lock(&self.courses)?;
        Ok(guard.values().any(|c| c.slug() == slug))
    }

    async fn find_by_title_author(
        &self,
        title: &str,
        author: UserId,
    ) -> Result<Option<CourseId>, StorageError> {
        let guard = Self::lock(&self.courses)?;
        Ok(guard
            .values()
            .find(|c| c.title() == title && c.author() == author)
            .map(Course::id))
    }

    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.courses)?;
        guard.remove(&id).ok_or(StorageError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.lessons)?;
        guard.insert(lesson.id(), lesson.clone());
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, StorageError> {
        let guard = Self::lock(&self.lessons)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn lessons_for_course(&self, course: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let guard = Self::lock(&self.lessons)?;
        let mut lessons: Vec<Lesson> = guard
            .values()
            .filter(|l| l.in_course(course))
            .cloned()
            .collect();
        sort_lessons(&mut lessons);
        Ok(lessons)
    }

    async fn lessons_by_ids(&self, ids: &[LessonId]) -> Result<Vec<Lesson>, StorageError> {
        let guard = Self::lock(&self.lessons)?;
        let mut lessons: Vec<Lesson> = ids.iter().filter_map(|id| guard.get(id).cloned()).collect();
        sort_lessons(&mut lessons);
        Ok(lessons)
    }

    async fn max_order(&self, directory: Option<DirectoryId>) -> Result<u32, StorageError> {
        let guard = Self::lock(&self.lessons)?;
        Ok(guard
            .values()
            .filter(|l| l.directory() == directory)
            .map(Lesson::order)
            .max()
            .unwrap_or(0))
    }

    async fn lessons_in_directory(
        &self,
        directory: DirectoryId,
    ) -> Result<Vec<Lesson>, StorageError> {
        let guard = Self::lock(&self.lessons)?;
        let mut lessons: Vec<Lesson> = guard
            .values()
            .filter(|l| l.directory() == Some(directory))
            .cloned()
            .collect();
        sort_lessons(&mut lessons);
        Ok(lessons)
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.lessons)?;
        guard.remove(&id).ok_or(StorageError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.quizzes)?;
        guard.insert(quiz.id(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError> {
        let guard = Self::lock(&self.quizzes)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn quizzes_by_ids(&self, ids: &[QuizId]) -> Result<Vec<Quiz>, StorageError> {
        let guard = Self::lock(&self.quizzes)?;
        let mut quizzes: Vec<Quiz> = ids.iter().filter_map(|id| guard.get(id).cloned()).collect();
        quizzes.sort_by_key(|q| q.id().value());
        Ok(quizzes)
    }

    async fn quizzes_in_directory(
        &self,
        directory: DirectoryId,
    ) -> Result<Vec<Quiz>, StorageError> {
        let guard = Self::lock(&self.quizzes)?;
        let mut quizzes: Vec<Quiz> = guard
            .values()
            .filter(|q| q.directory() == Some(directory))
            .cloned()
            .collect();
        quizzes.sort_by_key(|q| q.id().value());
        Ok(quizzes)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let mut quizzes = Self::lock(&self.quizzes)?;
        quizzes.remove(&id).ok_or(StorageError::NotFound)?;

        let mut questions = Self::lock(&self.questions)?;
        let doomed: Vec<QuestionId> = questions
            .values()
            .filter(|q| q.quiz_id() == id)
            .map(Question::id)
            .collect();
        let mut answers = Self::lock(&self.answers)?;
        for qid in doomed {
            questions.remove(&qid);
            answers.retain(|_, a| a.question_id() != qid);
        }
        Ok(())
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.questions)?;
        guard.insert(question.id(), question.clone());
        Ok(())
    }

    async fn questions_for_quiz(&self, quiz: QuizId) -> Result<Vec<Question>, StorageError> {
        let guard = Self::lock(&self.questions)?;
        let mut questions: Vec<Question> = guard
            .values()
            .filter(|q| q.quiz_id() == quiz)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.id().value());
        Ok(questions)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut questions = Self::lock(&self.questions)?;
        questions.remove(&id).ok_or(StorageError::NotFound)?;
        let mut answers = Self::lock(&self.answers)?;
        answers.retain(|_, a| a.question_id() != id);
        Ok(())
    }

    async fn upsert_answer(&self, answer: &Answer) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.answers)?;
        guard.insert(answer.id(), answer.clone());
        Ok(())
    }

    async fn answers_for_question(
        &self,
        question: QuestionId,
    ) -> Result<Vec<Answer>, StorageError> {
        let guard = Self::lock(&self.answers)?;
        let mut answers: Vec<Answer> = guard
            .values()
            .filter(|a| a.question_id() == question)
            .cloned()
            .collect();
        answers.sort_by_key(|a| a.id().value());
        Ok(answers)
    }

    async fn delete_answer(&self, id: AnswerId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.answers)?;
        guard.remove(&id).ok_or(StorageError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryRepository {
    async fn upsert_directory(&self, directory: &Directory) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.directories)?;
        guard.insert(directory.id(), directory.clone());
        Ok(())
    }

    async fn get_directory(&self, id: DirectoryId) -> Result<Directory, StorageError> {
        let guard = Self::lock(&self.directories)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn children_of(
        &self,
        parent: Option<DirectoryId>,
    ) -> Result<Vec<Directory>, StorageError> {
        let guard = Self::lock(&self.directories)?;
        let mut children: Vec<Directory> = guard
            .values()
            .filter(|d| d.parent() == parent)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(children)
    }

    async fn all_directories(&self) -> Result<Vec<Directory>, StorageError> {
        let guard = Self::lock(&self.directories)?;
        let mut dirs: Vec<Directory> = guard.values().cloned().collect();
        dirs.sort_by_key(|d| d.id().value());
        Ok(dirs)
    }

    async fn delete_directory(&self, id: DirectoryId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.directories)?;
        guard.remove(&id).ok_or(StorageError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl TrajectoryRepository for InMemoryRepository {
    async fn get_trajectory(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<UserLessonTrajectory>, StorageError> {
        let guard = Self::lock(&self.trajectories)?;
        Ok(guard.get(&(user, course)).cloned())
    }

    async fn set_trajectory(
        &self,
        trajectory: &UserLessonTrajectory,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.trajectories)?;
        guard.insert(
            (trajectory.user(), trajectory.course()),
            trajectory.clone(),
        );
        Ok(())
    }

    async fn clear_trajectory(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.trajectories)?;
        guard.remove(&(user, course));
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn upsert_enrollment(&self, enrollment: &UserCourse) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.enrollments)?;
        guard.insert((enrollment.user(), enrollment.course()), enrollment.clone());
        Ok(())
    }

    async fn get_enrollment(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<UserCourse>, StorageError> {
        let guard = Self::lock(&self.enrollments)?;
        Ok(guard.get(&(user, course)).cloned())
    }

    async fn enrollments_for_user(&self, user: UserId) -> Result<Vec<UserCourse>, StorageError> {
        let guard = Self::lock(&self.enrollments)?;
        let mut out: Vec<UserCourse> = guard
            .values()
            .filter(|e| e.user() == user)
            .cloned()
            .collect();
        out.sort_by_key(|e| e.course().value());
        Ok(out)
    }

    async fn complete_course_once(
        &self,
        user: UserId,
        course: CourseId,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut guard = Self::lock(&self.enrollments)?;
        let enrollment = guard.get(&(user, course)).ok_or(StorageError::NotFound)?;
        if enrollment.animation_shown() {
            return Ok(false);
        }
        let mut updated = enrollment.clone();
        updated.mark_completed(now);
        let updated = UserCourse::from_persisted(
            updated.user(),
            updated.course(),
            updated.started_at(),
            updated.completed_at(),
            true,
            true,
            updated.exp_eligible(),
        );
        guard.insert((user, course), updated);
        Ok(true)
    }

    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.progress)?;
        let key = (progress.user(), progress.lesson(), progress.course());
        match guard.get(&key) {
            // completed never regresses
            Some(existing) if existing.is_completed() && !progress.is_completed() => {}
            _ => {
                guard.insert(key, progress.clone());
            }
        }
        Ok(())
    }

    async fn progress_for_user(&self, user: UserId) -> Result<Vec<UserProgress>, StorageError> {
        let guard = Self::lock(&self.progress)?;
        let mut out: Vec<UserProgress> = guard
            .values()
            .filter(|p| p.user() == user)
            .cloned()
            .collect();
        out.sort_by_key(|p| (p.lesson().value(), p.course().map(|c| c.value())));
        Ok(out)
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<QuizResultId, StorageError> {
        let mut next = Self::lock(&self.next_result_id)?;
        *next += 1;
        let id = QuizResultId::new(*next);
        drop(next);

        let mut guard = Self::lock(&self.results)?;
        guard.push((id, result.clone()));
        Ok(id)
    }

    async fn results_for_user(&self, user: UserId) -> Result<Vec<QuizResult>, StorageError> {
        let guard = Self::lock(&self.results)?;
        let mut out: Vec<(QuizResultId, QuizResult)> = guard
            .iter()
            .filter(|(_, r)| r.user() == user)
            .cloned()
            .collect();
        out.sort_by(|(ia, a), (ib, b)| {
            b.completed_at()
                .cmp(&a.completed_at())
                .then(ib.value().cmp(&ia.value()))
        });
        Ok(out.into_iter().map(|(_, r)| r).collect())
    }

    async fn passed_quiz_titles(&self, user: UserId) -> Result<Vec<String>, StorageError> {
        let guard = Self::lock(&self.results)?;
        let mut titles: Vec<String> = guard
            .iter()
            .filter(|(_, r)| r.user() == user && r.passed())
            .map(|(_, r)| r.quiz_title().to_owned())
            .collect();
        titles.sort();
        titles.dedup();
        Ok(titles)
    }

    async fn has_passed(&self, user: UserId, quiz_title: &str) -> Result<bool, StorageError> {
        let guard = Self::lock(&self.results)?;
        Ok(guard
            .iter()
            .any(|(_, r)| r.user() == user && r.passed() && r.quiz_title() == quiz_title))
    }

    async fn append_user_answer(&self, answer: &UserAnswer) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.user_answers)?;
        guard.push(answer.clone());
        Ok(())
    }

    async fn answers_for_result(
        &self,
        result: QuizResultId,
    ) -> Result<Vec<UserAnswer>, StorageError> {
        let guard = Self::lock(&self.user_answers)?;
        Ok(guard
            .iter()
            .filter(|a| a.quiz_result() == result)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn add_exp(&self, user: UserId, amount: u32) -> Result<u32, StorageError> {
        let mut guard = Self::lock(&self.exp)?;
        let total = guard.entry(user).or_insert(0);
        *total = total.saturating_add(amount);
        Ok(*total)
    }

    async fn exp(&self, user: UserId) -> Result<u32, StorageError> {
        let guard = Self::lock(&self.exp)?;
        Ok(guard.get(&user).copied().unwrap_or(0))
    }

    async fn set_groups(&self, user: UserId, groups: &[GroupId]) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.user_groups)?;
        guard.insert(user, groups.to_vec());
        Ok(())
    }

    async fn groups_for_user(&self, user: UserId) -> Result<Vec<GroupId>, StorageError> {
        let guard = Self::lock(&self.user_groups)?;
        Ok(guard.get(&user).cloned().unwrap_or_default())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates all repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub directories: Arc<dyn DirectoryRepository>,
    pub trajectories: Arc<dyn TrajectoryRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub results: Arc<dyn QuizResultRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            courses: Arc::new(repo.clone()),
            lessons: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            directories: Arc::new(repo.clone()),
            trajectories: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            profiles: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::time::fixed_now;

    fn build_course(id: u64, slug: &str) -> Course {
        Course::new(
            CourseId::new(id),
            format!("Course {id}"),
            "about",
            UserId::new(1),
            slug,
            None,
            None,
            None,
            fixed_now(),
        )
        .unwrap()
    }

    fn build_lesson(id: u64, order: u32, course: CourseId) -> Lesson {
        let mut lesson =
            Lesson::new(LessonId::new(id), format!("Lesson {id}"), "body", None, order, None)
                .unwrap();
        lesson.set_courses(vec![course]);
        lesson
    }

    #[tokio::test]
    async fn course_round_trip_and_slug_lookup() {
        let repo = InMemoryRepository::new();
        let course = build_course(1, "rust-101");
        repo.upsert_course(&course).await.unwrap();

        assert_eq!(repo.get_course(course.id()).await.unwrap(), course);
        assert_eq!(repo.get_course_by_slug("rust-101").await.unwrap(), course);
        assert!(repo.slug_exists("rust-101").await.unwrap());
        assert!(!repo.slug_exists("rust-102").await.unwrap());
    }

    #[tokio::test]
    async fn lessons_for_course_sorted_by_order() {
        let repo = InMemoryRepository::new();
        let course = build_course(1, "c");
        repo.upsert_course(&course).await.unwrap();
        repo.upsert_lesson(&build_lesson(1, 2, course.id())).await.unwrap();
        repo.upsert_lesson(&build_lesson(2, 1, course.id())).await.unwrap();

        let lessons = repo.lessons_for_course(course.id()).await.unwrap();
        let ids: Vec<u64> = lessons.iter().map(|l| l.id().value()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn complete_course_once_flips_exactly_once() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(7);
        let course = CourseId::new(1);
        repo.upsert_enrollment(&UserCourse::new(user, course, fixed_now()))
            .await
            .unwrap();

        assert!(repo.complete_course_once(user, course, fixed_now()).await.unwrap());
        assert!(!repo.complete_course_once(user, course, fixed_now()).await.unwrap());

        let enrollment = repo.get_enrollment(user, course).await.unwrap().unwrap();
        assert!(enrollment.is_completed());
        assert!(enrollment.animation_shown());
        assert_eq!(enrollment.completed_at(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn complete_course_once_requires_enrollment() {
        let repo = InMemoryRepository::new();
        let err = repo
            .complete_course_once(UserId::new(1), CourseId::new(1), fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn completed_progress_never_regresses() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let lesson = LessonId::new(5);

        repo.upsert_progress(&UserProgress::completed(user, lesson, None))
            .await
            .unwrap();
        repo.upsert_progress(&UserProgress::viewed(user, lesson, None))
            .await
            .unwrap();

        let rows = repo.progress_for_user(user).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_completed());
    }

    #[tokio::test]
    async fn passed_titles_are_distinct() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let pass = QuizResult::new(user, "Basics", 5, 5, fixed_now());
        repo.append_result(&pass).await.unwrap();
        repo.append_result(&pass).await.unwrap();
        let fail = QuizResult::new(user, "Advanced", 1, 5, fixed_now());
        repo.append_result(&fail).await.unwrap();

        assert_eq!(repo.passed_quiz_titles(user).await.unwrap(), vec!["Basics"]);
        assert!(repo.has_passed(user, "Basics").await.unwrap());
        assert!(!repo.has_passed(user, "Advanced").await.unwrap());
    }

    #[tokio::test]
    async fn exp_accumulates() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        assert_eq!(repo.exp(user).await.unwrap(), 0);
        assert_eq!(repo.add_exp(user, 100).await.unwrap(), 100);
        assert_eq!(repo.add_exp(user, 15).await.unwrap(), 115);
    }
}

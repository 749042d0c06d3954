use lms_core::model::{
    Answer, AnswerId, Course, CourseId, Directory, DirectoryId, GroupId, Lesson, LessonId,
    Question, QuestionId, QuestionKind, Quiz, QuizId, QuizResult, UserAnswer, UserCourse, UserId,
    UserLessonTrajectory, UserProgress,
};
use lms_core::time::fixed_now;
use storage::repository::{
    CourseRepository, DirectoryRepository, EnrollmentRepository, LessonRepository,
    ProfileRepository, QuizRepository, QuizResultRepository, TrajectoryRepository,
};
use storage::sqlite::SqliteRepository;

fn build_course(id: u64, title: &str, slug: &str) -> Course {
    Course::new(
        CourseId::new(id),
        title,
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
    let mut lesson = Lesson::new(
        LessonId::new(id),
        format!("Lesson {id}"),
        "body",
        None,
        order,
        None,
    )
    .unwrap();
    lesson.set_courses(vec![course]);
    lesson
}

#[tokio::test]
async fn sqlite_roundtrips_courses_with_associations() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_courses?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    // the course row has to exist before a quiz can reference it
    let mut course = build_course(1, "Rust 101", "rust-101");
    repo.upsert_course(&course).await.unwrap();

    let quiz = Quiz::new(QuizId::new(9), "Final", None, None, Some(course.id())).unwrap();
    repo.upsert_quiz(&quiz).await.unwrap();

    course.set_quizzes(vec![quiz.id()]);
    course.set_groups(vec![GroupId::new(4)]);
    repo.upsert_course(&course).await.unwrap();

    let fetched = repo.get_course(course.id()).await.unwrap();
    assert_eq!(fetched.quiz_ids(), &[quiz.id()]);
    assert_eq!(fetched.group_ids(), &[GroupId::new(4)]);

    let by_slug = repo.get_course_by_slug("rust-101").await.unwrap();
    assert_eq!(by_slug.id(), course.id());

    let for_group = repo.courses_for_group(GroupId::new(4)).await.unwrap();
    assert_eq!(for_group.len(), 1);

    assert!(repo.slug_exists("rust-101").await.unwrap());
    assert_eq!(
        repo.find_by_title_author("Rust 101", UserId::new(1))
            .await
            .unwrap(),
        Some(course.id())
    );
    assert_eq!(
        repo.find_by_title_author("Rust 101", UserId::new(2))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn sqlite_orders_lessons_and_tracks_max_order() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_lessons?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = build_course(1, "C", "c");
    repo.upsert_course(&course).await.unwrap();

    repo.upsert_lesson(&build_lesson(1, 2, course.id())).await.unwrap();
    repo.upsert_lesson(&build_lesson(2, 1, course.id())).await.unwrap();
    repo.upsert_lesson(&build_lesson(3, 3, course.id())).await.unwrap();

    let lessons = repo.lessons_for_course(course.id()).await.unwrap();
    let ids: Vec<u64> = lessons.iter().map(|l| l.id().value()).collect();
    assert_eq!(ids, vec![2, 1, 3]);

    assert_eq!(repo.max_order(None).await.unwrap(), 3);

    let subset = repo
        .lessons_by_ids(&[LessonId::new(3), LessonId::new(2), LessonId::new(99)])
        .await
        .unwrap();
    let ids: Vec<u64> = subset.iter().map(|l| l.id().value()).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn sqlite_cascades_quiz_deletion_to_questions_and_answers() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_quiz?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let quiz = Quiz::new(QuizId::new(1), "Basics", None, None, None).unwrap();
    repo.upsert_quiz(&quiz).await.unwrap();

    let question = Question::new(
        QuestionId::new(1),
        quiz.id(),
        "2 + 2 = ?",
        QuestionKind::Single,
    )
    .unwrap();
    repo.upsert_question(&question).await.unwrap();
    repo.upsert_answer(&Answer::new(AnswerId::new(1), question.id(), "4", true).unwrap())
        .await
        .unwrap();
    repo.upsert_answer(&Answer::new(AnswerId::new(2), question.id(), "5", false).unwrap())
        .await
        .unwrap();

    let questions = repo.questions_for_quiz(quiz.id()).await.unwrap();
    assert_eq!(questions.len(), 1);
    let answers = repo.answers_for_question(question.id()).await.unwrap();
    assert_eq!(answers.len(), 2);

    repo.delete_quiz(quiz.id()).await.unwrap();
    assert!(repo.questions_for_quiz(quiz.id()).await.unwrap().is_empty());
    assert!(repo
        .answers_for_question(question.id())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn sqlite_complete_course_once_flips_exactly_once() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_enroll?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = build_course(1, "C", "c");
    repo.upsert_course(&course).await.unwrap();

    let user = UserId::new(7);
    repo.upsert_enrollment(&UserCourse::new(user, course.id(), fixed_now()))
        .await
        .unwrap();

    assert!(repo
        .complete_course_once(user, course.id(), fixed_now())
        .await
        .unwrap());
    assert!(!repo
        .complete_course_once(user, course.id(), fixed_now())
        .await
        .unwrap());

    let enrollment = repo
        .get_enrollment(user, course.id())
        .await
        .unwrap()
        .unwrap();
    assert!(enrollment.is_completed());
    assert!(enrollment.animation_shown());
    assert_eq!(enrollment.completed_at(), Some(fixed_now()));
}

#[tokio::test]
async fn sqlite_progress_upsert_never_regresses() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = build_course(1, "C", "c");
    repo.upsert_course(&course).await.unwrap();
    repo.upsert_lesson(&build_lesson(1, 1, course.id())).await.unwrap();

    let user = UserId::new(3);
    repo.upsert_progress(&UserProgress::completed(user, LessonId::new(1), Some(course.id())))
        .await
        .unwrap();
    repo.upsert_progress(&UserProgress::viewed(user, LessonId::new(1), Some(course.id())))
        .await
        .unwrap();

    let rows = repo.progress_for_user(user).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_completed());
}

#[tokio::test]
async fn sqlite_quiz_results_and_answers_append() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_results?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(5);
    let result = QuizResult::new(user, "Basics", 4, 5, fixed_now());
    let id = repo.append_result(&result).await.unwrap();

    repo.append_user_answer(&UserAnswer::new(
        user,
        id,
        QuestionId::new(1),
        AnswerId::new(2),
        true,
    ))
    .await
    .unwrap();

    let results = repo.results_for_user(user).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].percent(), 80);
    assert!(results[0].passed());

    assert!(repo.has_passed(user, "Basics").await.unwrap());
    assert_eq!(repo.passed_quiz_titles(user).await.unwrap(), vec!["Basics"]);

    let answers = repo.answers_for_result(id).await.unwrap();
    assert_eq!(answers.len(), 1);
    assert!(answers[0].is_correct());
}

#[tokio::test]
async fn sqlite_trajectory_replacement() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_trajectory?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = build_course(1, "C", "c");
    repo.upsert_course(&course).await.unwrap();
    repo.upsert_lesson(&build_lesson(1, 1, course.id())).await.unwrap();
    repo.upsert_lesson(&build_lesson(2, 2, course.id())).await.unwrap();

    let user = UserId::new(2);
    assert!(repo.get_trajectory(user, course.id()).await.unwrap().is_none());

    repo.set_trajectory(&UserLessonTrajectory::new(
        user,
        course.id(),
        vec![LessonId::new(1), LessonId::new(2)],
    ))
    .await
    .unwrap();
    let trajectory = repo.get_trajectory(user, course.id()).await.unwrap().unwrap();
    assert_eq!(trajectory.lesson_ids().len(), 2);

    repo.set_trajectory(&UserLessonTrajectory::new(
        user,
        course.id(),
        vec![LessonId::new(2)],
    ))
    .await
    .unwrap();
    let trajectory = repo.get_trajectory(user, course.id()).await.unwrap().unwrap();
    assert_eq!(trajectory.lesson_ids(), &[LessonId::new(2)]);

    repo.clear_trajectory(user, course.id()).await.unwrap();
    assert!(repo.get_trajectory(user, course.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_profile_exp_and_groups() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_profile?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(9);
    assert_eq!(repo.exp(user).await.unwrap(), 0);
    assert_eq!(repo.add_exp(user, 100).await.unwrap(), 100);
    assert_eq!(repo.add_exp(user, 15).await.unwrap(), 115);

    repo.set_groups(user, &[GroupId::new(1), GroupId::new(2)])
        .await
        .unwrap();
    assert_eq!(
        repo.groups_for_user(user).await.unwrap(),
        vec![GroupId::new(1), GroupId::new(2)]
    );
}

#[tokio::test]
async fn sqlite_directory_children_sorted() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_dirs?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let root = Directory::new(DirectoryId::new(1), "Root", None, 0).unwrap();
    repo.upsert_directory(&root).await.unwrap();
    repo.upsert_directory(&Directory::new(DirectoryId::new(2), "Beta", Some(root.id()), 0).unwrap())
        .await
        .unwrap();
    repo.upsert_directory(
        &Directory::new(DirectoryId::new(3), "Alpha", Some(root.id()), 0).unwrap(),
    )
    .await
    .unwrap();
    repo.upsert_directory(
        &Directory::new(DirectoryId::new(4), "Aardvark", Some(root.id()), 1).unwrap(),
    )
    .await
    .unwrap();

    let children = repo.children_of(Some(root.id())).await.unwrap();
    let names: Vec<&str> = children.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Aardvark"]);

    let roots = repo.children_of(None).await.unwrap();
    assert_eq!(roots.len(), 1);
}

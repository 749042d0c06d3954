use std::collections::HashMap;
use std::sync::Arc;

use lms_core::model::{Directory, DirectoryId};
use storage::repository::{
    CourseRepository, DirectoryRepository, LessonRepository, QuizRepository,
};

use crate::auth::{Actor, AuthPolicy};
use crate::error::DirectoryServiceError;

/// What happens to a deleted directory's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Children move to the root; filed lessons, quizzes and courses are
    /// detached but kept.
    MoveToRoot,
    /// The whole subtree goes: directories and the lessons, quizzes and
    /// courses filed in them.
    DeleteAll,
}

/// One node of the knowledge-base tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub directory: Directory,
    pub children: Vec<DirectoryNode>,
}

/// Manages the knowledge-base directory tree and the content filed in it.
#[derive(Clone)]
pub struct DirectoryService {
    policy: AuthPolicy,
    directories: Arc<dyn DirectoryRepository>,
    lessons: Arc<dyn LessonRepository>,
    quizzes: Arc<dyn QuizRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl DirectoryService {
    #[must_use]
    pub fn new(
        directories: Arc<dyn DirectoryRepository>,
        lessons: Arc<dyn LessonRepository>,
        quizzes: Arc<dyn QuizRepository>,
        courses: Arc<dyn CourseRepository>,
    ) -> Self {
        Self {
            policy: AuthPolicy::new(),
            directories,
            lessons,
            quizzes,
            courses,
        }
    }

    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Auth` for non-staff actors, a storage
    /// error when the parent does not exist, plus validation errors.
    pub async fn create_directory(
        &self,
        actor: Actor,
        id: DirectoryId,
        name: String,
        parent: Option<DirectoryId>,
        order: u32,
    ) -> Result<Directory, DirectoryServiceError> {
        self.policy.ensure_staff(actor)?;
        if let Some(parent) = parent {
            self.directories.get_directory(parent).await?;
        }
        let directory = Directory::new(id, name, parent, order)?;
        self.directories.upsert_directory(&directory).await?;
        Ok(directory)
    }

    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Auth` for non-staff actors, plus
    /// validation and storage errors.
    pub async fn rename_directory(
        &self,
        actor: Actor,
        id: DirectoryId,
        name: String,
    ) -> Result<Directory, DirectoryServiceError> {
        self.policy.ensure_staff(actor)?;
        let mut directory = self.directories.get_directory(id).await?;
        directory.rename(name)?;
        self.directories.upsert_directory(&directory).await?;
        Ok(directory)
    }

    /// Move a directory under a new parent (or to the root).
    ///
    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Cycle` when the new parent lies in
    /// the directory's own subtree, plus auth, validation and storage
    /// errors.
    pub async fn move_directory(
        &self,
        actor: Actor,
        id: DirectoryId,
        new_parent: Option<DirectoryId>,
    ) -> Result<Directory, DirectoryServiceError> {
        self.policy.ensure_staff(actor)?;
        let mut directory = self.directories.get_directory(id).await?;

        // walk ancestry from the target upward; hitting `id` means a cycle
        let mut cursor = new_parent;
        while let Some(ancestor_id) = cursor {
            if ancestor_id == id {
                return Err(DirectoryServiceError::Cycle);
            }
            cursor = self.directories.get_directory(ancestor_id).await?.parent();
        }

        directory.reparent(new_parent)?;
        self.directories.upsert_directory(&directory).await?;
        Ok(directory)
    }

    /// Delete a directory according to the chosen mode.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Auth` for non-staff actors, or
    /// storage errors.
    pub async fn delete_directory(
        &self,
        actor: Actor,
        id: DirectoryId,
        mode: DeleteMode,
    ) -> Result<(), DirectoryServiceError> {
        self.policy.ensure_staff(actor)?;
        self.directories.get_directory(id).await?;

        match mode {
            DeleteMode::MoveToRoot => {
                for mut child in self.directories.children_of(Some(id)).await? {
                    child.reparent(None)?;
                    self.directories.upsert_directory(&child).await?;
                }
                self.detach_content(id).await?;
                self.directories.delete_directory(id).await?;
            }
            DeleteMode::DeleteAll => {
                // collect the subtree iteratively, parents before children
                let mut subtree = Vec::new();
                let mut stack = vec![id];
                while let Some(current) = stack.pop() {
                    subtree.push(current);
                    for child in self.directories.children_of(Some(current)).await? {
                        stack.push(child.id());
                    }
                }

                for &dir in &subtree {
                    for lesson in self.lessons.lessons_in_directory(dir).await? {
                        self.lessons.delete_lesson(lesson.id()).await?;
                    }
                    for quiz in self.quizzes.quizzes_in_directory(dir).await? {
                        self.quizzes.delete_quiz(quiz.id()).await?;
                    }
                    for course in self.courses.list_courses().await? {
                        if course.directory() == Some(dir) {
                            self.courses.delete_course(course.id()).await?;
                        }
                    }
                }

                // children before parents to respect the self-reference
                for &dir in subtree.iter().rev() {
                    self.directories.delete_directory(dir).await?;
                }
            }
        }

        tracing::info!(directory = id.value(), ?mode, "directory deleted");
        Ok(())
    }

    /// The full tree, siblings ordered by (order, name).
    ///
    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Storage` on repository failures.
    pub async fn tree(&self) -> Result<Vec<DirectoryNode>, DirectoryServiceError> {
        Ok(build_tree(self.directories.all_directories().await?))
    }

    async fn detach_content(&self, dir: DirectoryId) -> Result<(), DirectoryServiceError> {
        for mut lesson in self.lessons.lessons_in_directory(dir).await? {
            lesson.clear_directory();
            self.lessons.upsert_lesson(&lesson).await?;
        }
        for mut quiz in self.quizzes.quizzes_in_directory(dir).await? {
            quiz.clear_directory();
            self.quizzes.upsert_quiz(&quiz).await?;
        }
        self.detach_courses(dir).await
    }

    async fn detach_courses(&self, dir: DirectoryId) -> Result<(), DirectoryServiceError> {
        for mut course in self.courses.list_courses().await? {
            if course.directory() == Some(dir) {
                course.clear_directory();
                self.courses.upsert_course(&course).await?;
            }
        }
        Ok(())
    }
}

/// Assembles the tree without recursion: an explicit frame stack per root.
fn build_tree(dirs: Vec<Directory>) -> Vec<DirectoryNode> {
    let mut by_parent: HashMap<Option<DirectoryId>, Vec<Directory>> = HashMap::new();
    for dir in dirs {
        by_parent.entry(dir.parent()).or_default().push(dir);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        // popped back-to-front below
        siblings.reverse();
    }

    struct Frame {
        dir: Directory,
        pending: Vec<Directory>,
        built: Vec<DirectoryNode>,
    }

    let mut roots = Vec::new();
    let mut root_list = by_parent.remove(&None).unwrap_or_default();
    while let Some(root) = root_list.pop() {
        let mut stack = vec![Frame {
            pending: by_parent.remove(&Some(root.id())).unwrap_or_default(),
            dir: root,
            built: Vec::new(),
        }];

        while let Some(mut frame) = stack.pop() {
            if let Some(child) = frame.pending.pop() {
                let pending = by_parent.remove(&Some(child.id())).unwrap_or_default();
                stack.push(frame);
                stack.push(Frame {
                    dir: child,
                    pending,
                    built: Vec::new(),
                });
            } else {
                let node = DirectoryNode {
                    directory: frame.dir,
                    children: frame.built,
                };
                match stack.last_mut() {
                    Some(parent) => parent.built.push(node),
                    None => roots.push(node),
                }
            }
        }
    }

    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{Course, CourseId, Lesson, LessonId, Quiz, QuizId, UserId};
    use lms_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    fn service(repo: &InMemoryRepository) -> DirectoryService {
        DirectoryService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    async fn seed_tree(service: &DirectoryService) {
        let staff = Actor::staff(UserId::new(1));
        service
            .create_directory(staff, DirectoryId::new(1), "Root".into(), None, 0)
            .await
            .unwrap();
        service
            .create_directory(staff, DirectoryId::new(2), "Child".into(), Some(DirectoryId::new(1)), 0)
            .await
            .unwrap();
        service
            .create_directory(
                staff,
                DirectoryId::new(3),
                "Grandchild".into(),
                Some(DirectoryId::new(2)),
                0,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn tree_nests_children_in_order() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        seed_tree(&service).await;
        let staff = Actor::staff(UserId::new(1));
        service
            .create_directory(staff, DirectoryId::new(4), "Alpha".into(), Some(DirectoryId::new(1)), 0)
            .await
            .unwrap();

        let tree = service.tree().await.unwrap();
        assert_eq!(tree.len(), 1);
        let root = &tree[0];
        assert_eq!(root.directory.name(), "Root");
        let names: Vec<&str> = root.children.iter().map(|n| n.directory.name()).collect();
        assert_eq!(names, vec!["Alpha", "Child"]);
        assert_eq!(root.children[1].children[0].directory.name(), "Grandchild");
    }

    #[tokio::test]
    async fn move_rejects_cycles() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        seed_tree(&service).await;
        let staff = Actor::staff(UserId::new(1));

        let err = service
            .move_directory(staff, DirectoryId::new(1), Some(DirectoryId::new(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryServiceError::Cycle));

        // moving a leaf elsewhere is fine
        service
            .move_directory(staff, DirectoryId::new(3), Some(DirectoryId::new(1)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn move_to_root_keeps_content() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        seed_tree(&service).await;
        let staff = Actor::staff(UserId::new(1));

        let lesson = Lesson::new(
            LessonId::new(1),
            "Filed",
            "",
            None,
            1,
            Some(DirectoryId::new(2)),
        )
        .unwrap();
        repo.upsert_lesson(&lesson).await.unwrap();

        service
            .delete_directory(staff, DirectoryId::new(2), DeleteMode::MoveToRoot)
            .await
            .unwrap();

        // grandchild became a root, lesson survives detached
        let grandchild = repo.get_directory(DirectoryId::new(3)).await.unwrap();
        assert_eq!(grandchild.parent(), None);
        let lesson = repo.get_lesson(LessonId::new(1)).await.unwrap();
        assert_eq!(lesson.directory(), None);
    }

    #[tokio::test]
    async fn delete_all_removes_subtree_and_content() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        seed_tree(&service).await;
        let staff = Actor::staff(UserId::new(1));

        let lesson = Lesson::new(
            LessonId::new(1),
            "Filed",
            "",
            None,
            1,
            Some(DirectoryId::new(3)),
        )
        .unwrap();
        repo.upsert_lesson(&lesson).await.unwrap();
        let quiz = Quiz::new(QuizId::new(1), "Filed", None, Some(DirectoryId::new(2)), None).unwrap();
        repo.upsert_quiz(&quiz).await.unwrap();
        let course = Course::new(
            CourseId::new(1),
            "Filed",
            "",
            UserId::new(1),
            "filed",
            None,
            Some(DirectoryId::new(2)),
            None,
            fixed_now(),
        )
        .unwrap();
        repo.upsert_course(&course).await.unwrap();

        service
            .delete_directory(staff, DirectoryId::new(1), DeleteMode::DeleteAll)
            .await
            .unwrap();

        for id in [1, 2, 3] {
            assert!(matches!(
                repo.get_directory(DirectoryId::new(id)).await.unwrap_err(),
                StorageError::NotFound
            ));
        }
        assert!(matches!(
            repo.get_lesson(LessonId::new(1)).await.unwrap_err(),
            StorageError::NotFound
        ));
        assert!(matches!(
            repo.get_quiz(QuizId::new(1)).await.unwrap_err(),
            StorageError::NotFound
        ));
        // courses filed in the doomed subtree go with it
        assert!(matches!(
            repo.get_course(CourseId::new(1)).await.unwrap_err(),
            StorageError::NotFound
        ));
    }
}

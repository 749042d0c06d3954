use lms_core::model::{Directory, DirectoryId};

use super::{
    SqliteRepository,
    mapping::{map_directory_row, opt_to_i64, to_i64},
};
use crate::repository::{DirectoryRepository, StorageError};

#[async_trait::async_trait]
impl DirectoryRepository for SqliteRepository {
    async fn upsert_directory(&self, directory: &Directory) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO directories (id, name, parent_id, ord)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                parent_id = excluded.parent_id,
                ord = excluded.ord
            ",
        )
        .bind(to_i64("directory_id", directory.id().value())?)
        .bind(directory.name())
        .bind(opt_to_i64("parent_id", directory.parent().map(|p| p.value()))?)
        .bind(i64::from(directory.order()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_directory(&self, id: DirectoryId) -> Result<Directory, StorageError> {
        let row = sqlx::query("SELECT id, name, parent_id, ord FROM directories WHERE id = ?1")
            .bind(to_i64("directory_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        map_directory_row(&row)
    }

    async fn children_of(
        &self,
        parent: Option<DirectoryId>,
    ) -> Result<Vec<Directory>, StorageError> {
        let rows = match parent {
            Some(parent) => {
                sqlx::query(
                    r"
                    SELECT id, name, parent_id, ord
                    FROM directories
                    WHERE parent_id = ?1
                    ORDER BY ord, name
                    ",
                )
                .bind(to_i64("parent_id", parent.value())?)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r"
                    SELECT id, name, parent_id, ord
                    FROM directories
                    WHERE parent_id IS NULL
                    ORDER BY ord, name
                    ",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut dirs = Vec::with_capacity(rows.len());
        for row in rows {
            dirs.push(map_directory_row(&row)?);
        }
        Ok(dirs)
    }

    async fn all_directories(&self) -> Result<Vec<Directory>, StorageError> {
        let rows = sqlx::query("SELECT id, name, parent_id, ord FROM directories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut dirs = Vec::with_capacity(rows.len());
        for row in rows {
            dirs.push(map_directory_row(&row)?);
        }
        Ok(dirs)
    }

    async fn delete_directory(&self, id: DirectoryId) -> Result<(), StorageError> {
        let done = sqlx::query("DELETE FROM directories WHERE id = ?1")
            .bind(to_i64("directory_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

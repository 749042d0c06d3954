use lms_core::model::{GroupId, UserId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{ser, to_i64},
};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn add_exp(&self, user: UserId, amount: u32) -> Result<u32, StorageError> {
        let row = sqlx::query(
            r"
            INSERT INTO user_exp (user_id, exp)
            VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET exp = user_exp.exp + excluded.exp
            RETURNING exp
            ",
        )
        .bind(to_i64("user_id", user.value())?)
        .bind(i64::from(amount))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let total: i64 = row.try_get("exp").map_err(ser)?;
        u32::try_from(total)
            .map_err(|_| StorageError::Serialization(format!("invalid exp total: {total}")))
    }

    async fn exp(&self, user: UserId) -> Result<u32, StorageError> {
        let row = sqlx::query("SELECT exp FROM user_exp WHERE user_id = ?1")
            .bind(to_i64("user_id", user.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => {
                let total: i64 = row.try_get("exp").map_err(ser)?;
                u32::try_from(total)
                    .map_err(|_| StorageError::Serialization(format!("invalid exp total: {total}")))
            }
            None => Ok(0),
        }
    }

    async fn set_groups(&self, user: UserId, groups: &[GroupId]) -> Result<(), StorageError> {
        let user_id = to_i64("user_id", user.value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM user_groups WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for group in groups {
            sqlx::query("INSERT INTO user_groups (user_id, group_id) VALUES (?1, ?2)")
                .bind(user_id)
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

    async fn groups_for_user(&self, user: UserId) -> Result<Vec<GroupId>, StorageError> {
        let rows = sqlx::query(
            "SELECT group_id FROM user_groups WHERE user_id = ?1 ORDER BY group_id",
        )
        .bind(to_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut groups = Vec::with_capacity(rows.len());
        for row in rows {
            let raw = row.try_get::<i64, _>("group_id").map_err(ser)?;
            let value = u64::try_from(raw)
                .map_err(|_| StorageError::Serialization("group_id sign overflow".into()))?;
            groups.push(GroupId::new(value));
        }
        Ok(groups)
    }
}

use aeris_core::repository::UserRepository;
use aeris_core::{CoreError, CoreResult};
use aeris_shared::models::user::normalize_email;
use aeris_shared::User;
use async_trait::async_trait;
use uuid::Uuid;

use crate::database::PgStore;
use crate::error::map_sqlx;
use crate::rows::UserRow;

const USER_COLUMNS: &str = "id, email, password_hash, display_name, is_admin, created_at, deleted_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &User) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, display_name, is_admin, created_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id)
        .bind(user.email.expose())
        .bind(user.password_hash.expose())
        .bind(&user.display_name)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match map_sqlx(e) {
            CoreError::Conflict(_) => CoreError::Conflict("email is already registered".to_string()),
            other => other,
        })?;

        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(User::from))
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(User::from))
    }
}

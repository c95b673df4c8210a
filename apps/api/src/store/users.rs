use chrono::Utc;
use uuid::Uuid;

use super::Store;
use crate::models::User;

impl Store {
    /// Account creation belongs to the account service; used for seeding and tests.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn create_user(&self, email: &str, name: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, provider_token, created_at)
            VALUES (?, ?, ?, NULL, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    /// Binds the token produced by the OAuth callback.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn bind_provider_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET provider_token = ? WHERE id = ?")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Returns the provider token bound to a user, if any.
    pub async fn provider_token(&self, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let token: Option<Option<String>> =
            sqlx::query_scalar("SELECT provider_token FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(token.flatten().filter(|t| !t.is_empty()))
    }
}

use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::crypto::{hash_password, verify_password};
use sqlx::PgPool;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    pepper: Vec<u8>,
}

impl UserService {
    pub fn new(pool: PgPool, pepper: &[u8]) -> Self {
        Self {
            pool,
            pepper: pepper.to_vec(),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_admin, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Unknown user and wrong password give the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let invalid = || Error::Unauthorized("Invalid username or password".to_string());

        let user = self
            .find_by_username(username.trim())
            .await?
            .ok_or_else(invalid)?;

        if !self.verify(password, &user.password_hash).await? {
            tracing::warn!(username = %user.username, "failed login attempt");
            return Err(invalid());
        }
        Ok(user)
    }

    /// Creates the admin, or promotes and re-keys an existing user. Returns
    /// the user and whether it was newly created.
    pub async fn upsert_admin(&self, username: &str, password: &str) -> Result<(User, bool)> {
        let password_hash = self.hash(password).await?;

        let existing = self.find_by_username(username).await?;
        let created = existing.is_none();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, is_admin)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (username) DO UPDATE
                SET password_hash = EXCLUDED.password_hash, is_admin = TRUE
            RETURNING id, username, password_hash, is_admin, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok((user, created))
    }

    // Argon2 is CPU-bound, so it runs on the blocking pool.
    async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let pepper = self.pepper.clone();
        tokio::task::spawn_blocking(move || hash_password(&password, &pepper))
            .await
            .map_err(|e| Error::Internal(format!("hashing task failed: {}", e)))?
            .map_err(Error::from)
    }

    async fn verify(&self, password: &str, hashed: &str) -> Result<bool> {
        let password = password.to_string();
        let hashed = hashed.to_string();
        let pepper = self.pepper.clone();
        tokio::task::spawn_blocking(move || verify_password(&password, &hashed, &pepper))
            .await
            .map_err(|e| Error::Internal(format!("verification task failed: {}", e)))?
            .map_err(Error::from)
    }
}

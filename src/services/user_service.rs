use crate::error::{Error, Result};
use crate::models::user::{User, ROLE_STUDENT};
use crate::utils::crypto;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub language: String,
    pub password: String,
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_user: NewUser, role: &str) -> Result<User> {
        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT username FROM users WHERE username = $1 OR email = $2",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .fetch_optional(&self.pool)
        .await?;
        if let Some((taken,)) = existing {
            let field = if taken == new_user.username {
                "username"
            } else {
                "email"
            };
            return Err(Error::BadRequest(format!("{} already exists", field)));
        }

        let password_hash = crypto::hash_password(&new_user.password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, name, language, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, email, name, language, role, password_hash,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.language)
        .bind(role)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created {} account: {}", role, user.username);
        Ok(user)
    }

    pub async fn create_student(&self, new_user: NewUser) -> Result<User> {
        self.create(new_user, ROLE_STUDENT).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, language, role, password_hash,
                   created_at, updated_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, language, role, password_hash,
                   created_at, updated_at
            FROM users WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<User> {
        let user = match self.get_by_username(username).await {
            Ok(user) => user,
            Err(Error::NotFound(_)) => {
                return Err(Error::Unauthorized("Invalid username or password".to_string()))
            }
            Err(other) => return Err(other),
        };
        let valid = crypto::verify_password(password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(Error::Unauthorized("Invalid username or password".to_string()));
        }
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, language, role, password_hash,
                   created_at, updated_at
            FROM users ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub async fn update_language(&self, id: Uuid, language: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET language = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(language)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

//! Database service for directory-service.
//!
//! The persistence boundary for the user aggregate: a user row plus its
//! owned email rows.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dtos::user::{CreateUserRequest, EmailInput, UpdateUserRequest};
use crate::models::{EmailRecord, User, UserEmail};
use service_core::error::AppError;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "directory-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // User Aggregate Operations
    // -------------------------------------------------------------------------

    /// List users in stable creation order.
    #[instrument(skip(self))]
    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, first_name, last_name, city, created_utc, updated_utc
            FROM users
            ORDER BY created_utc, user_id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list users: {}", e)))?;

        Ok(users)
    }

    /// Get one user by id.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, first_name, last_name, city, created_utc, updated_utc
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?;

        Ok(user)
    }

    /// Create a user and its email rows.
    ///
    /// The email inserts run after the user row is committed and are not
    /// covered by a shared transaction; a failure there leaves the user row
    /// in place.
    #[instrument(skip(self, input))]
    pub async fn create_user(
        &self,
        input: &CreateUserRequest,
    ) -> Result<(User, Vec<UserEmail>), AppError> {
        let user_id = Uuid::new_v4();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, first_name, last_name, city)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, first_name, last_name, city, created_utc, updated_utc
            "#,
        )
        .bind(user_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.city)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)))?;

        let mut emails = Vec::with_capacity(input.emails.len());
        for email in &input.emails {
            let row = sqlx::query_as::<_, UserEmail>(
                r#"
                INSERT INTO user_emails (email_id, user_id, email, is_primary)
                VALUES ($1, $2, $3, $4)
                RETURNING email_id, user_id, email, is_primary, created_utc, updated_utc
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user.user_id)
            .bind(&email.email)
            .bind(email.is_primary)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert user email: {}", e))
            })?;
            emails.push(row);
        }

        info!(user_id = %user.user_id, emails = emails.len(), "User created");

        Ok((user, emails))
    }

    /// Patch the scalar fields of a user; `updated_utc` is always bumped.
    /// Signals NotFound when no row matched.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn update_user(
        &self,
        user_id: Uuid,
        input: &UpdateUserRequest,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                city = COALESCE($4, city),
                updated_utc = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.city)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update user: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
        }

        Ok(())
    }

    /// Replace a user's email set: delete everything, then insert the
    /// supplied list, as one transaction.
    #[instrument(skip(self, emails), fields(user_id = %user_id))]
    pub async fn replace_user_emails(
        &self,
        user_id: Uuid,
        emails: &[EmailInput],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("DELETE FROM user_emails WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete user emails: {}", e))
            })?;

        for email in emails {
            sqlx::query(
                r#"
                INSERT INTO user_emails (email_id, user_id, email, is_primary)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&email.email)
            .bind(email.is_primary)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert user email: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit email replacement: {}", e))
        })?;

        Ok(())
    }

    /// Emails attached to a user, shaped for admin read responses.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_user_emails(&self, user_id: Uuid) -> Result<Vec<EmailRecord>, AppError> {
        let emails = sqlx::query_as::<_, EmailRecord>(
            r#"
            SELECT email, is_primary
            FROM user_emails
            WHERE user_id = $1
            ORDER BY created_utc, email_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list user emails: {}", e))
        })?;

        Ok(emails)
    }

    /// Delete a user and its emails. Emails go first so the user row never
    /// leaves orphaned references behind. Signals NotFound when the user row
    /// deletion matched nothing, including repeat deletes.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_emails WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete user emails: {}", e))
            })?;

        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete user: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
        }

        info!(user_id = %user_id, "User and related emails deleted");

        Ok(())
    }
}

//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait.
//! Maps between the database schema and domain UserProfile entity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{UserProfile, UserRepository, UserRole};
use crate::shared::error::AppError;

const USER_COLUMNS: &str = r#"
    id, email, display_name, phone, location, bio, skills, role,
    organization_name, website, welcome_email_sent, last_login_at,
    created_at, updated_at
"#;

/// Database row representation matching the users table schema.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    display_name: Option<String>,
    phone: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    skills: Vec<String>,
    role: Option<String>,
    organization_name: Option<String>,
    website: Option<String>,
    welcome_email_sent: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert database row to domain UserProfile entity.
    fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            phone: self.phone,
            location: self.location,
            bio: self.bio,
            skills: self.skills,
            role: self.role.as_deref().and_then(UserRole::parse),
            organization_name: self.organization_name,
            website: self.website,
            welcome_email_sent: self.welcome_email_sent,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_profile))
    }

    async fn create(&self, user: &UserProfile) -> Result<UserProfile, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, display_name, phone, location, bio, skills, role,
                               organization_name, website, welcome_email_sent, last_login_at,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.phone)
        .bind(&user.location)
        .bind(&user.bio)
        .bind(&user.skills)
        .bind(user.role.map(|r| r.as_str()))
        .bind(&user.organization_name)
        .bind(&user.website)
        .bind(user.welcome_email_sent)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(format!("User {} already exists", user.id))
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into_profile())
    }

    async fn update(&self, user: &UserProfile) -> Result<UserProfile, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET display_name = $2,
                phone = $3,
                location = $4,
                bio = $5,
                skills = $6,
                role = COALESCE(role, $7),
                organization_name = $8,
                website = $9,
                updated_at = NOW()
            WHERE id = $1
              AND (role IS NULL OR $7::TEXT IS NULL OR role = $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.id)
        .bind(&user.display_name)
        .bind(&user.phone)
        .bind(&user.location)
        .bind(&user.bio)
        .bind(&user.skills)
        .bind(user.role.map(|r| r.as_str()))
        .bind(&user.organization_name)
        .bind(&user.website)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into_profile()),
            None => match self.find_by_id(&user.id).await? {
                None => Err(AppError::NotFound(format!("User {} not found", user.id))),
                Some(_) => Err(AppError::Conflict("Role has already been chosen".into())),
            },
        }
    }

    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        Ok(())
    }

    /// Conditional update; only one concurrent caller sees a row affected.
    async fn claim_welcome_email(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET welcome_email_sent = TRUE WHERE id = $1 AND welcome_email_sent = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_welcome_email(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET welcome_email_sent = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

use sqlx::{PgPool, Row};
use sqlx::postgres::PgRow;
use anyhow::{Context, Result};
use chrono::Utc;
use crate::domains::auth::models::user::User;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 사용자 생성
    /// Create user. Returns `None` when the login is already taken.
    pub async fn create_user(&self, login: &str, password_hash: &str) -> Result<Option<User>> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO users (login, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (login) DO NOTHING
            RETURNING id, login, password_hash, created_at, updated_at
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(row.map(|r| Self::map_row(&r)))
    }

    // 로그인으로 사용자 조회
    // Get user by login
    pub async fn get_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, login, password_hash, created_at, updated_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by login")?;

        Ok(row.map(|r| Self::map_row(&r)))
    }

    fn map_row(row: &PgRow) -> User {
        User {
            id: row.get::<i64, _>("id") as u64,
            login: row.get("login"),
            password_hash: row.get("password_hash"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

//! PostgreSQL store for account-service.

use crate::models::Account;
use crate::services::repository::{require_id, AccountRepository};
use async_trait::async_trait;
use metrics::histogram;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};
use tracing::{info, instrument};

fn observe(operation: &'static str, started: Instant) {
    histogram!("db_query_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "account-service"))]
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

    pub fn pool(&self) -> &PgPool {
        &self.pool
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
}

#[async_trait]
impl AccountRepository for Database {
    #[instrument(skip(self, account), fields(email = %account.email))]
    async fn create(&self, account: &Account) -> Result<Account, AppError> {
        let started = Instant::now();

        // Single statement: a failed insert leaves nothing behind.
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, email, address, phone_number, date_joined)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, address, phone_number, date_joined
            "#,
        )
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.address)
        .bind(&account.phone_number)
        .bind(account.date_joined)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create account: {}", e)))?;

        observe("create_account", started);
        info!(account_id = ?created.id, "Account created");

        Ok(created)
    }

    #[instrument(skip(self, account), fields(account_id = ?account.id))]
    async fn update(&self, account: &Account) -> Result<Account, AppError> {
        let id = require_id(account)?;
        let started = Instant::now();

        let updated = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET name = $2, email = $3, address = $4, phone_number = $5
            WHERE id = $1
            RETURNING id, name, email, address, phone_number, date_joined
            "#,
        )
        .bind(id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.address)
        .bind(&account.phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update account: {}", e)))?;

        observe("update_account", started);

        updated.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Account with id '{}' was not found", id))
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let started = Instant::now();

        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete account: {}", e))
            })?;

        observe("delete_account", started);
        let removed = result.rows_affected() > 0;
        if removed {
            info!(account_id = id, "Account deleted");
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn find(&self, id: i32) -> Result<Option<Account>, AppError> {
        let started = Instant::now();

        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, address, phone_number, date_joined
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get account: {}", e)))?;

        observe("get_account", started);

        Ok(account)
    }

    #[instrument(skip(self))]
    async fn all(&self) -> Result<Vec<Account>, AppError> {
        let started = Instant::now();

        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, address, phone_number, date_joined
            FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list accounts: {}", e)))?;

        observe("list_accounts", started);

        Ok(accounts)
    }

    /// Check database health.
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}

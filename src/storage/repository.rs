use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    admit, compute_balance, Cents, NewStatement, NewUser, OperationType, Statement, StatementId,
    User, UserId, UserLedger,
};

use super::{AppendOutcome, StatementStore, UserStore, MIGRATION_001_INITIAL};

const STATEMENT_COLUMNS: &str =
    "sequence, id, user_id, type, amount_cents, description, counterpart_id, created_at";

/// SQLite-backed store for users and statements.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Current balance of a user.
    pub async fn compute_balance(&self, user_id: UserId) -> Result<Cents> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::balance_on(&mut conn, user_id).await
    }

    /// Every statement on the user's ledger, in sequence order.
    async fn ledger_rows(
        conn: &mut SqliteConnection,
        user_id: UserId,
    ) -> Result<Vec<Statement>> {
        let id = user_id.to_string();

        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM statements
            WHERE user_id = ? OR (type = 'transfer' AND counterpart_id = ?)
            ORDER BY sequence
            "#,
            STATEMENT_COLUMNS
        ))
        .bind(&id)
        .bind(&id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to list statements for user")?;

        rows.iter().map(Self::row_to_statement).collect()
    }

    // Summed in Rust: SQLite's SUM fails on out-of-range partial sums.
    async fn balance_on(conn: &mut SqliteConnection, user_id: UserId) -> Result<Cents> {
        let statements = Self::ledger_rows(conn, user_id).await?;
        Ok(compute_balance(user_id, &statements)?)
    }

    async fn insert_statement(
        conn: &mut SqliteConnection,
        draft: NewStatement,
    ) -> Result<Statement> {
        let mut statement = draft.into_statement(0);

        let row = sqlx::query(
            r#"
            INSERT INTO statements (id, user_id, type, amount_cents, description, counterpart_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING sequence
            "#,
        )
        .bind(statement.id.to_string())
        .bind(statement.user_id.to_string())
        .bind(statement.operation.as_str())
        .bind(statement.amount_cents)
        .bind(&statement.description)
        .bind(statement.counterpart_id.map(|id| id.to_string()))
        .bind(statement.created_at.to_rfc3339())
        .fetch_one(&mut *conn)
        .await
        .context("Failed to save statement")?;

        statement.sequence = row.get("sequence");
        Ok(statement)
    }

    /// Balance checks and insert for `append_checked`. Runs inside the
    /// caller's write transaction.
    async fn check_and_insert(
        conn: &mut SqliteConnection,
        draft: NewStatement,
    ) -> Result<AppendOutcome> {
        let owner_balance = Self::balance_on(conn, draft.user_id).await?;
        let counterpart_balance = match draft.counterpart_id {
            Some(payee) if payee != draft.user_id => Some(Self::balance_on(conn, payee).await?),
            _ => None,
        };

        if let Err(rejection) = admit(&draft, owner_balance, counterpart_balance) {
            return Ok(AppendOutcome::Rejected(rejection));
        }
        let statement = Self::insert_statement(conn, draft).await?;
        Ok(AppendOutcome::Recorded(statement))
    }

    fn row_to_statement(row: &sqlx::sqlite::SqliteRow) -> Result<Statement> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let type_str: String = row.get("type");
        let counterpart_str: Option<String> = row.get("counterpart_id");
        let created_at_str: String = row.get("created_at");

        Ok(Statement {
            id: Uuid::parse_str(&id_str).context("Invalid statement ID")?,
            sequence: row.get("sequence"),
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            operation: OperationType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid operation type: {}", type_str))?,
            amount_cents: row.get("amount_cents"),
            description: row.get("description"),
            counterpart_id: counterpart_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid counterpart ID")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");
        let updated_at_str: String = row.get("updated_at");

        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            name: row.get("name"),
            email: row.get("email"),
            password: row.get("password"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .context("Invalid updated_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl StatementStore for Repository {
    async fn append(&self, draft: NewStatement) -> Result<Statement> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::insert_statement(&mut conn, draft).await
    }

    async fn append_checked(&self, draft: NewStatement) -> Result<AppendOutcome> {
        // IMMEDIATE takes the database write lock up front, so every
        // connection to the file queues here before reading any balance.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("Failed to start write transaction")?;

        let outcome = Self::check_and_insert(&mut tx, draft).await?;

        match &outcome {
            AppendOutcome::Recorded(_) => {
                tx.commit().await.context("Failed to commit statement")?;
            }
            AppendOutcome::Rejected(rejection) => {
                debug!(%rejection, "append refused");
                tx.rollback()
                    .await
                    .context("Failed to roll back write transaction")?;
            }
        }
        Ok(outcome)
    }

    async fn find_by_id(&self, id: StatementId) -> Result<Option<Statement>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM statements WHERE id = ?",
            STATEMENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch statement")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_statement(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_and_sum_for_user(&self, user_id: UserId) -> Result<UserLedger> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        let statements = Self::ledger_rows(&mut conn, user_id).await?;
        let balance = compute_balance(user_id, &statements)?;

        Ok(UserLedger {
            balance,
            statements,
        })
    }
}

#[async_trait]
impl UserStore for Repository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = new_user.into_user();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.created_at.to_rfc3339())
        .bind(user.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save user")?;

        Ok(user)
    }
}

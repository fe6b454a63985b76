use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    Cents, NewStatement, NewUser, OperationType, Statement, StatementId, User, UserId, UserLedger,
};
use crate::storage::{AppendOutcome, InMemoryRepository, Repository, StatementStore, UserStore};

use super::AppError;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, API, etc.).
///
/// Collaborators are injected; `init`/`connect` wire the SQLite store and
/// `in_memory` wires the in-process one. Balance checks run inside the
/// statement store, so any number of services may share one database.
pub struct LedgerService<S = Repository, U = Repository> {
    statements: Arc<S>,
    users: Arc<U>,
}

impl LedgerService {
    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Arc::new(Repository::init(&db_url).await?);
        Ok(Self::new(repo.clone(), repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Arc::new(Repository::connect(&db_url).await?);
        Ok(Self::new(repo.clone(), repo))
    }
}

impl LedgerService<InMemoryRepository, InMemoryRepository> {
    pub fn in_memory() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        Self::new(repo.clone(), repo)
    }
}

impl<S, U> LedgerService<S, U>
where
    S: StatementStore,
    U: UserStore,
{
    pub fn new(statements: Arc<S>, users: Arc<U>) -> Self {
        Self { statements, users }
    }

    pub fn statement_store(&self) -> &S {
        &self.statements
    }

    // ========================
    // User operations
    // ========================

    /// Register a user. Emails are unique.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::UserAlreadyExists(email.to_string()));
        }

        let user = self.users.create(NewUser::new(name, email, password)).await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn show_user_profile(&self, user_id: UserId) -> Result<User, AppError> {
        self.find_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound(user_id))
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_id(user_id).await?)
    }

    // ========================
    // Statement operations
    // ========================

    /// Record a deposit or a withdrawal for `user_id`.
    ///
    /// Withdrawals are refused when the current balance does not cover them,
    /// deposits when they would push the balance past `Cents::MAX`.
    pub async fn create_statement(
        &self,
        user_id: UserId,
        operation: OperationType,
        amount_cents: Cents,
        description: impl Into<String>,
    ) -> Result<Statement, AppError> {
        validate_amount(amount_cents)?;

        let draft = match operation {
            OperationType::Deposit => NewStatement::deposit(user_id, amount_cents, description),
            OperationType::Withdraw => NewStatement::withdraw(user_id, amount_cents, description),
            OperationType::Transfer => {
                return Err(AppError::InvalidOperation(
                    "transfers must name a receiver".to_string(),
                ));
            }
        };

        if self.find_user(user_id).await?.is_none() {
            return Err(AppError::UserNotFound(user_id));
        }

        let statement = self.record(draft).await?;
        info!(
            statement_id = %statement.id,
            user_id = %user_id,
            operation = %operation,
            amount_cents,
            "statement recorded"
        );
        Ok(statement)
    }

    /// Move `amount_cents` from `payer_id` to `payee_id`.
    ///
    /// Only one row is written: a transfer owned by the payer that names the
    /// payee as counterpart. The payee's balance picks it up as incoming.
    pub async fn create_transfer(
        &self,
        payer_id: UserId,
        payee_id: UserId,
        amount_cents: Cents,
        description: impl Into<String>,
    ) -> Result<Statement, AppError> {
        validate_amount(amount_cents)?;

        let payer = self.find_user(payer_id).await?;
        let payee = self.find_user(payee_id).await?;

        if payer.is_none() {
            return Err(AppError::SenderNotFound(payer_id));
        }
        if payee.is_none() {
            return Err(AppError::ReceiverNotFound(payee_id));
        }

        let statement = self
            .record(NewStatement::transfer(
                payer_id,
                payee_id,
                amount_cents,
                description,
            ))
            .await?;
        info!(
            statement_id = %statement.id,
            payer_id = %payer_id,
            payee_id = %payee_id,
            amount_cents,
            "transfer recorded"
        );
        Ok(statement)
    }

    /// Get a statement, but only if `user_id` owns it.
    pub async fn get_statement(
        &self,
        user_id: UserId,
        statement_id: StatementId,
    ) -> Result<Statement, AppError> {
        if self.find_user(user_id).await?.is_none() {
            return Err(AppError::UserNotFound(user_id));
        }

        debug!(user_id = %user_id, statement_id = %statement_id, "looking up statement");

        self.statements
            .find_by_id(statement_id)
            .await?
            .filter(|statement| statement.user_id == user_id)
            .ok_or(AppError::StatementNotFound(statement_id))
    }

    /// Balance and statement listing for a user.
    pub async fn get_balance(&self, user_id: UserId) -> Result<UserLedger, AppError> {
        if self.find_user(user_id).await?.is_none() {
            return Err(AppError::UserNotFound(user_id));
        }

        Ok(self.statements.list_and_sum_for_user(user_id).await?)
    }

    async fn record(&self, draft: NewStatement) -> Result<Statement, AppError> {
        match self.statements.append_checked(draft).await? {
            AppendOutcome::Recorded(statement) => Ok(statement),
            AppendOutcome::Rejected(rejection) => {
                warn!(%rejection, "statement refused");
                Err(rejection.into())
            }
        }
    }
}

fn validate_amount(amount_cents: Cents) -> Result<(), AppError> {
    if amount_cents <= 0 {
        return Err(AppError::InvalidAmount(
            "Amount must be positive".to_string(),
        ));
    }
    Ok(())
}

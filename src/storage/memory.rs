use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    admit, compute_balance, NewStatement, NewUser, Statement, StatementId, User, UserId,
    UserLedger,
};

use super::{AppendOutcome, StatementStore, UserStore};

/// In-process store with the same contract as the SQLite `Repository`.
/// Used by tests and throwaway sessions.
#[derive(Default)]
pub struct InMemoryRepository {
    statements: RwLock<Vec<Statement>>,
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored statements across all users.
    pub async fn statement_count(&self) -> usize {
        self.statements.read().await.len()
    }
}

fn push(statements: &mut Vec<Statement>, draft: NewStatement) -> Statement {
    let sequence = statements.last().map_or(1, |s| s.sequence + 1);
    let statement = draft.into_statement(sequence);
    statements.push(statement.clone());
    statement
}

#[async_trait]
impl StatementStore for InMemoryRepository {
    async fn append(&self, draft: NewStatement) -> Result<Statement> {
        let mut statements = self.statements.write().await;
        Ok(push(&mut statements, draft))
    }

    async fn append_checked(&self, draft: NewStatement) -> Result<AppendOutcome> {
        let mut statements = self.statements.write().await;

        let owner_balance = compute_balance(draft.user_id, &statements)?;
        let counterpart_balance = match draft.counterpart_id {
            Some(payee) if payee != draft.user_id => Some(compute_balance(payee, &statements)?),
            _ => None,
        };

        if let Err(rejection) = admit(&draft, owner_balance, counterpart_balance) {
            return Ok(AppendOutcome::Rejected(rejection));
        }
        Ok(AppendOutcome::Recorded(push(&mut statements, draft)))
    }

    async fn find_by_id(&self, id: StatementId) -> Result<Option<Statement>> {
        let statements = self.statements.read().await;
        Ok(statements.iter().find(|s| s.id == id).cloned())
    }

    async fn list_and_sum_for_user(&self, user_id: UserId) -> Result<UserLedger> {
        let statements = self.statements.read().await;
        Ok(UserLedger::for_user(user_id, statements.iter().cloned())?)
    }
}

#[async_trait]
impl UserStore for InMemoryRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        // Mirror the UNIQUE constraint of the SQL schema
        if users.values().any(|u| u.email == new_user.email) {
            bail!("Email already registered: {}", new_user.email);
        }
        let user = new_user.into_user();
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

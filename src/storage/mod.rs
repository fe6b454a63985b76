//! Storage ports and their adapters.
//!
//! The services only see [`StatementStore`] and [`UserStore`]. `Repository`
//! persists to SQLite, `InMemoryRepository` keeps everything in process.

mod memory;
mod repository;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{
    NewStatement, NewUser, Rejection, Statement, StatementId, User, UserId, UserLedger,
};

pub use memory::*;
pub use repository::*;

/// SQL migration for the initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Result of a checked append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Recorded(Statement),
    Rejected(Rejection),
}

/// Append-only statement log.
#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Assign id, sequence and timestamp, persist and return the record.
    async fn append(&self, statement: NewStatement) -> Result<Statement>;

    /// Append only if [`crate::domain::admit`] accepts the draft against the
    /// balances it touches. Reading those balances and writing the row happen
    /// under one exclusive hold of the store, so no other writer, in this
    /// process or another, can slip in between.
    async fn append_checked(&self, statement: NewStatement) -> Result<AppendOutcome>;

    async fn find_by_id(&self, id: StatementId) -> Result<Option<Statement>>;

    /// Every statement on the user's ledger in insertion order, with the balance.
    async fn list_and_sum_for_user(&self, user_id: UserId) -> Result<UserLedger>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create(&self, user: NewUser) -> Result<User>;
}

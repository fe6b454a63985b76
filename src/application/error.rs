use thiserror::Error;

use crate::domain::{Cents, Rejection, StatementId, UserId};

/// Every way a ledger operation can fail. Nothing here is retried; the
/// caller decides how to present it.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found")]
    UserNotFound(UserId),

    #[error("Sender not found")]
    SenderNotFound(UserId),

    #[error("Receiver not found")]
    ReceiverNotFound(UserId),

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Statement not found")]
    StatementNotFound(StatementId),

    #[error("User already exists")]
    UserAlreadyExists(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status an outer transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::UserNotFound(_)
            | AppError::SenderNotFound(_)
            | AppError::ReceiverNotFound(_)
            | AppError::StatementNotFound(_) => 404,
            AppError::InsufficientFunds { .. }
            | AppError::InvalidAmount(_)
            | AppError::InvalidOperation(_) => 400,
            AppError::UserAlreadyExists(_) => 409,
            AppError::Database(_) => 500,
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::InsufficientFunds { balance, required } => {
                AppError::InsufficientFunds { balance, required }
            }
            Rejection::BalanceOverflow { balance, amount } => AppError::InvalidAmount(format!(
                "{} would take the balance of {} out of range",
                amount, balance
            )),
        }
    }
}

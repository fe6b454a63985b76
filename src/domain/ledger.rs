use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, NewStatement, OperationType, Statement, UserId};

/// A user's statements add up to more than `Cents` can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("balance of user {0} is out of range")]
pub struct BalanceOverflow(pub UserId);

/// Why a draft statement was not appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("a balance of {balance} cannot take {amount} more")]
    BalanceOverflow { balance: Cents, amount: Cents },
}

/// A user's view of the ledger: every statement that touches them, in
/// insertion order, and the balance they add up to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLedger {
    pub balance: Cents,
    pub statements: Vec<Statement>,
}

impl UserLedger {
    pub fn empty() -> Self {
        Self {
            balance: 0,
            statements: Vec::new(),
        }
    }

    /// Keep the statements on `user_id`'s ledger and sum them.
    pub fn for_user(
        user_id: UserId,
        statements: impl IntoIterator<Item = Statement>,
    ) -> Result<Self, BalanceOverflow> {
        let mut statements: Vec<Statement> = statements
            .into_iter()
            .filter(|s| s.concerns(user_id))
            .collect();
        statements.sort_by_key(|s| s.sequence);
        let balance = compute_balance(user_id, &statements)?;
        Ok(Self {
            balance,
            statements,
        })
    }
}

/// Direction of one statement on `user_id`'s ledger: 1, -1 or 0.
///
/// Deposits and incoming transfers add, withdrawals and outgoing transfers
/// subtract, anything else is zero.
fn direction(user_id: UserId, statement: &Statement) -> i64 {
    if statement.user_id == user_id {
        match statement.operation {
            OperationType::Deposit => 1,
            OperationType::Withdraw => -1,
            // A self-transfer debits and credits the same ledger
            OperationType::Transfer if statement.counterpart_id == Some(user_id) => 0,
            OperationType::Transfer => -1,
        }
    } else if statement.is_incoming_for(user_id) {
        1
    } else {
        0
    }
}

/// Signed contribution of one statement to `user_id`'s balance.
pub fn signed_amount(user_id: UserId, statement: &Statement) -> Cents {
    statement
        .amount_cents
        .saturating_mul(direction(user_id, statement))
}

/// Compute the balance for a single user from a list of statements.
///
/// Partial sums are kept wide so the order of the statements does not
/// matter; only a final total outside `Cents` is an error.
pub fn compute_balance(
    user_id: UserId,
    statements: &[Statement],
) -> Result<Cents, BalanceOverflow> {
    let total: i128 = statements
        .iter()
        .map(|s| i128::from(s.amount_cents) * i128::from(direction(user_id, s)))
        .sum();
    Cents::try_from(total).map_err(|_| BalanceOverflow(user_id))
}

/// Decide whether `draft` may be appended.
///
/// `owner_balance` is the current balance of the draft's owner and
/// `counterpart_balance` that of a transfer's payee, when the payee is
/// somebody else. Debits must be covered and credits must not push a
/// balance past `Cents::MAX`.
pub fn admit(
    draft: &NewStatement,
    owner_balance: Cents,
    counterpart_balance: Option<Cents>,
) -> Result<(), Rejection> {
    let amount = draft.amount_cents;

    match draft.operation {
        OperationType::Deposit => {
            credit(owner_balance, amount)?;
        }
        OperationType::Withdraw => debit(owner_balance, amount)?,
        OperationType::Transfer => {
            debit(owner_balance, amount)?;
            if let Some(balance) = counterpart_balance {
                credit(balance, amount)?;
            }
        }
    }
    Ok(())
}

fn debit(balance: Cents, amount: Cents) -> Result<(), Rejection> {
    if balance < amount {
        return Err(Rejection::InsufficientFunds {
            balance,
            required: amount,
        });
    }
    Ok(())
}

fn credit(balance: Cents, amount: Cents) -> Result<Cents, Rejection> {
    balance
        .checked_add(amount)
        .ok_or(Rejection::BalanceOverflow { balance, amount })
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, UserId};

pub type StatementId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Deposit,
    Withdraw,
    /// Money sent by the owner to the statement's counterpart
    Transfer,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "deposit",
            OperationType::Withdraw => "withdraw",
            OperationType::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(OperationType::Deposit),
            "withdraw" => Some(OperationType::Withdraw),
            "transfer" => Some(OperationType::Transfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One immutable ledger operation. Statements are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    /// Insertion order, assigned by the store
    pub sequence: i64,
    /// Owner of the operation (the payer, for transfers)
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub operation: OperationType,
    /// Always positive
    pub amount_cents: Cents,
    pub description: String,
    /// Receiving party; only set for transfers
    pub counterpart_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Statement {
    /// True when this statement moves money into `user_id`'s ledger from someone else.
    pub fn is_incoming_for(&self, user_id: UserId) -> bool {
        self.operation == OperationType::Transfer
            && self.counterpart_id == Some(user_id)
            && self.user_id != user_id
    }

    /// True when the statement appears on `user_id`'s ledger at all.
    pub fn concerns(&self, user_id: UserId) -> bool {
        self.user_id == user_id || self.is_incoming_for(user_id)
    }
}

/// A statement that has not been stored yet. The store assigns id,
/// sequence and timestamp on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatement {
    pub user_id: UserId,
    pub operation: OperationType,
    pub amount_cents: Cents,
    pub description: String,
    pub counterpart_id: Option<UserId>,
}

impl NewStatement {
    pub fn deposit(user_id: UserId, amount_cents: Cents, description: impl Into<String>) -> Self {
        Self {
            user_id,
            operation: OperationType::Deposit,
            amount_cents,
            description: description.into(),
            counterpart_id: None,
        }
    }

    pub fn withdraw(user_id: UserId, amount_cents: Cents, description: impl Into<String>) -> Self {
        Self {
            operation: OperationType::Withdraw,
            ..Self::deposit(user_id, amount_cents, description)
        }
    }

    pub fn transfer(
        payer_id: UserId,
        payee_id: UserId,
        amount_cents: Cents,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: payer_id,
            operation: OperationType::Transfer,
            amount_cents,
            description: description.into(),
            counterpart_id: Some(payee_id),
        }
    }

    /// Build the stored record.
    pub fn into_statement(self, sequence: i64) -> Statement {
        Statement {
            id: Uuid::new_v4(),
            sequence,
            user_id: self.user_id,
            operation: self.operation,
            amount_cents: self.amount_cents,
            description: self.description,
            counterpart_id: self.counterpart_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_roundtrip() {
        for op in [
            OperationType::Deposit,
            OperationType::Withdraw,
            OperationType::Transfer,
        ] {
            assert_eq!(OperationType::from_str(op.as_str()), Some(op));
        }
        assert_eq!(OperationType::from_str("refund"), None);
    }

    #[test]
    fn test_transfer_draft_carries_counterpart() {
        let (payer, payee) = (Uuid::new_v4(), Uuid::new_v4());
        let statement = NewStatement::transfer(payer, payee, 2500, "rent share").into_statement(3);

        assert_eq!(statement.user_id, payer);
        assert_eq!(statement.counterpart_id, Some(payee));
        assert_eq!(statement.operation, OperationType::Transfer);
        assert_eq!(statement.sequence, 3);
    }

    #[test]
    fn test_withdraw_draft_has_no_counterpart() {
        let user = Uuid::new_v4();
        let draft = NewStatement::withdraw(user, 100, "atm");

        assert_eq!(draft.operation, OperationType::Withdraw);
        assert_eq!(draft.counterpart_id, None);
    }

    #[test]
    fn test_incoming_and_concerns() {
        let (payer, payee, other) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let transfer = NewStatement::transfer(payer, payee, 100, "").into_statement(1);

        assert!(transfer.is_incoming_for(payee));
        assert!(!transfer.is_incoming_for(payer));
        assert!(transfer.concerns(payer));
        assert!(transfer.concerns(payee));
        assert!(!transfer.concerns(other));
    }

    #[test]
    fn test_serializes_operation_as_type() {
        let statement = NewStatement::deposit(Uuid::new_v4(), 100, "salary").into_statement(1);
        let json = serde_json::to_value(&statement).unwrap();

        assert_eq!(json["type"], "deposit");
        assert_eq!(json["amount_cents"], 100);
    }
}

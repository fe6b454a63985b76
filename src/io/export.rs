use std::io::Write;

use anyhow::Result;

use crate::application::LedgerService;
use crate::domain::UserId;
use crate::storage::{StatementStore, UserStore};

/// Exporter for writing a user's ledger to CSV or JSON.
pub struct Exporter<'a, S, U> {
    service: &'a LedgerService<S, U>,
}

impl<'a, S, U> Exporter<'a, S, U>
where
    S: StatementStore,
    U: UserStore,
{
    pub fn new(service: &'a LedgerService<S, U>) -> Self {
        Self { service }
    }

    /// Export the user's statements to CSV. Returns the number of rows written.
    pub async fn export_statements_csv<W: Write>(
        &self,
        user_id: UserId,
        writer: W,
    ) -> Result<usize> {
        let ledger = self.service.get_balance(user_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "sequence",
            "created_at",
            "operation",
            "amount_cents",
            "description",
            "counterpart_id",
        ])?;

        for statement in &ledger.statements {
            csv_writer.write_record(&[
                statement.id.to_string(),
                statement.sequence.to_string(),
                statement.created_at.to_rfc3339(),
                statement.operation.as_str().to_string(),
                statement.amount_cents.to_string(),
                statement.description.clone(),
                statement
                    .counterpart_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(ledger.statements.len())
    }

    /// Export balance and statements as pretty JSON.
    pub async fn export_statements_json<W: Write>(
        &self,
        user_id: UserId,
        mut writer: W,
    ) -> Result<usize> {
        let ledger = self.service.get_balance(user_id).await?;
        serde_json::to_writer_pretty(&mut writer, &ledger)?;
        writeln!(writer)?;
        Ok(ledger.statements.len())
    }
}

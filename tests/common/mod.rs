// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use statement_ledger::application::LedgerService;
use statement_ledger::domain::{OperationType, User};
use statement_ledger::InMemoryRepository;
use tempfile::TempDir;

pub type MemoryService = LedgerService<InMemoryRepository, InMemoryRepository>;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Path of the database file created by `test_service`
pub fn db_path(temp_dir: &TempDir) -> String {
    temp_dir.path().join("test.db").display().to_string()
}

/// Independent services on one database file, as separate processes would open it
pub async fn connect_many(temp_dir: &TempDir, count: usize) -> Result<Vec<LedgerService>> {
    let path = db_path(temp_dir);
    let mut services = Vec::with_capacity(count);
    for _ in 0..count {
        services.push(LedgerService::connect(&path).await?);
    }
    Ok(services)
}

/// Test fixture: two registered users
pub struct Users {
    pub ana: User,
    pub bia: User,
}

impl Users {
    pub async fn register(service: &LedgerService) -> Result<Self> {
        Ok(Self {
            ana: service.create_user("Ana", "ana@example.com", "1234").await?,
            bia: service.create_user("Bia", "bia@example.com", "1234").await?,
        })
    }

    pub async fn register_in_memory(service: &MemoryService) -> Result<Self> {
        Ok(Self {
            ana: service.create_user("Ana", "ana@example.com", "1234").await?,
            bia: service.create_user("Bia", "bia@example.com", "1234").await?,
        })
    }

    /// Give both users the same starting balance
    pub async fn fund_both(&self, service: &LedgerService, amount: i64) -> Result<()> {
        for user in [&self.ana, &self.bia] {
            service
                .create_statement(user.id, OperationType::Deposit, amount, "opening")
                .await?;
        }
        Ok(())
    }
}

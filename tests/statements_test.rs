mod common;

use anyhow::Result;
use common::{test_service, Users};
use statement_ledger::application::{AppError, LedgerService};
use statement_ledger::domain::OperationType;
use uuid::Uuid;

#[tokio::test]
async fn test_fresh_user_has_empty_ledger() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let users = Users::register(&service).await?;

    let ledger = service.get_balance(users.ana.id).await?;

    assert_eq!(ledger.balance, 0);
    assert!(ledger.statements.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_balance_is_sum_of_deposits() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let users = Users::register(&service).await?;

    let deposits = [100, 2550, 1, 99999];
    for amount in deposits {
        service
            .create_statement(users.ana.id, OperationType::Deposit, amount, "")
            .await?;
    }

    let ledger = service.get_balance(users.ana.id).await?;
    assert_eq!(ledger.balance, deposits.iter().sum::<i64>());
    assert_eq!(ledger.statements.len(), deposits.len());
    Ok(())
}

#[tokio::test]
async fn test_deposit_then_withdraw_walkthrough() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let users = Users::register(&service).await?;
    let ana = users.ana.id;

    let deposit = service
        .create_statement(ana, OperationType::Deposit, 100, "deposit")
        .await?;
    let ledger = service.get_balance(ana).await?;
    assert_eq!(ledger.balance, 100);
    assert_eq!(ledger.statements, vec![deposit.clone()]);

    let withdraw = service
        .create_statement(ana, OperationType::Withdraw, 100, "withdraw")
        .await?;
    let ledger = service.get_balance(ana).await?;
    assert_eq!(ledger.balance, 0);
    assert_eq!(ledger.statements, vec![deposit, withdraw]);

    let result = service
        .create_statement(ana, OperationType::Withdraw, 1, "one more")
        .await;
    assert!(matches!(
        result,
        Err(AppError::InsufficientFunds {
            balance: 0,
            required: 1
        })
    ));
    assert_eq!(service.get_balance(ana).await?.statements.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_balance_for_unknown_user() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.get_balance(Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::UserNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_get_statement_for_owner() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let users = Users::register(&service).await?;

    let statement = service
        .create_statement(users.ana.id, OperationType::Deposit, 100, "test")
        .await?;

    let found = service.get_statement(users.ana.id, statement.id).await?;
    assert_eq!(found, statement);
    Ok(())
}

#[tokio::test]
async fn test_get_statement_enforces_ownership() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let users = Users::register(&service).await?;

    let statement = service
        .create_statement(users.ana.id, OperationType::Deposit, 100, "test")
        .await?;

    let result = service.get_statement(users.bia.id, statement.id).await;
    assert!(matches!(result, Err(AppError::StatementNotFound(id)) if id == statement.id));
    Ok(())
}

#[tokio::test]
async fn test_get_statement_errors() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let users = Users::register(&service).await?;

    let missing = service.get_statement(users.ana.id, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::StatementNotFound(_))));

    let unknown_user = service.get_statement(Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(unknown_user, Err(AppError::UserNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_data_survives_reconnect() -> Result<()> {
    let (service, temp) = test_service().await?;
    let users = Users::register(&service).await?;
    service
        .create_statement(users.ana.id, OperationType::Deposit, 4200, "kept")
        .await?;
    drop(service);

    let db_path = temp.path().join("test.db");
    let service = LedgerService::connect(db_path.to_str().unwrap()).await?;

    let ledger = service.get_balance(users.ana.id).await?;
    assert_eq!(ledger.balance, 4200);
    assert_eq!(ledger.statements[0].description, "kept");
    Ok(())
}

#[tokio::test]
async fn test_user_registration() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let users = Users::register(&service).await?;

    let profile = service.show_user_profile(users.ana.id).await?;
    assert_eq!(profile.email, "ana@example.com");

    let duplicate = service.create_user("Ana 2", "ana@example.com", "x").await;
    assert!(matches!(duplicate, Err(AppError::UserAlreadyExists(_))));
    Ok(())
}

#[tokio::test]
async fn test_deposit_past_maximum_balance_on_sqlite() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let users = Users::register(&service).await?;
    let ana = users.ana.id;
    service
        .create_statement(ana, OperationType::Deposit, i64::MAX, "")
        .await?;

    let overflow = service
        .create_statement(ana, OperationType::Deposit, 1, "")
        .await;
    assert!(matches!(overflow, Err(AppError::InvalidAmount(_))));

    let ledger = service.get_balance(ana).await?;
    assert_eq!(ledger.balance, i64::MAX);
    assert_eq!(ledger.statements.len(), 1);

    service
        .create_statement(ana, OperationType::Withdraw, 1, "")
        .await?;
    assert_eq!(service.get_balance(ana).await?.balance, i64::MAX - 1);
    Ok(())
}

#[tokio::test]
async fn test_transfer_into_maximum_balance_on_sqlite() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let users = Users::register(&service).await?;
    let (ana, bia) = (users.ana.id, users.bia.id);
    service
        .create_statement(ana, OperationType::Deposit, 100, "")
        .await?;
    service
        .create_statement(bia, OperationType::Deposit, i64::MAX, "")
        .await?;

    let result = service.create_transfer(ana, bia, 100, "").await;

    assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    assert_eq!(service.get_balance(ana).await?.balance, 100);
    assert_eq!(service.get_balance(bia).await?.balance, i64::MAX);
    Ok(())
}

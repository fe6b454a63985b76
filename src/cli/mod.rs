use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::LedgerService;
use crate::domain::{format_cents, parse_cents, OperationType, Statement, UserId, UserLedger};

/// Statement ledger - deposits, withdrawals and transfers between users
#[derive(Parser)]
#[command(name = "statement-ledger")]
#[command(about = "Record deposits, withdrawals and transfers and derive balances from them")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "LEDGER_DATABASE", default_value = "ledger.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Deposit money into a user's account
    Deposit {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Acting user ID
        #[arg(short, long)]
        user: String,

        /// Description of the operation
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Withdraw money from a user's account
    Withdraw {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Acting user ID
        #[arg(short, long)]
        user: String,

        /// Description of the operation
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Send money from the acting user to another user
    Transfer {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Acting user ID (the payer)
        #[arg(short, long)]
        user: String,

        /// Receiving user ID
        #[arg(long)]
        to: String,

        /// Description of the transfer
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Show a user's balance and statements
    Balance {
        /// Acting user ID
        #[arg(short, long)]
        user: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a single statement owned by the acting user
    #[command(name = "show")]
    ShowStatement {
        /// Statement ID
        id: String,

        /// Acting user ID
        #[arg(short, long)]
        user: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export a user's statements to CSV or JSON
    Export {
        /// Acting user ID
        #[arg(short, long)]
        user: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Create {
        /// Display name
        name: String,

        /// Email address (must be unique)
        #[arg(short, long)]
        email: String,

        /// Credential, stored as given
        #[arg(short, long)]
        password: String,
    },

    /// Show a user profile
    Show {
        /// User ID
        id: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::User(user_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_user_command(&service, user_cmd).await?;
            }

            Commands::Deposit {
                amount,
                user,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let statement = service
                    .create_statement(
                        parse_user_id(&user)?,
                        OperationType::Deposit,
                        parse_amount(&amount)?,
                        description,
                    )
                    .await?;
                println!(
                    "Recorded deposit: {} ({})",
                    format_cents(statement.amount_cents),
                    statement.id
                );
            }

            Commands::Withdraw {
                amount,
                user,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let statement = service
                    .create_statement(
                        parse_user_id(&user)?,
                        OperationType::Withdraw,
                        parse_amount(&amount)?,
                        description,
                    )
                    .await?;
                println!(
                    "Recorded withdrawal: {} ({})",
                    format_cents(statement.amount_cents),
                    statement.id
                );
            }

            Commands::Transfer {
                amount,
                user,
                to,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let payer_id = parse_user_id(&user)?;
                let payee_id = parse_user_id(&to)?;

                let statement = service
                    .create_transfer(payer_id, payee_id, parse_amount(&amount)?, description)
                    .await?;
                println!(
                    "Recorded transfer: {} {} -> {} ({})",
                    format_cents(statement.amount_cents),
                    payer_id,
                    payee_id,
                    statement.id
                );
            }

            Commands::Balance { user, json } => {
                let service = LedgerService::connect(&self.database).await?;
                let user_id = parse_user_id(&user)?;
                let ledger = service.get_balance(user_id).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&ledger)?);
                } else {
                    print_ledger(user_id, &ledger);
                }
            }

            Commands::ShowStatement { id, user, json } => {
                let service = LedgerService::connect(&self.database).await?;
                let statement_id =
                    Uuid::parse_str(&id).context("Invalid statement ID format (expected UUID)")?;
                let statement = service
                    .get_statement(parse_user_id(&user)?, statement_id)
                    .await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&statement)?);
                } else {
                    print_statement(&statement);
                }
            }

            Commands::Export {
                user,
                output,
                format,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, parse_user_id(&user)?, output.as_deref(), &format)
                    .await?;
            }
        }

        Ok(())
    }
}

async fn run_user_command(service: &LedgerService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Create {
            name,
            email,
            password,
        } => {
            let user = service.create_user(&name, &email, &password).await?;
            println!("Created user: {} <{}> ({})", user.name, user.email, user.id);
        }

        UserCommands::Show { id } => {
            let user = service.show_user_profile(parse_user_id(&id)?).await?;

            println!("User: {}", user.name);
            println!("  ID:      {}", user.id);
            println!("  Email:   {}", user.email);
            println!(
                "  Created: {}",
                user.created_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    user_id: UserId,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = match format {
        "csv" => exporter.export_statements_csv(user_id, writer).await?,
        "json" => exporter.export_statements_json(user_id, writer).await?,
        _ => {
            anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format);
        }
    };

    if output.is_some() {
        eprintln!("Exported {} statements", count);
    }

    Ok(())
}

fn print_ledger(user_id: UserId, ledger: &UserLedger) {
    if ledger.statements.is_empty() {
        println!("No statements found.");
    } else {
        println!(
            "{:<6} {:<10} {:>12}  {:<30}",
            "SEQ", "TYPE", "AMOUNT", "DESCRIPTION"
        );
        println!("{}", "-".repeat(62));
        for statement in &ledger.statements {
            let signed = crate::domain::signed_amount(user_id, statement);
            println!(
                "{:<6} {:<10} {:>12}  {:<30}",
                statement.sequence,
                statement.operation,
                format_cents(signed),
                truncate(&statement.description, 30)
            );
        }
        println!("{}", "-".repeat(62));
    }
    println!("Balance: {}", format_cents(ledger.balance));
}

fn print_statement(statement: &Statement) {
    println!("Statement: {}", statement.id);
    println!("  Sequence:    {}", statement.sequence);
    println!("  Type:        {}", statement.operation);
    println!("  Amount:      {}", format_cents(statement.amount_cents));
    println!("  Owner:       {}", statement.user_id);
    if let Some(counterpart) = statement.counterpart_id {
        println!("  Receiver:    {}", counterpart);
    }
    if !statement.description.is_empty() {
        println!("  Description: {}", statement.description);
    }
    println!(
        "  Created:     {}",
        statement.created_at.format("%Y-%m-%d %H:%M:%S")
    );
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_user_id(id: &str) -> Result<UserId> {
    Uuid::parse_str(id).context("Invalid user ID format (expected UUID)")
}

fn parse_amount(amount: &str) -> Result<i64> {
    parse_cents(amount).context("Invalid amount format. Use '50.00' or '50'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer description", 10), "a much ...");
    }

    #[test]
    fn test_parse_transfer_command() {
        let payer = Uuid::new_v4().to_string();
        let payee = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from([
            "statement-ledger",
            "--database",
            "test.db",
            "transfer",
            "12.50",
            "--user",
            &payer,
            "--to",
            &payee,
            "-d",
            "dinner",
        ])
        .unwrap();

        assert_eq!(cli.database, "test.db");
        match cli.command {
            Commands::Transfer {
                amount,
                user,
                to,
                description,
            } => {
                assert_eq!(amount, "12.50");
                assert_eq!(user, payer);
                assert_eq!(to, payee);
                assert_eq!(description, "dinner");
            }
            _ => panic!("expected transfer command"),
        }
    }

    #[test]
    fn test_invalid_user_id() {
        assert!(parse_user_id("not-a-uuid").is_err());
        assert!(parse_amount("abc").is_err());
        assert_eq!(parse_amount("1.5").unwrap(), 150);
    }
}

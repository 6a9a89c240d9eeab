//! # CLI Layer
//!
//! The only place in the workspace that:
//! - installs a `tracing` subscriber
//! - turns flags into a [`CashbackContext`]
//! - prints to stdout
//!
//! Library errors are wrapped with `anyhow` context and surface in `main` as
//! `Error: ...` on stderr with exit code 1.

use super::print::{
    print_card, print_cards, print_history, print_list, print_message, MessageLevel,
};
use super::setup::{Cli, Commands};
use anyhow::{anyhow, Context, Result};
use cashbackapp::init::{initialize, CashbackContext};
use cashbackapp::model::{Card, CardId};
use cashbackapp::service::{CardFilter, CardService};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let CashbackContext { mut service, .. } =
        initialize(cli.data_dir.clone(), cli.storage.as_deref())
            .context("failed to open card storage")?;

    let command = cli.command.unwrap_or(Commands::List {
        bank: None,
        category: None,
        status: None,
    });
    dispatch(&mut service, command)
}

/// `RUST_LOG` wins; otherwise warnings only, or library debug output with `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,cashbackapp=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn dispatch(service: &mut CardService, command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            bank,
            card,
            category,
            cashback,
            date,
        } => {
            let mut card = Card::new(bank, card, category, cashback, date.unwrap_or_else(today));
            let id = service.add_card(&mut card)?;
            print_message(MessageLevel::Success, &format!("Added card {}", id));
        }
        Commands::Update {
            id,
            bank,
            card,
            category,
            cashback,
            date,
            status,
        } => {
            let mut existing = require_card(service, id)?;
            if let Some(bank) = bank {
                existing.bank_name = bank;
            }
            if let Some(card) = card {
                existing.card_name = card;
            }
            if let Some(category) = category {
                existing.category = category;
            }
            if let Some(cashback) = cashback {
                existing.cashback = cashback;
            }
            if let Some(date) = date {
                existing.category_change_date = date;
            }
            if let Some(status) = status {
                existing.status = status;
            }
            service.update_card(&existing)?;
            print_message(MessageLevel::Success, &format!("Updated card {}", id));
        }
        Commands::Delete { id } => {
            if service.get_card(id)?.is_none() {
                print_message(MessageLevel::Warning, &format!("No card with id {}", id));
                return Ok(());
            }
            service.delete_card(id)?;
            print_message(MessageLevel::Success, &format!("Deleted card {}", id));
        }
        Commands::List {
            bank,
            category,
            status,
        } => {
            let filter = CardFilter {
                bank,
                category,
                status,
            };
            print_cards(&service.filter_cards(&filter)?);
        }
        Commands::Show { id } => print_card(&require_card(service, id)?),
        Commands::History { id } => print_history(&service.get_card_history(id)?),
        Commands::Best { category } => match service.find_best_card_for_category(&category)? {
            Some(card) => print_card(&card),
            None => print_message(
                MessageLevel::Info,
                &format!("No active card for category '{}'", category),
            ),
        },
        Commands::Expiring { date, mark } => {
            let date = date.unwrap_or_else(today);
            if mark {
                let expired = service.expire_due_cards(date)?;
                print_cards(&expired);
                print_message(
                    MessageLevel::Success,
                    &format!("Marked {} card(s) as expired", expired.len()),
                );
            } else {
                print_cards(&service.get_expiring_cards(date)?);
            }
        }
        Commands::Banks => print_list(&service.banks()?, "No banks yet."),
        Commands::Categories => print_list(&service.categories()?, "No categories yet."),
    }
    Ok(())
}

fn require_card(service: &CardService, id: CardId) -> Result<Card> {
    service
        .get_card(id)?
        .ok_or_else(|| anyhow!("card {} not found", id))
}

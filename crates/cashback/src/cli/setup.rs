use cashbackapp::model::{CardId, CardStatus};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cashback", bin_name = "cashback", version)]
#[command(about = "Track which bank card pays the best cashback", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Storage backend: sqlite, json or xml
    #[arg(short, long, global = true, help_heading = "Options")]
    pub storage: Option<String>,

    /// Root directory for data files
    #[arg(long, global = true, help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new card
    #[command(display_order = 1)]
    Add {
        bank: String,
        card: String,
        category: String,
        /// Cashback rate in percent (0-100)
        cashback: f64,
        /// Category change date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Change a card's fields; only the given ones are touched
    #[command(display_order = 2)]
    Update {
        id: CardId,
        #[arg(long)]
        bank: Option<String>,
        #[arg(long)]
        card: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        cashback: Option<f64>,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// ACTIVE or EXPIRED
        #[arg(long)]
        status: Option<CardStatus>,
    },

    /// Delete a card (its history is kept)
    #[command(alias = "rm", display_order = 3)]
    Delete { id: CardId },

    /// List cards, optionally filtered
    #[command(alias = "ls", display_order = 4)]
    List {
        /// Exact bank name
        #[arg(long)]
        bank: Option<String>,
        /// Category (case-insensitive)
        #[arg(long)]
        category: Option<String>,
        /// ACTIVE or EXPIRED
        #[arg(long)]
        status: Option<CardStatus>,
    },

    /// Show one card
    #[command(display_order = 5)]
    Show { id: CardId },

    /// Show a card's cashback history, newest first
    #[command(display_order = 6)]
    History { id: CardId },

    /// Find the active card with the highest rate for a category
    #[command(display_order = 7)]
    Best { category: String },

    /// List active cards due on a date
    #[command(display_order = 8)]
    Expiring {
        /// Cut-off date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Mark the due cards as expired
        #[arg(long)]
        mark: bool,
    },

    /// List distinct bank names
    #[command(display_order = 9)]
    Banks,

    /// List distinct categories
    #[command(display_order = 10)]
    Categories,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_date() {
        let cli = Cli::try_parse_from([
            "cashback", "add", "Alfa", "Black", "Fuel", "5.5", "--date", "2024-06-01",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Add { cashback, date, .. }) => {
                assert_eq!(cashback, 5.5);
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["cashback", "list", "--storage", "xml", "-v"]).unwrap();
        assert_eq!(cli.storage.as_deref(), Some("xml"));
        assert!(cli.verbose);
    }

    #[test]
    fn status_is_parsed_case_insensitively() {
        let cli = Cli::try_parse_from(["cashback", "list", "--status", "expired"]).unwrap();
        match cli.command {
            Some(Commands::List { status, .. }) => assert_eq!(status, Some(CardStatus::Expired)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(Cli::try_parse_from(["cashback", "expiring", "--date", "June"]).is_err());
    }
}

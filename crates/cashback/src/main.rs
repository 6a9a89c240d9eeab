//! # Cashback CLI
//!
//! The binary is intentionally thin: this file only invokes `cli::run()` and
//! handles process termination. Everything the user sees is produced under
//! `src/cli/`, and everything it manipulates lives in the `cashbackapp`
//! library.
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  CLI (crates/cashback/src/cli/)                  │
//! │  - clap argument parsing (setup.rs)              │
//! │  - logging + context wiring, dispatch            │
//! │    (commands.rs)                                 │
//! │  - terminal output (print.rs)                    │
//! └──────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌──────────────────────────────────────────────────┐
//! │  CardService (crates/cashbackapp/src/service.rs) │
//! └──────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌──────────────────────────────────────────────────┐
//! │  CardStore: SQLite | JSON | XML                  │
//! └──────────────────────────────────────────────────┘
//! ```

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

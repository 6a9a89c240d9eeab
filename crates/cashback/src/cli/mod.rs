//! # CLI Behavior
//!
//! This is one UI client for the cashback library. It is the only place that
//! knows about terminal I/O, exit codes and output formatting.
//!
//! Running `cashback` with no command lists all cards.
//!
//! ## Module Structure
//!
//! - `setup`: argument parsing via clap
//! - `commands`: logging setup, context wiring and per-command handlers
//! - `print`: tables, colors, messages

mod commands;
mod print;
pub mod setup;

pub use commands::run;

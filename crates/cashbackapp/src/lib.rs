//! # cashbackapp
//!
//! Track bank cards, the category each one currently pays cashback on, and
//! the history of those terms.
//!
//! ## Layers
//!
//! - [`model`]: `Card`, `CardHistory` and their invariants.
//! - [`store`]: the [`CardStore`](store::CardStore) contract and its SQLite,
//!   JSON, XML and in-memory implementations, plus the factory that picks one.
//! - [`service`]: [`CardService`](service::CardService), the one entry point a
//!   UI talks to.
//! - [`config`] and [`init`]: startup wiring.
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod config;
pub mod error;
pub mod init;
pub mod model;
pub mod service;
pub mod store;

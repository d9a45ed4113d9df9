//! Local persistence for the memory game: settings, finished games and purchased packs.
//!
//! Everything is stored as JSON documents in a [`KeyValueStore`], the shape of browser local
//! storage. [`HistoryStore`] and [`PurchaseLedger`] plug into a game session as its
//! [`memomatch_core::HistorySink`] and [`memomatch_core::Entitlements`].

pub use error::*;
pub use history::*;
pub use kv::*;
pub use purchases::*;
pub use settings::*;

mod error;
mod history;
mod kv;
mod purchases;
mod settings;

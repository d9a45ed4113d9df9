//! Match engine of a tile-matching memory game.
//!
//! A [`GameSession`] deals a shuffled deck for a [`SessionConfig`] and drives a [`MatchEngine`]
//! through reveals, matches and flip-backs, reporting to the collaborators in [`ports`].

pub use card::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use grid::*;
pub use ports::*;
pub use score::*;
pub use session::*;
pub use symbols::*;
pub use types::*;

mod card;
mod engine;
mod error;
mod generator;
mod grid;
pub mod ports;
mod score;
mod session;
mod symbols;
mod types;

use thiserror::Error;

use crate::CardId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Grid of {cards} cards cannot be split into groups of {group}")]
    UnevenGrid { cards: usize, group: usize },
    #[error("Unknown grid option {0:?}")]
    UnknownGrid(String),
    #[error("Symbol pool is empty")]
    EmptyPool,
    #[error("At least one symbol group is required")]
    InvalidSymbolCount,
    #[error("Deck has no cards")]
    EmptyDeck,
    #[error("No card with id {0}")]
    UnknownCard(CardId),
}

pub type Result<T> = core::result::Result<T, GameError>;

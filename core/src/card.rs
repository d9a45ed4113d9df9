use serde::{Deserialize, Serialize};

use crate::*;

/// Face state of a card as tracked by the match engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    #[default]
    Hidden,
    Revealed,
    Matched,
}

impl CardState {
    pub const fn is_face_up(self) -> bool {
        matches!(self, Self::Revealed | Self::Matched)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub value: String,
    pub display: String,
    pub image_ref: Option<String>,
    pub sprite: Option<Sprite>,
    pub state: CardState,
}

impl Card {
    pub fn from_symbol(id: CardId, symbol: &SymbolItem) -> Self {
        Self {
            id,
            value: symbol.value.clone(),
            display: symbol.display.clone(),
            image_ref: symbol.image_ref.clone(),
            sprite: symbol.sprite,
            state: CardState::Hidden,
        }
    }
}

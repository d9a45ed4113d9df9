use serde::{Deserialize, Serialize};

use crate::*;

/// Cell of a sprite sheet holding the artwork of a symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub index: u16,
    pub columns: u16,
    pub rows: u16,
}

/// Static description of one symbol that can appear on cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolItem {
    /// Match key, cards match when their values are equal.
    pub value: String,
    pub display: String,
    pub image_ref: Option<String>,
    pub sprite: Option<Sprite>,
}

impl SymbolItem {
    pub fn new(value: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display: display.into(),
            image_ref: None,
            sprite: None,
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprite = Some(sprite);
        self
    }
}

const ANIMALS: [(&str, &str); 8] = [
    ("cat", "Pisica"),
    ("dog", "Catel"),
    ("chicken", "Gaina"),
    ("cow", "Vaca"),
    ("pig", "Purcel"),
    ("elephant", "Elefant"),
    ("monkey", "Maimuta"),
    ("frog", "Broasca"),
];

const HOSPITAL: [&str; 8] = [
    "ambulance",
    "doctor",
    "nurse",
    "stethoscope",
    "syringe",
    "bandage",
    "thermometer",
    "pill",
];

const UTILITY_CARS: [&str; 8] = [
    "fire-truck",
    "police-car",
    "garbage-truck",
    "tow-truck",
    "excavator",
    "bulldozer",
    "tractor",
    "crane",
];

const SHEET_COLUMNS: u16 = 4;
const SHEET_ROWS: u16 = 2;

fn sprite_sheet(category: CategoryId, names: &[&str]) -> Vec<SymbolItem> {
    let sheet = format!("assets/cards/{category}-sprites/sheet.png");
    names
        .iter()
        .zip(0u16..)
        .map(|(&name, index)| {
            SymbolItem::new(name, name)
                .with_image(sheet.clone())
                .with_sprite(Sprite {
                    index,
                    columns: SHEET_COLUMNS,
                    rows: SHEET_ROWS,
                })
        })
        .collect()
}

/// Symbols of one category, in catalog order.
pub fn symbols_for(category: CategoryId) -> Vec<SymbolItem> {
    match category {
        CategoryId::Animals => ANIMALS
            .iter()
            .map(|&(value, display)| {
                SymbolItem::new(value, display)
                    .with_image(format!("assets/cards/animals/{value}.png"))
            })
            .collect(),
        CategoryId::Letters => ('A'..='H')
            .map(|letter| {
                SymbolItem::new(letter, letter)
                    .with_image(format!("assets/cards/letters/{letter}.png"))
            })
            .collect(),
        CategoryId::Numbers => (0..10)
            .map(|digit| {
                let value = digit.to_string();
                let image = format!("assets/cards/numbers/{value}.png");
                SymbolItem::new(value.clone(), value).with_image(image)
            })
            .collect(),
        CategoryId::Hospital => sprite_sheet(category, &HOSPITAL),
        CategoryId::UtilityCars => sprite_sheet(category, &UTILITY_CARS),
    }
}

/// Flattens the given categories into one pool. Repeated categories contribute once.
pub fn build_pool(categories: &[CategoryId]) -> Vec<SymbolItem> {
    let mut seen = Vec::with_capacity(categories.len());
    let mut pool = Vec::new();
    for &category in categories {
        if seen.contains(&category) {
            continue;
        }
        seen.push(category);
        pool.extend(symbols_for(category));
    }
    pool
}

use std::rc::Rc;

use memomatch_core::{
    CategoryId, GroupSize, SessionConfig, default_grid_id_for_size, normalize_grid_id_for_size,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::*;

pub const SETTINGS_KEY: &str = "memory-game-settings-v1";

/// Player choices persisted between launches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Category picked on the main menu.
    pub category: CategoryId,
    /// Categories combined into one pool by the pack screen.
    pub categories: Vec<CategoryId>,
    pub match_size: GroupSize,
    pub grid_id: String,
    pub sound_on: bool,
    pub music_on: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            category: CategoryId::Animals,
            categories: vec![CategoryId::Animals],
            match_size: GroupSize::Two,
            grid_id: default_grid_id_for_size(GroupSize::Two),
            sound_on: true,
            music_on: true,
        }
    }
}

impl Settings {
    /// Reads settings from an untrusted JSON document.
    ///
    /// Fields with unexpected types or unknown values fall back to their defaults one by one, so a
    /// partly broken document still keeps whatever is valid in it.
    pub fn from_json(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            log::warn!("Stored settings are not an object, using defaults");
            return Self::default();
        };

        let match_size = fields
            .get("matchSize")
            .and_then(Value::as_u64)
            .and_then(|size| u8::try_from(size).ok())
            .and_then(|size| GroupSize::try_from(size).ok())
            .unwrap_or_default();

        let category = fields
            .get("category")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        let mut categories: Vec<CategoryId> = fields
            .get("categories")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|raw| raw.parse().ok())
                    .collect()
            })
            .unwrap_or_default();
        let mut seen = Vec::with_capacity(categories.len());
        categories.retain(|&category| {
            let first = !seen.contains(&category);
            seen.push(category);
            first
        });
        if categories.is_empty() {
            categories.push(category);
        }

        // older builds stored the board under `difficulty`
        let raw_grid = fields
            .get("gridId")
            .or_else(|| fields.get("difficulty"))
            .and_then(Value::as_str);
        let grid_id = normalize_grid_id_for_size(match_size, raw_grid);

        let flag = |name: &str| fields.get(name).and_then(Value::as_bool).unwrap_or(true);

        Self {
            category,
            categories,
            match_size,
            grid_id,
            sound_on: flag("soundOn"),
            music_on: flag("musicOn"),
        }
    }

    /// Changes the group size, keeping the grid if it is still offered.
    pub fn set_match_size(&mut self, size: GroupSize) {
        self.match_size = size;
        self.grid_id = normalize_grid_id_for_size(size, Some(&self.grid_id));
    }

    /// Adds or removes `category` from the pool selection. The last category cannot be removed.
    pub fn toggle_category(&mut self, category: CategoryId) {
        if let Some(index) = self.categories.iter().position(|&c| c == category) {
            if self.categories.len() > 1 {
                self.categories.remove(index);
            }
        } else {
            self.categories.push(category);
        }
    }

    pub fn session_config(&self, seed: u64) -> SessionConfig {
        SessionConfig::new(self.match_size, self.grid_id.clone(), self.categories.clone())
            .with_seed(seed)
    }
}

pub struct SettingsStore {
    store: Rc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads the stored settings, never failing: unreadable storage yields the defaults.
    pub fn load(&self) -> Settings {
        match read_json(self.store.as_ref(), SETTINGS_KEY) {
            Ok(Some(value)) => Settings::from_json(&value),
            Ok(None) => Settings::default(),
            Err(err) => {
                log::warn!("Could not read settings, using defaults: {err}");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        write_json(self.store.as_ref(), SETTINGS_KEY, settings)
    }
}

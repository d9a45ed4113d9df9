use std::rc::Rc;

use chrono::{DateTime, Utc};
use memomatch_core::{CategoryId, GameRecord, GroupSize, HistorySink, score};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::*;

pub const HISTORY_KEY: &str = "memory-game-history-v1";
pub const MAX_HISTORY_ENTRIES: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub played_at: DateTime<Utc>,
    pub categories: Vec<CategoryId>,
    pub match_size: GroupSize,
    pub grid_id: String,
    pub moves: u32,
    #[serde(default)]
    pub duration_seconds: u64,
    pub total_matches: u32,
    pub score: u32,
}

impl HistoryEntry {
    fn from_record(record: &GameRecord, played_at: DateTime<Utc>, suffix: u32) -> Self {
        Self {
            id: format!("{}-{}", played_at.timestamp_millis(), base36(suffix)),
            played_at,
            categories: record.categories.clone(),
            match_size: record.group_size,
            grid_id: record.grid_id.clone(),
            moves: record.moves,
            duration_seconds: record.elapsed_secs,
            total_matches: record.total_matches,
            score: score(
                record.moves,
                record.total_matches,
                record.elapsed_secs,
                record.group_size,
            ),
        }
    }
}

/// Stored document: `{"recentGames": [...]}`, newest first.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryDocument<'a> {
    recent_games: &'a [HistoryEntry],
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub top_score: Option<u32>,
    /// Newest first.
    pub recent_games: Vec<HistoryEntry>,
}

/// Local record of finished games.
pub struct HistoryStore {
    store: Rc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored entries, newest first. Entries that fail to parse are skipped.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        let mut value = match read_json(self.store.as_ref(), HISTORY_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(err) => {
                log::warn!("Could not read game history: {err}");
                return Vec::new();
            }
        };

        let Some(Value::Array(items)) = value.get_mut("recentGames").map(Value::take) else {
            log::warn!("Stored game history has no list of recent games");
            return Vec::new();
        };

        items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<HistoryEntry>(item).ok())
            .filter(|entry| !entry.categories.is_empty())
            .take(MAX_HISTORY_ENTRIES)
            .collect()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let recent_games = self.entries();
        HistorySnapshot {
            top_score: recent_games.iter().map(|entry| entry.score).max(),
            recent_games,
        }
    }

    /// Prepends a finished game, dropping the oldest entries beyond the cap.
    ///
    /// Games without moves, matches or categories are not recorded.
    pub fn record_at(&self, record: &GameRecord, played_at: DateTime<Utc>) -> Result<()> {
        if record.moves == 0 || record.total_matches == 0 || record.categories.is_empty() {
            log::debug!("Skipping empty game record");
            return Ok(());
        }

        let entry = HistoryEntry::from_record(record, played_at, rand::rng().random());
        let mut entries = self.entries();
        entries.insert(0, entry);
        entries.truncate(MAX_HISTORY_ENTRIES);
        let document = HistoryDocument {
            recent_games: &entries,
        };
        write_json(self.store.as_ref(), HISTORY_KEY, &document)
    }
}

impl HistorySink for HistoryStore {
    fn record_game(&self, record: &GameRecord) {
        if let Err(err) = self.record_at(record, Utc::now()) {
            log::error!("Could not save game history: {err}");
        }
    }
}

fn base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

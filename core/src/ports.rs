//! Narrow interfaces to the collaborators around the match engine.
//!
//! All calls are fire-and-forget from the engine's point of view: nothing returned here can change
//! the outcome of a reveal.

use core::cell::{Cell, RefCell};
use core::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Instant;

use crate::*;

/// Read access to which symbol categories the player may use.
pub trait Entitlements {
    fn is_category_unlocked(&self, category: CategoryId) -> bool;
    fn fallback_category(&self) -> CategoryId;
}

/// Entitlements that unlock every category.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllUnlocked;

impl Entitlements for AllUnlocked {
    fn is_category_unlocked(&self, _: CategoryId) -> bool {
        true
    }

    fn fallback_category(&self) -> CategoryId {
        CategoryId::Animals
    }
}

/// Summary of a finished game, handed to the history collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub categories: Vec<CategoryId>,
    pub group_size: GroupSize,
    pub grid_id: String,
    pub moves: u32,
    pub total_matches: u32,
    pub elapsed_secs: u64,
}

pub trait HistorySink {
    fn record_game(&self, record: &GameRecord);
}

/// History sink that forgets everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoHistory;

impl HistorySink for NoHistory {
    fn record_game(&self, _: &GameRecord) {}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("audio cue failed: {0}")]
pub struct CueError(pub String);

pub trait AudioCues {
    fn play_flip(&self) -> core::result::Result<(), CueError>;
    fn play_match_sound(&self, value: &str) -> core::result::Result<(), CueError>;
    fn play_victory(&self) -> core::result::Result<(), CueError>;
    fn play_button(&self) -> core::result::Result<(), CueError>;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoAudio;

impl AudioCues for NoAudio {
    fn play_flip(&self) -> core::result::Result<(), CueError> {
        Ok(())
    }

    fn play_match_sound(&self, _: &str) -> core::result::Result<(), CueError> {
        Ok(())
    }

    fn play_victory(&self) -> core::result::Result<(), CueError> {
        Ok(())
    }

    fn play_button(&self) -> core::result::Result<(), CueError> {
        Ok(())
    }
}

/// Deferred delivery of flip-back tickets.
///
/// When the delay elapses the host hands the ticket back to [`GameSession::flip_back`].
pub trait FlipBackScheduler {
    fn schedule(&self, ticket: FlipBackTicket, delay: Duration);
    fn cancel(&self, ticket: FlipBackTicket);
}

/// Scheduler driven by explicit calls to [`ManualScheduler::advance`] instead of a real timer.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    queue: RefCell<Vec<(Duration, FlipBackTicket)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Moves virtual time forward and returns the tickets that came due, earliest first.
    pub fn advance(&self, by: Duration) -> Vec<FlipBackTicket> {
        let now = self.now.get() + by;
        self.now.set(now);

        let mut queue = self.queue.borrow_mut();
        let mut due: Vec<_> = queue.iter().copied().filter(|&(at, _)| at <= now).collect();
        queue.retain(|&(at, _)| at > now);
        due.sort_by_key(|&(at, _)| at);
        due.into_iter().map(|(_, ticket)| ticket).collect()
    }
}

impl FlipBackScheduler for ManualScheduler {
    fn schedule(&self, ticket: FlipBackTicket, delay: Duration) {
        let at = self.now.get() + delay;
        self.queue.borrow_mut().push((at, ticket));
    }

    fn cancel(&self, ticket: FlipBackTicket) {
        self.queue.borrow_mut().retain(|&(_, queued)| queued != ticket);
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

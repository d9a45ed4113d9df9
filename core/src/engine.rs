use core::num::Saturating;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::*;

/// Delay before a mismatched reveal set turns face down again.
pub const FLIP_BACK_DELAY: Duration = Duration::from_millis(800);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    #[default]
    Ready,
    Active,
    Locked,
    Won,
}

impl EngineState {
    pub const fn accepts_input(self) -> bool {
        matches!(self, Self::Ready | Self::Active)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won)
    }
}

/// Handle of the single pending flip-back of an engine.
///
/// `session` distinguishes engines built for different games, so a timer that outlives its game
/// can never touch the cards of the next one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlipBackTicket {
    pub session: u64,
    pub sequence: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    Matched { value: String },
    Mismatched { ticket: FlipBackTicket },
    Won { value: String },
}

impl RevealOutcome {
    pub const fn has_update(&self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipBackOutcome {
    FlippedBack,
    Stale,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchEngine {
    cards: Vec<Card>,
    group: GroupSize,
    revealed: Vec<usize>,
    locked: bool,
    moves: Saturating<u32>,
    matches_found: u32,
    total_matches: u32,
    won: bool,
    session: u64,
    flip_sequence: u32,
    pending_flip_back: Option<FlipBackTicket>,
}

impl MatchEngine {
    pub fn new(deck: Vec<Card>, group: GroupSize, session: u64) -> Result<Self> {
        if deck.is_empty() {
            return Err(GameError::EmptyDeck);
        }
        if deck.len() % group.get() != 0 {
            return Err(GameError::UnevenGrid {
                cards: deck.len(),
                group: group.get(),
            });
        }

        let total_matches = (deck.len() / group.get()) as u32;
        Ok(Self {
            cards: deck,
            group,
            revealed: Vec::with_capacity(group.get()),
            locked: false,
            moves: Saturating(0),
            matches_found: 0,
            total_matches,
            won: false,
            session,
            flip_sequence: 0,
            pending_flip_back: None,
        })
    }

    pub fn state(&self) -> EngineState {
        if self.won {
            EngineState::Won
        } else if self.locked {
            EngineState::Locked
        } else if self.moves.0 == 0 && self.revealed.is_empty() {
            EngineState::Ready
        } else {
            EngineState::Active
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Cards currently face up and waiting to be resolved, in reveal order.
    pub fn revealed(&self) -> impl Iterator<Item = &Card> + '_ {
        self.revealed.iter().map(|&index| &self.cards[index])
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    pub fn group_size(&self) -> GroupSize {
        self.group
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn moves(&self) -> u32 {
        self.moves.0
    }

    pub fn matches_found(&self) -> u32 {
        self.matches_found
    }

    pub fn total_matches(&self) -> u32 {
        self.total_matches
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn pending_flip_back(&self) -> Option<FlipBackTicket> {
        self.pending_flip_back
    }

    /// Share of groups found, rounded to a whole percent.
    pub fn progress_percent(&self) -> u8 {
        if self.total_matches == 0 {
            return 0;
        }
        let percent = (self.matches_found as f64 / self.total_matches as f64 * 100.0).round();
        percent.min(100.0) as u8
    }

    pub fn reveal(&mut self, id: CardId) -> Result<RevealOutcome> {
        let index = self
            .cards
            .iter()
            .position(|card| card.id == id)
            .ok_or(GameError::UnknownCard(id))?;

        if self.locked || self.cards[index].state != CardState::Hidden {
            log::trace!("Ignoring reveal of card {id}");
            return Ok(RevealOutcome::NoChange);
        }

        self.cards[index].state = CardState::Revealed;
        self.revealed.push(index);
        log::trace!(
            "Revealed card {id} ({}/{})",
            self.revealed.len(),
            self.group
        );

        if self.revealed.len() < self.group.get() {
            return Ok(RevealOutcome::Revealed);
        }

        self.moves += 1;
        Ok(self.evaluate_match())
    }

    pub fn flip_back(&mut self, ticket: FlipBackTicket) -> FlipBackOutcome {
        if self.pending_flip_back != Some(ticket) {
            log::debug!("Dropping stale flip-back {ticket:?}");
            return FlipBackOutcome::Stale;
        }

        for &index in &self.revealed {
            self.cards[index].state = CardState::Hidden;
        }
        self.revealed.clear();
        self.pending_flip_back = None;
        self.locked = false;
        FlipBackOutcome::FlippedBack
    }

    fn evaluate_match(&mut self) -> RevealOutcome {
        self.locked = true;

        let first = &self.cards[self.revealed[0]].value;
        let is_match = self.revealed[1..]
            .iter()
            .all(|&index| &self.cards[index].value == first);

        if !is_match {
            self.flip_sequence = self.flip_sequence.wrapping_add(1);
            let ticket = FlipBackTicket {
                session: self.session,
                sequence: self.flip_sequence,
            };
            self.pending_flip_back = Some(ticket);
            return RevealOutcome::Mismatched { ticket };
        }

        let value = first.clone();
        for &index in &self.revealed {
            self.cards[index].state = CardState::Matched;
        }
        self.revealed.clear();
        self.matches_found += 1;
        self.locked = false;

        if self.matches_found == self.total_matches {
            self.won = true;
            RevealOutcome::Won { value }
        } else {
            RevealOutcome::Matched { value }
        }
    }
}

use core::time::Duration;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::*;

const CONFETTI_PIECES: usize = 100;

/// What the host asks for when starting a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub group_size: GroupSize,
    pub grid_id: String,
    pub categories: Vec<CategoryId>,
    /// Seed of the deck shuffles, restarts draw follow-up seeds from it.
    pub seed: u64,
}

impl SessionConfig {
    pub fn new(group_size: GroupSize, grid_id: impl Into<String>, categories: Vec<CategoryId>) -> Self {
        Self {
            group_size,
            grid_id: grid_id.into(),
            categories,
            seed: rand::random(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Requested categories the player may use, or the fallback category when none are left.
    pub fn resolve_categories(&self, entitlements: &dyn Entitlements) -> Vec<CategoryId> {
        resolve_categories(&self.categories, entitlements)
    }
}

fn resolve_categories(requested: &[CategoryId], entitlements: &dyn Entitlements) -> Vec<CategoryId> {
    let mut unlocked = Vec::with_capacity(requested.len());
    for &category in requested {
        if entitlements.is_category_unlocked(category) && !unlocked.contains(&category) {
            unlocked.push(category);
        }
    }

    if unlocked.is_empty() {
        let fallback = entitlements.fallback_category();
        log::warn!("None of {requested:?} is unlocked, falling back to {fallback}");
        unlocked.push(fallback);
    }
    unlocked
}

#[derive(Clone)]
pub struct Collaborators {
    pub audio: Rc<dyn AudioCues>,
    pub history: Rc<dyn HistorySink>,
    pub scheduler: Rc<dyn FlipBackScheduler>,
    pub clock: Rc<dyn Clock>,
}

/// Silent collaborators with a [`ManualScheduler`] nobody advances.
///
/// With these defaults the host receives flip-back tickets only through
/// [`RevealOutcome::Mismatched`] and must hand them to [`GameSession::flip_back`] itself once
/// [`FLIP_BACK_DELAY`] has passed; until then the board stays locked.
impl Default for Collaborators {
    fn default() -> Self {
        Self {
            audio: Rc::new(NoAudio),
            history: Rc::new(NoHistory),
            scheduler: Rc::new(ManualScheduler::new()),
            clock: Rc::new(SystemClock),
        }
    }
}

/// One piece of the victory celebration, in percent of the board width and seconds.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfettiPiece {
    pub left: f32,
    pub size: f32,
    pub hue: u16,
    pub delay: f32,
    pub duration: f32,
    pub rotate: f32,
}

/// A running game: the match engine plus the collaborators it reports to.
///
/// Dropping the session cancels a pending flip-back.
pub struct GameSession {
    config: SessionConfig,
    requested: Vec<CategoryId>,
    option: MatchOption,
    engine: MatchEngine,
    collaborators: Collaborators,
    rng: SmallRng,
    generation: u64,
    started_at: Instant,
    finished_after: Option<Duration>,
    celebration: Vec<ConfettiPiece>,
}

impl GameSession {
    /// Resolves `config` and deals the first deck.
    ///
    /// Fails when the grid is unknown or does not split into whole groups.
    pub fn start(
        config: SessionConfig,
        entitlements: &dyn Entitlements,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let requested = config.categories.clone();
        let categories = config.resolve_categories(entitlements);
        let option = match_option(config.group_size, &config.grid_id)?;
        let config = SessionConfig {
            categories,
            ..config
        };

        let mut rng = SmallRng::seed_from_u64(config.seed);
        let generation = 1;
        let engine = deal(&option, &config.categories, &mut rng, generation)?;
        let started_at = collaborators.clock.now();

        log::debug!(
            "Started game {generation}: {} cards in groups of {} from {:?}",
            option.total_cards(),
            option.group_size,
            config.categories
        );
        Ok(Self {
            config,
            requested,
            option,
            engine,
            collaborators,
            rng,
            generation,
            started_at,
            finished_after: None,
            celebration: Vec::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn categories(&self) -> &[CategoryId] {
        &self.config.categories
    }

    pub fn match_option(&self) -> &MatchOption {
        &self.option
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn cards(&self) -> &[Card] {
        self.engine.cards()
    }

    pub fn is_won(&self) -> bool {
        self.engine.is_won()
    }

    pub fn progress_percent(&self) -> u8 {
        self.engine.progress_percent()
    }

    /// Confetti of the last win, empty while the game is running.
    pub fn celebration(&self) -> &[ConfettiPiece] {
        &self.celebration
    }

    pub fn elapsed(&self) -> Duration {
        self.finished_after.unwrap_or_else(|| {
            self.collaborators
                .clock
                .now()
                .saturating_duration_since(self.started_at)
        })
    }

    pub fn reveal(&mut self, id: CardId) -> Result<RevealOutcome> {
        let outcome = self.engine.reveal(id)?;
        if outcome.has_update() {
            self.cue("flip", |audio| audio.play_flip());
        }

        match &outcome {
            RevealOutcome::NoChange | RevealOutcome::Revealed => {}
            RevealOutcome::Matched { value } => {
                self.cue("match", |audio| audio.play_match_sound(value));
            }
            RevealOutcome::Mismatched { ticket } => {
                log::trace!("Mismatch, flip-back scheduled as {ticket:?}");
                self.collaborators
                    .scheduler
                    .schedule(*ticket, FLIP_BACK_DELAY);
            }
            RevealOutcome::Won { value } => {
                self.cue("match", |audio| audio.play_match_sound(value));
                self.finish();
            }
        }
        Ok(outcome)
    }

    /// Turns a mismatched set face down again once its delay has elapsed.
    pub fn flip_back(&mut self, ticket: FlipBackTicket) -> FlipBackOutcome {
        let outcome = self.engine.flip_back(ticket);
        if outcome == FlipBackOutcome::FlippedBack {
            self.cue("flip", |audio| audio.play_flip());
        }
        outcome
    }

    /// Deals a fresh deck with the same configuration, discarding the current game.
    pub fn restart(&mut self) -> Result<()> {
        let categories = self.config.categories.clone();
        self.redeal(categories)
    }

    /// Like [`restart`](Self::restart), but checks the requested categories against
    /// `entitlements` again first, so packs bought or lost since the start take effect.
    pub fn restart_with(&mut self, entitlements: &dyn Entitlements) -> Result<()> {
        let categories = resolve_categories(&self.requested, entitlements);
        self.redeal(categories)
    }

    fn redeal(&mut self, categories: Vec<CategoryId>) -> Result<()> {
        let generation = self.generation.wrapping_add(1);
        let engine = deal(&self.option, &categories, &mut self.rng, generation)?;

        self.abandon();
        self.config.categories = categories;
        self.engine = engine;
        self.generation = generation;
        self.started_at = self.collaborators.clock.now();
        self.finished_after = None;
        self.celebration.clear();
        log::debug!("Restarted as game {generation} from {:?}", self.config.categories);
        Ok(())
    }

    /// Cancels pending deferred work, used when the player leaves the board.
    pub fn abandon(&mut self) {
        if let Some(ticket) = self.engine.pending_flip_back() {
            log::debug!("Cancelling pending flip-back {ticket:?}");
            self.collaborators.scheduler.cancel(ticket);
        }
    }

    pub fn play_button(&self) {
        self.cue("button", |audio| audio.play_button());
    }

    fn finish(&mut self) {
        let elapsed = self.elapsed();
        self.finished_after = Some(elapsed);
        self.celebration = confetti(&mut self.rng, CONFETTI_PIECES);
        self.cue("victory", |audio| audio.play_victory());

        let record = GameRecord {
            categories: self.config.categories.clone(),
            group_size: self.option.group_size,
            grid_id: self.config.grid_id.clone(),
            moves: self.engine.moves(),
            total_matches: self.engine.total_matches(),
            elapsed_secs: elapsed.as_secs(),
        };
        log::debug!(
            "Game {} won in {} moves after {}s",
            self.generation,
            record.moves,
            record.elapsed_secs
        );
        self.collaborators.history.record_game(&record);
    }

    fn cue(
        &self,
        name: &str,
        play: impl FnOnce(&dyn AudioCues) -> core::result::Result<(), CueError>,
    ) {
        if let Err(err) = play(self.collaborators.audio.as_ref()) {
            log::debug!("Ignoring failed {name} cue: {err}");
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.abandon();
    }
}

fn deal(
    option: &MatchOption,
    categories: &[CategoryId],
    rng: &mut SmallRng,
    generation: u64,
) -> Result<MatchEngine> {
    let unique_needed = option.unique_needed()?;
    let pool = build_pool(categories);
    let deck = RandomDeckGenerator::new(rng.random()).generate(
        &pool,
        option.group_size,
        unique_needed,
    )?;
    MatchEngine::new(deck, option.group_size, generation)
}

fn confetti(rng: &mut SmallRng, count: usize) -> Vec<ConfettiPiece> {
    (0..count)
        .map(|_| ConfettiPiece {
            left: rng.random_range(0.0..100.0),
            size: rng.random_range(6.0..12.0),
            hue: rng.random_range(0..360),
            delay: rng.random_range(0.0..0.6),
            duration: rng.random_range(2.2..3.8),
            rotate: rng.random_range(0.0..360.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use core::cell::{Cell, RefCell};

    use super::*;

    #[derive(Default)]
    struct RecordingAudio {
        cues: RefCell<Vec<String>>,
        broken: bool,
    }

    impl RecordingAudio {
        fn push(&self, cue: impl Into<String>) -> core::result::Result<(), CueError> {
            self.cues.borrow_mut().push(cue.into());
            if self.broken {
                Err(CueError("device lost".into()))
            } else {
                Ok(())
            }
        }

        fn count(&self, cue: &str) -> usize {
            self.cues.borrow().iter().filter(|c| *c == cue).count()
        }
    }

    impl AudioCues for RecordingAudio {
        fn play_flip(&self) -> core::result::Result<(), CueError> {
            self.push("flip")
        }

        fn play_match_sound(&self, value: &str) -> core::result::Result<(), CueError> {
            self.push(format!("match:{value}"))
        }

        fn play_victory(&self) -> core::result::Result<(), CueError> {
            self.push("victory")
        }

        fn play_button(&self) -> core::result::Result<(), CueError> {
            self.push("button")
        }
    }

    #[derive(Default)]
    struct RecordingHistory(RefCell<Vec<GameRecord>>);

    impl HistorySink for RecordingHistory {
        fn record_game(&self, record: &GameRecord) {
            self.0.borrow_mut().push(record.clone());
        }
    }

    struct FakeClock {
        start: Instant,
        offset: Cell<Duration>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                offset: Cell::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            self.offset.set(self.offset.get() + by);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.start + self.offset.get()
        }
    }

    struct OnlyFree;

    impl Entitlements for OnlyFree {
        fn is_category_unlocked(&self, category: CategoryId) -> bool {
            !matches!(category, CategoryId::Hospital | CategoryId::UtilityCars)
        }

        fn fallback_category(&self) -> CategoryId {
            CategoryId::Animals
        }
    }

    struct Harness {
        audio: Rc<RecordingAudio>,
        history: Rc<RecordingHistory>,
        scheduler: Rc<ManualScheduler>,
        clock: Rc<FakeClock>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                audio: Rc::new(RecordingAudio::default()),
                history: Rc::new(RecordingHistory::default()),
                scheduler: Rc::new(ManualScheduler::new()),
                clock: Rc::new(FakeClock::new()),
            }
        }

        fn collaborators(&self) -> Collaborators {
            Collaborators {
                audio: self.audio.clone(),
                history: self.history.clone(),
                scheduler: self.scheduler.clone(),
                clock: self.clock.clone(),
            }
        }

        fn start(&self, group: GroupSize, grid_id: &str, categories: &[CategoryId]) -> GameSession {
            let config = SessionConfig::new(group, grid_id, categories.to_vec()).with_seed(11);
            GameSession::start(config, &AllUnlocked, self.collaborators()).unwrap()
        }
    }

    /// Ids of all still hidden cards grouped by value, in first-seen order.
    fn hidden_groups(session: &GameSession) -> Vec<Vec<CardId>> {
        let mut groups: Vec<(String, Vec<CardId>)> = Vec::new();
        for card in session.cards() {
            if card.state != CardState::Hidden {
                continue;
            }
            match groups.iter_mut().find(|(value, _)| *value == card.value) {
                Some((_, ids)) => ids.push(card.id),
                None => groups.push((card.value.clone(), vec![card.id])),
            }
        }
        groups.into_iter().map(|(_, ids)| ids).collect()
    }

    /// Two hidden cards with different values.
    fn mismatched_pair(session: &GameSession) -> (CardId, CardId) {
        let groups = hidden_groups(session);
        (groups[0][0], groups[1][0])
    }

    #[test]
    fn pairs_deck_has_two_of_each_value() {
        let harness = Harness::new();
        let session = harness.start(GroupSize::Two, "16", &[CategoryId::Animals]);

        assert_eq!(session.cards().len(), 16);
        let groups = hidden_groups(&session);
        assert_eq!(groups.len(), 8);
        assert!(groups.iter().all(|ids| ids.len() == 2));
    }

    #[test]
    fn matching_pair_counts_one_move_and_one_match() {
        let harness = Harness::new();
        let mut session = harness.start(GroupSize::Two, "16", &[CategoryId::Animals]);
        let pair = hidden_groups(&session)[0].clone();

        session.reveal(pair[0]).unwrap();
        let outcome = session.reveal(pair[1]).unwrap();

        assert!(matches!(outcome, RevealOutcome::Matched { .. }));
        assert_eq!(session.engine().matches_found(), 1);
        assert_eq!(session.engine().moves(), 1);
        for id in pair {
            assert_eq!(session.engine().card(id).unwrap().state, CardState::Matched);
        }
        assert_eq!(harness.audio.count("flip"), 2);
    }

    #[test]
    fn mismatch_flips_back_after_delay() {
        let harness = Harness::new();
        let mut session = harness.start(GroupSize::Two, "16", &[CategoryId::Animals]);
        let (a, b) = mismatched_pair(&session);

        session.reveal(a).unwrap();
        assert!(matches!(
            session.reveal(b).unwrap(),
            RevealOutcome::Mismatched { .. }
        ));
        assert!(
            harness
                .scheduler
                .advance(FLIP_BACK_DELAY - Duration::from_millis(1))
                .is_empty()
        );
        assert_eq!(session.engine().card(a).unwrap().state, CardState::Revealed);

        for ticket in harness.scheduler.advance(Duration::from_millis(1)) {
            assert_eq!(session.flip_back(ticket), FlipBackOutcome::FlippedBack);
        }

        assert_eq!(session.engine().card(a).unwrap().state, CardState::Hidden);
        assert_eq!(session.engine().card(b).unwrap().state, CardState::Hidden);
        assert_eq!(session.engine().moves(), 1);
        assert_eq!(session.engine().matches_found(), 0);
        assert_eq!(harness.audio.count("flip"), 3);
        assert!(harness.history.0.borrow().is_empty());
    }

    #[test]
    fn winning_records_history_once() {
        let harness = Harness::new();
        let mut session = harness.start(GroupSize::Three, "12", &[CategoryId::Letters]);

        let (a, b) = mismatched_pair(&session);
        session.reveal(a).unwrap();
        session.reveal(b).unwrap();
        for ticket in harness.scheduler.advance(FLIP_BACK_DELAY) {
            session.flip_back(ticket);
        }

        harness.clock.advance(Duration::from_secs(45));
        let groups = hidden_groups(&session);
        let total = groups.len() as u32;
        let mut wins = 0;
        for ids in groups {
            for id in ids {
                if let RevealOutcome::Won { .. } = session.reveal(id).unwrap() {
                    wins += 1;
                }
            }
        }

        assert_eq!(wins, 1);
        assert!(session.is_won());
        assert_eq!(session.celebration().len(), 100);
        assert_eq!(harness.audio.count("victory"), 1);

        let records = harness.history.0.borrow();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            GameRecord {
                categories: vec![CategoryId::Letters],
                group_size: GroupSize::Three,
                grid_id: "12".into(),
                moves: total + 1,
                total_matches: total,
                elapsed_secs: 45,
            }
        );
    }

    #[test]
    fn restart_cancels_pending_flip_back() {
        let harness = Harness::new();
        let mut session = harness.start(GroupSize::Two, "8", &[CategoryId::Numbers]);
        let (a, b) = mismatched_pair(&session);
        session.reveal(a).unwrap();
        let RevealOutcome::Mismatched { ticket } = session.reveal(b).unwrap() else {
            panic!("expected a mismatch");
        };

        session.restart().unwrap();

        assert_eq!(harness.scheduler.pending(), 0);
        assert_eq!(session.flip_back(ticket), FlipBackOutcome::Stale);
        assert_eq!(session.engine().moves(), 0);
        assert_eq!(session.engine().matches_found(), 0);
        assert!(!session.engine().is_locked());
        assert!(
            session
                .cards()
                .iter()
                .all(|card| card.state == CardState::Hidden)
        );
    }

    #[test]
    fn dropping_the_session_cancels_pending_flip_back() {
        let harness = Harness::new();
        let mut session = harness.start(GroupSize::Four, "8", &[CategoryId::Animals]);
        let groups = hidden_groups(&session);
        for &id in &groups[0][..3] {
            session.reveal(id).unwrap();
        }
        session.reveal(groups[1][0]).unwrap();
        assert_eq!(harness.scheduler.pending(), 1);

        drop(session);
        assert_eq!(harness.scheduler.pending(), 0);
    }

    #[test]
    fn locked_categories_are_replaced_by_fallback() {
        let config = SessionConfig::new(GroupSize::Two, "16", vec![CategoryId::Hospital]);
        assert_eq!(config.resolve_categories(&OnlyFree), vec![CategoryId::Animals]);

        let config = SessionConfig::new(
            GroupSize::Two,
            "16",
            vec![CategoryId::Hospital, CategoryId::Letters, CategoryId::Letters],
        );
        assert_eq!(config.resolve_categories(&OnlyFree), vec![CategoryId::Letters]);

        let session = GameSession::start(config, &OnlyFree, Collaborators::default()).unwrap();
        assert_eq!(session.categories(), &[CategoryId::Letters]);
    }

    #[test]
    fn restart_rechecks_entitlements() {
        let harness = Harness::new();
        let config = SessionConfig::new(
            GroupSize::Two,
            "8",
            vec![CategoryId::Hospital, CategoryId::Numbers],
        )
        .with_seed(3);
        let mut session = GameSession::start(config, &OnlyFree, harness.collaborators()).unwrap();
        assert_eq!(session.categories(), &[CategoryId::Numbers]);

        session.restart().unwrap();
        assert_eq!(session.categories(), &[CategoryId::Numbers]);

        session.restart_with(&AllUnlocked).unwrap();
        assert_eq!(
            session.categories(),
            &[CategoryId::Hospital, CategoryId::Numbers]
        );

        session.restart_with(&OnlyFree).unwrap();
        assert_eq!(session.categories(), &[CategoryId::Numbers]);
    }

    #[test]
    fn default_collaborators_leave_flip_back_to_host() {
        let config =
            SessionConfig::new(GroupSize::Two, "8", vec![CategoryId::Animals]).with_seed(4);
        let mut session = GameSession::start(config, &AllUnlocked, Collaborators::default()).unwrap();
        let (a, b) = mismatched_pair(&session);

        session.reveal(a).unwrap();
        let RevealOutcome::Mismatched { ticket } = session.reveal(b).unwrap() else {
            panic!("expected a mismatch");
        };
        assert!(session.engine().is_locked());

        assert_eq!(session.flip_back(ticket), FlipBackOutcome::FlippedBack);
        assert!(!session.engine().is_locked());
    }

    #[test]
    fn unknown_grid_cannot_start() {
        let config = SessionConfig::new(GroupSize::Three, "16", vec![CategoryId::Animals]);
        let err = GameSession::start(config, &AllUnlocked, Collaborators::default()).err();
        assert_eq!(err, Some(GameError::UnknownGrid("16".into())));
    }

    #[test]
    fn broken_audio_does_not_interrupt_play() {
        let harness = Harness {
            audio: Rc::new(RecordingAudio {
                broken: true,
                ..Default::default()
            }),
            ..Harness::new()
        };
        let mut session = harness.start(GroupSize::Two, "8", &[CategoryId::Letters]);
        session.play_button();
        let pair = hidden_groups(&session)[0].clone();

        session.reveal(pair[0]).unwrap();
        session.reveal(pair[1]).unwrap();

        assert_eq!(session.engine().matches_found(), 1);
        assert_eq!(harness.audio.count("button"), 1);
    }

    #[test]
    fn small_pool_cycles_into_full_deck() {
        let harness = Harness::new();
        // 10 pairs from 8 letters
        let session = harness.start(GroupSize::Two, "20", &[CategoryId::Letters]);
        assert_eq!(session.cards().len(), 20);

        let session = harness.start(GroupSize::Four, "20", &[CategoryId::Letters]);
        assert_eq!(session.cards().len(), 20);
        assert_eq!(session.engine().total_matches(), 5);
    }
}

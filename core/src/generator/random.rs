use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use super::*;

/// Generation strategy that picks symbols uniformly at random from the pool, cycling through the
/// pool again when it holds fewer symbols than the board needs.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomDeckGenerator {
    seed: u64,
}

impl RandomDeckGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DeckGenerator for RandomDeckGenerator {
    fn generate(
        self,
        pool: &[SymbolItem],
        group: GroupSize,
        unique_needed: usize,
    ) -> Result<Vec<Card>> {
        if unique_needed == 0 {
            return Err(GameError::InvalidSymbolCount);
        }
        if pool.is_empty() {
            return Err(GameError::EmptyPool);
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let symbols = pick_symbols(&mut rng, pool, unique_needed);

        let mut deck = Vec::with_capacity(unique_needed * group.get());
        let mut next_id: CardId = 1;
        for symbol in symbols {
            for _ in 0..group.get() {
                deck.push(Card::from_symbol(next_id, symbol));
                next_id += 1;
            }
        }

        deck.shuffle(&mut rng);
        log::debug!(
            "Generated deck of {} cards ({} groups of {}) from a pool of {}",
            deck.len(),
            unique_needed,
            group,
            pool.len()
        );
        Ok(deck)
    }
}

fn pick_symbols<'a>(
    rng: &mut SmallRng,
    pool: &'a [SymbolItem],
    count: usize,
) -> Vec<&'a SymbolItem> {
    let mut shuffled: Vec<&SymbolItem> = pool.iter().collect();

    if count <= pool.len() {
        shuffled.shuffle(rng);
        shuffled.truncate(count);
        return shuffled;
    }

    log::debug!(
        "Pool of {} symbols is short of {}, cycling through it",
        pool.len(),
        count
    );
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count {
        shuffled.shuffle(rng);
        let take = (count - picked.len()).min(shuffled.len());
        picked.extend_from_slice(&shuffled[..take]);
    }
    picked
}

use crate::*;
pub use random::*;

mod random;

pub trait DeckGenerator {
    /// Builds a deck holding `unique_needed` symbol groups of `group` cards each.
    fn generate(self, pool: &[SymbolItem], group: GroupSize, unique_needed: usize)
    -> Result<Vec<Card>>;
}

//! One grid site: an optional bot plus the grass/organic substrates
//! (component C4).

use crate::bot::Bot;

const SUBSTRATE_MAX: f64 = 255.0;
const SUBSTRATE_MIN: f64 = 0.0;

/// A single site of the [`crate::field::Field`] grid.
///
/// Invariants: at most one bot; `grass`/`organic` stay clamped to
/// `[0, 255]`; `should_die` is only ever cleared by [`Cell::sweep`].
#[derive(Clone, Debug, Default)]
pub struct Cell {
    bot: Option<Bot>,
    should_die: bool,
    grass: f64,
    organic: f64,
}

impl Cell {
    pub fn new() -> Self {
        Self {
            bot: None,
            should_die: false,
            grass: SUBSTRATE_MAX,
            organic: SUBSTRATE_MIN,
        }
    }

    pub fn has_bot(&self) -> bool {
        self.bot.is_some()
    }

    pub fn bot(&self) -> Option<&Bot> {
        self.bot.as_ref()
    }

    pub fn bot_mut(&mut self) -> Option<&mut Bot> {
        self.bot.as_mut()
    }

    /// Install `bot` into this cell. In debug builds this panics if the
    /// cell is already occupied; release builds silently overwrite, per the
    /// crate's precondition-violation policy (callers — the Field — must
    /// only ever call this on an empty cell).
    pub fn set_bot(&mut self, bot: Bot) {
        debug_assert!(self.bot.is_none(), "cell already occupied");
        self.bot = Some(bot);
    }

    pub fn take_bot(&mut self) -> Option<Bot> {
        self.bot.take()
    }

    pub fn should_die(&self) -> bool {
        self.should_die
    }

    pub fn set_should_die(&mut self, value: bool) {
        self.should_die = value;
    }

    /// Remove the bot and clear the latch if `should_die` was set,
    /// returning the removed bot so the caller can notify observers.
    pub fn sweep(&mut self) -> Option<Bot> {
        if self.should_die {
            self.should_die = false;
            self.bot.take()
        } else {
            None
        }
    }

    pub fn grass(&self) -> f64 {
        self.grass
    }

    pub fn set_grass(&mut self, grass: f64) {
        self.grass = grass.clamp(SUBSTRATE_MIN, SUBSTRATE_MAX);
    }

    pub fn organic(&self) -> f64 {
        self.organic
    }

    pub fn set_organic(&mut self, organic: f64) {
        self.organic = organic.clamp(SUBSTRATE_MIN, SUBSTRATE_MAX);
    }

    pub fn is_alive(&self) -> bool {
        self.has_bot() && !self.should_die
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample_bot() -> Bot {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let species = Species::random(&mut rng, 0);
        Bot::new((0, 0), 0, 10.0, species)
    }

    #[test]
    fn substrate_setters_clamp_to_valid_range() {
        let mut cell = Cell::new();
        cell.set_grass(1000.0);
        assert_eq!(cell.grass(), 255.0);
        cell.set_grass(-5.0);
        assert_eq!(cell.grass(), 0.0);
        cell.set_organic(-1.0);
        assert_eq!(cell.organic(), 0.0);
    }

    #[test]
    fn sweep_only_removes_bot_when_latched() {
        let mut cell = Cell::new();
        cell.set_bot(sample_bot());
        assert!(cell.sweep().is_none());
        assert!(cell.has_bot());

        cell.set_should_die(true);
        let removed = cell.sweep();
        assert!(removed.is_some());
        assert!(!cell.has_bot());
        assert!(!cell.should_die());
    }

    #[test]
    fn is_alive_requires_bot_and_no_death_latch() {
        let mut cell = Cell::new();
        assert!(!cell.is_alive());
        cell.set_bot(sample_bot());
        assert!(cell.is_alive());
        cell.set_should_die(true);
        assert!(!cell.is_alive());
    }
}

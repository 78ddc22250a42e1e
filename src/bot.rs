//! Per-bot bytecode interpreter (component C5).

use std::rc::Rc;

use rand::Rng;

use crate::cell::Cell;
use crate::field::Settings;
use crate::rotation;
use crate::species::Species;
use crate::topology::Topology;

/// What a bot decided to do this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    Skip,
    Move,
    Multiply,
    Die,
    Attack,
}

/// The output of one [`Bot::decide`] call: an action, a direction (`-1`
/// meaning "no direction"), and organic matter to release into the acting
/// cell during the apply phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub direction: i32,
    pub organic: f64,
}

impl Decision {
    pub fn skip() -> Self {
        Self {
            action: Action::Skip,
            direction: -1,
            organic: 0.0,
        }
    }
}

/// Read-only (plus the acting cell's grass) view of the field a bot needs to
/// decide its move. Built fresh per bot by [`crate::field::Field`]'s decide
/// phase; a bot never sees another bot mutably.
pub struct DecideCtx<'a, R: Rng> {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub topology: &'a Topology,
    pub cells: &'a [Cell],
    pub grass: &'a mut f64,
    pub own_organic: f64,
    pub rng: &'a mut R,
    pub settings: &'a Settings,
}

impl<'a, R: Rng> DecideCtx<'a, R> {
    fn cell_at(&self, x: i32, y: i32) -> &Cell {
        &self.cells[(y * self.width + x) as usize]
    }
}

/// A single automaton occupying one cell.
#[derive(Clone, Debug)]
pub struct Bot {
    ip: u8,
    age: u32,
    energy: f64,
    kills: u32,
    eats: u32,
    pos: (i32, i32),
    rotation: u8,
    species: Rc<Species>,
}

impl Bot {
    pub fn new(pos: (i32, i32), rotation: u8, energy: f64, species: Rc<Species>) -> Self {
        debug_assert!(rotation < 8);
        Self {
            ip: 0,
            age: 0,
            energy,
            kills: 0,
            eats: 0,
            pos,
            rotation,
            species,
        }
    }

    pub fn position(&self) -> (i32, i32) {
        self.pos
    }

    pub fn set_position(&mut self, pos: (i32, i32)) {
        self.pos = pos;
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: u8) {
        self.rotation = rotation % 8;
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy;
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn ip(&self) -> u8 {
        self.ip
    }

    pub fn set_ip(&mut self, ip: u8) {
        self.ip = ip;
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn eats(&self) -> u32 {
        self.eats
    }

    pub fn species(&self) -> &Rc<Species> {
        &self.species
    }

    pub fn record_kill(&mut self) {
        self.kills += 1;
    }

    /// Run the fetch-execute loop for one tick and produce a [`Decision`].
    pub fn decide<R: Rng>(&mut self, ctx: &mut DecideCtx<R>) -> Decision {
        self.age += 1;
        if self.age > ctx.settings.lifetime {
            return Decision {
                action: Action::Die,
                direction: -1,
                organic: 0.0,
            };
        }

        let mut decision = Decision::skip();
        let mut running = true;

        while running && self.energy > 0.0 {
            let word = self.species.gene(self.ip as usize);
            let opcode = word % 16;

            match opcode {
                1 => {
                    // MOVE
                    let rot_word = self.species.gene((self.ip as usize + 1) % 256);
                    let dir = self.decode_rotation(rot_word, ctx.rng);
                    decision.action = Action::Move;
                    decision.direction = dir as i32;
                    running = false;
                    self.ip = self.ip.wrapping_add(2);
                }
                2 => {
                    // ROTATE
                    let rot_word = self.species.gene((self.ip as usize + 1) % 256);
                    self.rotation = self.decode_rotation(rot_word, ctx.rng);
                    self.ip = self.ip.wrapping_add(2);
                }
                3 => {
                    // JMP
                    let addr_word = self.species.gene((self.ip as usize + 1) % 256);
                    self.ip = self.decode_address(addr_word, ctx.rng);
                }
                4 => {
                    // EAT
                    let eaten = (ctx.settings.eat_efficiency * *ctx.grass).min(ctx.settings.energy_gain);
                    let grass_consumed = eaten / ctx.settings.eat_efficiency;
                    *ctx.grass -= grass_consumed;
                    self.energy += eaten;
                    self.eats += 1;
                    decision.organic += ctx.settings.eaten_organic_ratio * (grass_consumed - eaten);
                    if ctx.settings.eat_long {
                        decision.action = Action::Skip;
                        decision.direction = -1;
                        running = false;
                    }
                    self.ip = self.ip.wrapping_add(1);
                }
                5 => {
                    // SKIP
                    decision.action = Action::Skip;
                    decision.direction = -1;
                    running = false;
                    self.ip = self.ip.wrapping_add(1);
                }
                6 => {
                    // DIE
                    decision.action = Action::Die;
                    decision.direction = -1;
                    running = false;
                    self.ip = self.ip.wrapping_add(1);
                }
                7 => {
                    // MULTIPLY
                    let rot_word = self.species.gene((self.ip as usize + 1) % 256);
                    let dir = self.decode_rotation(rot_word, ctx.rng);
                    if self.energy > ctx.settings.multiply_cost {
                        decision.action = Action::Multiply;
                        decision.direction = dir as i32;
                        self.energy -= ctx.settings.multiply_cost;
                        decision.organic += (ctx.settings.multiply_cost - ctx.settings.start_energy)
                            * ctx.settings.used_energy_organic_ratio;
                        running = false;
                    }
                    self.ip = self.ip.wrapping_add(2);
                }
                8 => {
                    // ATTACK
                    let rot_word = self.species.gene((self.ip as usize + 1) % 256);
                    let dir = self.decode_rotation(rot_word, ctx.rng);
                    decision.action = Action::Attack;
                    decision.direction = dir as i32;
                    running = false;
                    self.ip = self.ip.wrapping_add(2);
                }
                9 => {
                    // TEST_EMPTY
                    let coord_word = self.species.gene((self.ip as usize + 3) % 256);
                    let test = match self.decode_coords(coord_word, ctx) {
                        Some((nx, ny)) => !ctx.cell_at(nx, ny).has_bot(),
                        None => false,
                    };
                    self.branch(test, ctx);
                }
                10 => {
                    // TEST_ENEMY
                    let coord_word = self.species.gene((self.ip as usize + 3) % 256);
                    let test = match self.decode_coords(coord_word, ctx) {
                        Some((nx, ny)) => ctx
                            .cell_at(nx, ny)
                            .bot()
                            .is_some_and(|other| Species::difference(&self.species, other.species()) != 0),
                        None => false,
                    };
                    self.branch(test, ctx);
                }
                11 => {
                    // TEST_ALLY
                    let coord_word = self.species.gene((self.ip as usize + 3) % 256);
                    let test = match self.decode_coords(coord_word, ctx) {
                        Some((nx, ny)) => ctx
                            .cell_at(nx, ny)
                            .bot()
                            .is_some_and(|other| Species::difference(&self.species, other.species()) == 0),
                        None => false,
                    };
                    self.branch(test, ctx);
                }
                12 => {
                    // TEST_ENERGY
                    let threshold = self.species.gene((self.ip as usize + 3) % 256) as f64;
                    let test = self.energy > threshold;
                    self.branch(test, ctx);
                }
                13 => {
                    // TEST_GRASS
                    let threshold = (self.species.gene((self.ip as usize + 3) % 256) % 256) as f64;
                    let test = *ctx.grass > threshold;
                    self.branch(test, ctx);
                }
                14 => {
                    // TEST_ORGANIC
                    let threshold = (self.species.gene((self.ip as usize + 3) % 256) % 256) as f64;
                    let test = ctx.own_organic > threshold;
                    self.branch(test, ctx);
                }
                _ => {
                    // NOP (opcodes 0 and 15, plus anything else % 16 never hits here)
                    self.ip = self.ip.wrapping_add(1);
                }
            }

            if opcode != 6 {
                decision.organic +=
                    self.use_energy(ctx.settings.instruction_cost, ctx.settings.used_energy_organic_ratio);
            }
        }

        decision.organic += self.use_energy(1.0, ctx.settings.used_energy_organic_ratio);

        if self.energy <= 0.0 {
            if decision.action == Action::Multiply {
                decision.organic += ctx.settings.start_energy * ctx.settings.died_organic_ratio;
            }
            decision.action = Action::Die;
        }

        decision
    }

    fn branch<R: Rng>(&mut self, test: bool, ctx: &mut DecideCtx<R>) {
        let addr_word = self.species.gene((self.ip as usize + if test { 1 } else { 2 }) % 256);
        self.ip = self.decode_address(addr_word, ctx.rng);
    }

    fn decode_rotation<R: Rng>(&self, word: u16, rng: &mut R) -> u8 {
        if word & (1 << 4) != 0 {
            ((self.rotation as u16 + word % 8) % 8) as u8
        } else if word & (1 << 3) != 0 {
            (word % 8) as u8
        } else {
            rng.gen_range(0..8)
        }
    }

    fn decode_address<R: Rng>(&self, word: u16, rng: &mut R) -> u8 {
        if word & (1 << 9) != 0 {
            ((self.ip as u16 + word % 256) % 256) as u8
        } else if word & (1 << 8) != 0 {
            (word % 256) as u8
        } else {
            rng.gen_range(0..256) as u8
        }
    }

    fn decode_coords<R: Rng>(&self, word: u16, ctx: &mut DecideCtx<R>) -> Option<(i32, i32)> {
        let r = self.decode_rotation(word, ctx.rng);
        let (dx, dy) = rotation::offset(r);
        ctx.topology
            .normalize(ctx.width, ctx.height, self.pos.0 + dx, self.pos.1 + dy, r)
            .map(|(nx, ny, _)| (nx, ny))
    }

    /// Decrement energy by `e`, never below zero; return the organic credit
    /// for whatever energy was actually burned.
    fn use_energy(&mut self, e: f64, ratio: f64) -> f64 {
        let actual = if self.energy > 0.0 { e.min(self.energy) } else { 0.0 };
        self.energy -= actual;
        actual * ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Settings;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ctx_harness<'a>(
        cells: &'a [Cell],
        grass: &'a mut f64,
        topology: &'a Topology,
        settings: &'a Settings,
        rng: &'a mut ChaCha8Rng,
    ) -> DecideCtx<'a, ChaCha8Rng> {
        DecideCtx {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
            topology,
            cells,
            grass,
            own_organic: 0.0,
            rng,
            settings,
        }
    }

    fn genome_with(first_words: &[u16]) -> Rc<Species> {
        let mut genome = [0u16; crate::species::GENOME_LEN];
        for (i, w) in first_words.iter().enumerate() {
            genome[i] = *w;
        }
        Species::from_parts([0, 0, 0, 255], genome, 0)
    }

    #[test]
    fn aged_past_lifetime_is_forced_to_die() {
        let species = genome_with(&[5]); // SKIP, irrelevant: age check short-circuits first
        let mut bot = Bot::new((0, 0), 0, 100.0, species);
        bot.age = 999;

        let cells = vec![Cell::new(); 16];
        let topology = Topology::Torus;
        let settings = Settings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut grass = 255.0;
        let mut ctx = ctx_harness(&cells, &mut grass, &topology, &settings, &mut rng);

        let decision = bot.decide(&mut ctx);
        assert_eq!(decision.action, Action::Die);
    }

    #[test]
    fn move_opcode_with_absolute_rotation_bit_set() {
        // word 1 = opcode MOVE; word (1<<3)|2 = absolute rotation 2.
        let species = genome_with(&[1, (1 << 3) | 2]);
        let mut bot = Bot::new((1, 1), 0, 100.0, species);

        let cells = vec![Cell::new(); 16];
        let topology = Topology::Torus;
        let settings = Settings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut grass = 255.0;
        let mut ctx = ctx_harness(&cells, &mut grass, &topology, &settings, &mut rng);

        let decision = bot.decide(&mut ctx);
        assert_eq!(decision.action, Action::Move);
        assert_eq!(decision.direction, 2);
    }

    #[test]
    fn die_opcode_releases_no_mid_loop_organic_but_pays_tick_end_cost() {
        let species = genome_with(&[6]);
        let mut bot = Bot::new((0, 0), 0, 10.0, species);

        let cells = vec![Cell::new(); 16];
        let topology = Topology::Torus;
        let settings = Settings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut grass = 255.0;
        let mut ctx = ctx_harness(&cells, &mut grass, &topology, &settings, &mut rng);

        let decision = bot.decide(&mut ctx);
        assert_eq!(decision.action, Action::Die);
        // DIE itself doesn't pay instruction_cost (opcode == 6 is excluded),
        // only the flat tick-end use_energy(1.0) applies.
        assert!((decision.organic - settings.used_energy_organic_ratio * 1.0).abs() < 1e-9);
    }

    #[test]
    fn eat_converts_grass_to_energy_at_configured_efficiency() {
        let species = genome_with(&[4, 5]); // EAT then SKIP
        let mut bot = Bot::new((0, 0), 0, 1.0, species);

        let cells = vec![Cell::new(); 16];
        let topology = Topology::Torus;
        let settings = Settings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut grass = 10.0;
        let energy_before = bot.energy();
        {
            let mut ctx = ctx_harness(&cells, &mut grass, &topology, &settings, &mut rng);
            let decision = bot.decide(&mut ctx);
            // eat_long defaults true, so EAT ends the tick as a SKIP action.
            assert_eq!(decision.action, Action::Skip);
        }
        let eaten = (settings.eat_efficiency * 10.0).min(settings.energy_gain);
        assert!((bot.energy() - (energy_before + eaten - settings.instruction_cost - 1.0)).abs() < 1e-9);
        assert!(grass < 10.0);
    }

    #[test]
    fn starving_bot_is_forced_to_die_after_instruction_cost() {
        let species = genome_with(&[5]); // SKIP
        let mut bot = Bot::new((0, 0), 0, 0.05, species);

        let cells = vec![Cell::new(); 16];
        let topology = Topology::Torus;
        let settings = Settings::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut grass = 255.0;
        let mut ctx = ctx_harness(&cells, &mut grass, &topology, &settings, &mut rng);

        let decision = bot.decide(&mut ctx);
        assert_eq!(decision.action, Action::Die);
    }
}

//! The world: grid of cells, tick pipeline, runtime settings (component C6).

use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::bot::{Action, Bot, DecideCtx, Decision};
use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::observer::Observer;
use crate::rotation;
use crate::species::Species;
use crate::topology::Topology;

/// Every runtime-tunable knob of the simulation. `Default` gives the
/// reference values; a harness can load an alternate set via `serde`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub lifetime: u32,
    pub mutation_chance: f64,
    pub energy_gain: f64,
    pub multiply_cost: f64,
    pub start_energy: f64,
    pub instruction_cost: f64,
    pub kill_gain_ratio: f64,
    pub eat_efficiency: f64,
    pub grass_growth: f64,
    pub grass_spread: f64,
    pub eat_long: bool,
    pub used_energy_organic_ratio: f64,
    pub eaten_organic_ratio: f64,
    pub kill_organic_ratio: f64,
    pub died_organic_ratio: f64,
    pub organic_grass_ratio: f64,
    pub organic_spread: f64,
    pub organic_spoil: f64,
    pub grass_death: f64,
    pub dead_grass_organic_ratio: f64,
    pub preserve_energy: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lifetime: 256,
            mutation_chance: 0.001,
            energy_gain: 10.0,
            multiply_cost: 20.0,
            start_energy: 10.0,
            instruction_cost: 0.1,
            kill_gain_ratio: 0.5,
            eat_efficiency: 0.5,
            grass_growth: 0.05,
            grass_spread: 0.1,
            eat_long: true,
            used_energy_organic_ratio: 0.5,
            eaten_organic_ratio: 0.5,
            kill_organic_ratio: 0.5,
            died_organic_ratio: 0.25,
            organic_grass_ratio: 5.0,
            organic_spread: 0.1,
            organic_spoil: 0.05,
            grass_death: 0.05,
            dead_grass_organic_ratio: 0.5,
            preserve_energy: false,
        }
    }
}

/// Owns the grid and drives the six-phase tick. Single-threaded: `update()`
/// runs to completion and is atomic from the caller's perspective.
pub struct Field {
    width: i32,
    height: i32,
    topology: Topology,
    cells: Vec<Cell>,
    rng: ChaCha8Rng,
    epoch: u64,
    settings: Settings,
    observer: Option<Box<dyn Observer>>,
}

impl Field {
    pub fn new(width: i32, height: i32, seed: u64) -> Self {
        assert!(width > 0 && height > 0, "field dimensions must be positive");
        Self {
            width,
            height,
            topology: Topology::Torus,
            cells: vec![Cell::new(); (width * height) as usize],
            rng: ChaCha8Rng::seed_from_u64(seed),
            epoch: 0,
            settings: Settings::default(),
            observer: None,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn index(&self, x: i32, y: i32) -> usize {
        debug_assert!((0..self.width).contains(&x) && (0..self.height).contains(&y), "coordinates out of range: ({x}, {y})");
        (y * self.width + x) as usize
    }

    pub fn at(&self, x: i32, y: i32) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    pub fn at_mut(&mut self, x: i32, y: i32) -> &mut Cell {
        let idx = self.index(x, y);
        &mut self.cells[idx]
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Swap in a new topology. Errs if the topology requires a square grid
    /// and this field isn't one; the field is left unchanged on error.
    pub fn set_topology(&mut self, topology: Topology) -> Result<()> {
        if topology.requires_square() && self.width != self.height {
            return Err(Error::NonSquareTopology(topology, self.width, self.height));
        }
        self.topology = topology;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn set_observer(&mut self, observer: Box<dyn Observer>) {
        self.observer = Some(observer);
    }

    /// Clear the field, then independently place a freshly minted random
    /// bot in each cell with probability `density`.
    pub fn random_fill(&mut self, density: f64) {
        self.clear();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.rng.gen_range(0.0..1.0) < density {
                    let species = Species::random(&mut self.rng, self.epoch);
                    let rotation = self.rng.gen_range(0..8u8);
                    let energy = self.settings.start_energy;
                    let idx = self.index(x, y);
                    self.cells[idx].set_bot(Bot::new((x, y), rotation, energy, species));
                }
            }
        }
        log::debug!("random_fill: density={density}, population={}", self.compute_statistics().0);
    }

    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = Cell::new();
        }
        self.epoch = 0;
    }

    pub fn compute_statistics(&self) -> (usize, f64) {
        let population = self.cells.iter().filter(|cell| cell.has_bot()).count();
        (population, self.total_energy())
    }

    /// Run one full tick: decide, apply, substrate update, diffusion, energy
    /// repair, death sweep.
    pub fn update(&mut self) {
        log::trace!("tick {} begin", self.epoch);
        let energy_before = self.total_energy();

        let mut decisions = self.decide_phase();
        self.apply_phase(&mut decisions);
        self.substrate_phase();
        self.diffusion_phase();
        self.energy_repair_phase(energy_before);
        let deaths = self.death_sweep_phase();

        self.epoch += 1;
        log::debug!("tick {} complete, {deaths} deaths", self.epoch);
    }

    fn decide_phase(&mut self) -> Vec<Decision> {
        let mut decisions = vec![Decision::skip(); self.cells.len()];

        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                if !self.cells[idx].has_bot() {
                    continue;
                }

                let mut bot = self.cells[idx].take_bot().unwrap();
                let mut grass = self.cells[idx].grass();
                let own_organic = self.cells[idx].organic();

                let decision = {
                    let mut ctx = DecideCtx {
                        x,
                        y,
                        width: self.width,
                        height: self.height,
                        topology: &self.topology,
                        cells: &self.cells,
                        grass: &mut grass,
                        own_organic,
                        rng: &mut self.rng,
                        settings: &self.settings,
                    };
                    bot.decide(&mut ctx)
                };

                self.cells[idx].set_grass(grass);
                self.cells[idx].set_bot(bot);
                decisions[idx] = decision;
            }
        }

        decisions
    }

    fn apply_phase(&mut self, decisions: &mut [Decision]) {
        for y in 0..self.height {
            for x in 0..self.width {
                let target_idx = self.index(x, y);
                let start_rotation: u8 = self.rng.gen_range(0..8);

                for step in 0..8u8 {
                    let dir = (start_rotation + step) % 8;
                    let (dx, dy) = rotation::offset(dir);
                    let Some((nx, ny, nrot)) = self.topology.normalize(self.width, self.height, x + dx, y + dy, dir)
                    else {
                        continue;
                    };
                    let source_idx = self.index(nx, ny);
                    if !self.cells[source_idx].is_alive() {
                        continue;
                    }
                    let d = decisions[source_idx];
                    if !rotation::opposite(d.direction, nrot) {
                        continue;
                    }
                    let rotation_delta = dir as i32 - nrot as i32;

                    match d.action {
                        Action::Move => {
                            if !self.cells[target_idx].has_bot() {
                                let mut newborn = self.cells[source_idx].bot().unwrap().clone();
                                let new_rotation = (newborn.rotation() as i32 + rotation_delta).rem_euclid(8) as u8;
                                newborn.set_rotation(new_rotation);
                                newborn.set_position((x, y));
                                self.cells[target_idx].set_bot(newborn);
                                if let Some(obs) = self.observer.as_mut() {
                                    obs.handle_bot_moved((nx, ny), (x, y));
                                }
                                self.cells[source_idx].set_should_die(true);
                            }
                        }
                        Action::Multiply => {
                            if !self.cells[target_idx].has_bot() {
                                let parent = self.cells[source_idx].bot().unwrap().species().clone();
                                let child = parent.mutant(&mut self.rng, self.epoch, self.settings.mutation_chance);
                                if !Rc::ptr_eq(&parent, &child) {
                                    log::debug!("speciation at epoch {}: lineage diverged from parent", self.epoch);
                                }
                                let new_rotation = (d.direction + rotation_delta).rem_euclid(8) as u8;
                                let energy = self.settings.start_energy;
                                self.cells[target_idx].set_bot(Bot::new((x, y), new_rotation, energy, child));
                            } else {
                                decisions[source_idx].organic +=
                                    self.settings.used_energy_organic_ratio * self.settings.start_energy;
                            }
                        }
                        Action::Attack => {
                            if self.cells[target_idx].is_alive() {
                                let victim_energy = self.cells[target_idx].bot().unwrap().energy().max(0.0);
                                let gain = self.settings.kill_gain_ratio * victim_energy;
                                if let Some(attacker) = self.cells[source_idx].bot_mut() {
                                    attacker.set_energy(attacker.energy() + gain);
                                    attacker.record_kill();
                                }
                                decisions[source_idx].organic += self.settings.kill_organic_ratio
                                    * (1.0 - self.settings.kill_gain_ratio)
                                    * victim_energy;
                                self.cells[target_idx].set_should_die(true);
                            }
                        }
                        Action::Skip | Action::Die => {}
                    }
                }

                if decisions[target_idx].action == Action::Die && self.cells[target_idx].is_alive() {
                    let energy = self.cells[target_idx].bot().unwrap().energy().max(0.0);
                    self.cells[target_idx].set_should_die(true);
                    decisions[target_idx].organic += self.settings.died_organic_ratio * energy;
                }

                let organic = self.cells[target_idx].organic() + decisions[target_idx].organic;
                self.cells[target_idx].set_organic(organic);
            }
        }
    }

    fn substrate_phase(&mut self) {
        for cell in self.cells.iter_mut() {
            let mut organic = cell.organic() * (1.0 - self.settings.organic_spoil);
            let mut grass = cell.grass();

            organic += self.settings.grass_death * self.settings.dead_grass_organic_ratio * grass;
            grass *= 1.0 - self.settings.grass_death;

            grass += self.settings.grass_growth * self.settings.organic_grass_ratio * organic;
            organic *= 1.0 - self.settings.grass_growth;

            cell.set_grass(grass);
            cell.set_organic(organic);
        }
    }

    fn diffusion_phase(&mut self) {
        let n = self.cells.len();
        let grass_snapshot: Vec<f64> = self.cells.iter().map(Cell::grass).collect();
        let organic_snapshot: Vec<f64> = self.cells.iter().map(Cell::organic).collect();
        let mut grass_delta = vec![0.0; n];
        let mut organic_delta = vec![0.0; n];

        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                let g_flow_unit = self.settings.grass_spread * grass_snapshot[idx];
                let o_flow_unit = self.settings.organic_spread * organic_snapshot[idx];

                for r in 0..8u8 {
                    let (dx, dy) = rotation::offset(r);
                    if let Some((nx, ny, _)) = self.topology.normalize(self.width, self.height, x + dx, y + dy, r) {
                        let nidx = self.index(nx, ny);
                        grass_delta[idx] -= g_flow_unit;
                        grass_delta[nidx] += g_flow_unit;
                        organic_delta[idx] -= o_flow_unit;
                        organic_delta[nidx] += o_flow_unit;
                    }
                }
            }
        }

        for idx in 0..n {
            self.cells[idx].set_grass(grass_snapshot[idx] + grass_delta[idx]);
            self.cells[idx].set_organic(organic_snapshot[idx] + organic_delta[idx]);
        }
    }

    fn total_energy(&self) -> f64 {
        self.cells
            .iter()
            .map(|cell| {
                let bot_term = cell.bot().map(Bot::energy).unwrap_or(0.0)
                    * self.settings.died_organic_ratio
                    * self.settings.organic_grass_ratio;
                cell.grass() + self.settings.organic_grass_ratio * cell.organic() + bot_term
            })
            .sum()
    }

    fn energy_repair_phase(&mut self, energy_before: f64) {
        if !self.settings.preserve_energy {
            return;
        }
        let energy_after = self.total_energy();
        let area = (self.width * self.height) as f64;
        let delta = -(energy_after - energy_before) / (area * self.settings.organic_grass_ratio);
        for cell in self.cells.iter_mut() {
            let organic = cell.organic() + delta;
            cell.set_organic(organic);
        }
    }

    fn death_sweep_phase(&mut self) -> u32 {
        let mut deaths = 0u32;
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                if self.cells[idx].sweep().is_some() {
                    deaths += 1;
                    if let Some(obs) = self.observer.as_mut() {
                        obs.handle_bot_died((x, y));
                    }
                }
            }
        }
        deaths
    }
}

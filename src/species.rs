//! Shared bytecode + colour identity of a bot lineage (component C2).

use std::rc::Rc;

use rand::Rng;

/// Number of 16-bit instruction words in a genome.
pub const GENOME_LEN: usize = 256;

/// A lineage's immutable-by-convention identity: colour, genome, and the
/// epoch it was minted at. Always held behind [`Rc`] — multiple bots
/// reference the same `Species`; a no-mutation [`Species::mutant`] call
/// hands back a clone of the `Rc`, not a fresh allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct Species {
    /// Packed RGBA, alpha always opaque.
    pub color: [u8; 4],
    genome: [u16; GENOME_LEN],
    /// World epoch this species was first minted at.
    pub epoch: u64,
}

impl Species {
    /// Construct directly from parts, e.g. when deserializing a saved bot.
    pub fn from_parts(color: [u8; 4], genome: [u16; GENOME_LEN], epoch: u64) -> Rc<Self> {
        Rc::new(Self {
            color,
            genome,
            epoch,
        })
    }

    /// A freshly minted species: random colour (opaque alpha), every gene
    /// drawn uniformly from the full 16-bit range.
    pub fn random(rng: &mut impl Rng, epoch: u64) -> Rc<Self> {
        let packed: u32 = rng.gen();
        let mut color = packed.to_be_bytes();
        color[3] = 0xFF;

        let mut genome = [0u16; GENOME_LEN];
        for gene in genome.iter_mut() {
            *gene = rng.gen();
        }

        Rc::new(Self {
            color,
            genome,
            epoch,
        })
    }

    /// Gene word at `i`. Panics (in debug) if `i >= GENOME_LEN`; callers must
    /// bounds-check themselves in release, per the crate's precondition model.
    pub fn gene(&self, i: usize) -> u16 {
        debug_assert!(i < GENOME_LEN);
        self.genome[i % GENOME_LEN]
    }

    /// Count of gene indices where `a` and `b` differ.
    pub fn difference(a: &Species, b: &Species) -> usize {
        a.genome.iter().zip(b.genome.iter()).filter(|(x, y)| x != y).count()
    }

    /// Produce a mutant child of `self`. With probability `p` per gene, that
    /// gene is replaced by a fresh random word and the colour is nudged by
    /// one step per channel. If nothing mutated, returns a shared clone of
    /// `self` (the no-mutation fast path) instead of allocating.
    pub fn mutant(self: &Rc<Self>, rng: &mut impl Rng, epoch: u64, p: f64) -> Rc<Species> {
        let mut child: Option<Species> = None;

        for i in 0..GENOME_LEN {
            if rng.gen_range(0.0..1.0) >= p {
                continue;
            }

            let target = child.get_or_insert_with(|| Species {
                color: self.color,
                genome: self.genome,
                epoch,
            });

            target.genome[i] = rng.gen();

            let r_up = rng.gen_range(0.0..1.0) < (epoch as f64 / 100.0).sin() / 2.0 + 0.5;
            bump_channel(&mut target.color[0], r_up);

            let g_up = rng.gen_range(0.0..1.0) < (target.genome[i] % 16) as f64 / 16.0;
            bump_channel(&mut target.color[1], g_up);

            let b_up = rng.gen_range(0.0..1.0) < i as f64 / 255.0;
            bump_channel(&mut target.color[2], b_up);
        }

        match child {
            Some(species) => Rc::new(species),
            None => Rc::clone(self),
        }
    }
}

fn bump_channel(channel: &mut u8, up: bool) {
    if up {
        if *channel != u8::MAX {
            *channel += 1;
        }
    } else if *channel != 0 {
        *channel -= 1;
    }
}

impl std::ops::Index<usize> for Species {
    type Output = u16;

    fn index(&self, i: usize) -> &u16 {
        &self.genome[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn random_species_has_opaque_alpha_and_full_genome() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let species = Species::random(&mut rng, 0);
        assert_eq!(species.color[3], 0xFF);
        assert_eq!((0..GENOME_LEN).map(|i| species.gene(i)).count(), GENOME_LEN);
    }

    #[test]
    fn random_species_is_reproducible_from_seed() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);
        let a = Species::random(&mut rng_a, 0);
        let b = Species::random(&mut rng_b, 0);
        assert_eq!(a.color, b.color);
        assert_eq!(a.genome, b.genome);
    }

    #[test]
    fn no_mutation_returns_shared_reference() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let parent = Species::random(&mut rng, 0);
        let child = parent.mutant(&mut rng, 1, 0.0);
        assert!(Rc::ptr_eq(&parent, &child));
    }

    #[test]
    fn full_mutation_chance_allocates_a_fresh_lineage() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let parent = Species::random(&mut rng, 0);
        let child = parent.mutant(&mut rng, 5, 1.0);
        assert!(!Rc::ptr_eq(&parent, &child));
        assert_eq!(Species::difference(&parent, &child), GENOME_LEN);
        assert_eq!(child.epoch, 5);
    }

    #[test]
    fn mutation_only_touches_genes_it_replaces() {
        // drive enough genomes through a low mutation chance that at least
        // one child mutates only a handful of genes, and verify those are
        // exactly the genes that changed value.
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let parent = Species::random(&mut rng, 0);
        for _ in 0..50 {
            let child = parent.mutant(&mut rng, 1, 0.01);
            let diff = Species::difference(&parent, &child);
            if diff == 0 {
                assert!(Rc::ptr_eq(&parent, &child));
            } else {
                assert!(!Rc::ptr_eq(&parent, &child));
                let changed: Vec<usize> = (0..GENOME_LEN)
                    .filter(|&i| parent.gene(i) != child.gene(i))
                    .collect();
                assert_eq!(changed.len(), diff);
            }
        }
    }

    #[test]
    fn difference_counts_mismatched_genes() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let a = Species::random(&mut rng, 0);
        let mut b = (*a).clone();
        assert_eq!(Species::difference(&a, &b), 0);
        b.genome[10] ^= 0xFFFF;
        assert_eq!(Species::difference(&a, &b), 1);
    }
}

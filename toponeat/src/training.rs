//! A training run evolves successive generations of genomes.
//! Each generation is evaluated by an external fitness function,
//! grouped into species of compatible genomes, and bred into the
//! next generation in proportion to each species' mean fitness.
//!
//! The run keeps every generation it has produced, along with
//! each species' members and representative per generation.
mod config;
mod context;
mod errors;
pub mod logging;
mod offspring;
mod selection;
mod species;

pub use config::TrainerConfig;
pub use context::TrainerContext;
pub use errors::ConfigError;
pub use selection::select_random_weights;
pub use species::{GenomeId, Species, SpeciesId};

use crate::genomics::{Genome, InnovationRegistry};
use offspring::OffspringFactory;
use selection::{allot_offspring, count_successes};

use rand::prelude::{Rng, SeedableRng, SliceRandom};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// A NEAT training run.
///
/// The latest generation is always waiting to be evaluated:
/// each call to [`advance_generation`](Trainer::advance_generation)
/// evaluates it, speciates it and breeds the next one from it.
#[derive(Debug, Clone)]
pub struct Trainer<R = ChaCha8Rng> {
    config: TrainerConfig,
    context: TrainerContext<R>,
    generations: Vec<Vec<Genome>>,
    species: Vec<Species>,
}

impl Trainer<ChaCha8Rng> {
    /// Creates a training run drawing its randomness from a
    /// [`ChaCha8Rng`] seeded with `seed`. Runs with the same
    /// configuration, seed and fitness function are identical.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use toponeat::{Trainer, TrainerConfig};
    ///
    /// let config = TrainerConfig {
    ///     population_size: NonZeroUsize::new(20).unwrap(),
    ///     ..TrainerConfig::zero()
    /// };
    ///
    /// let first = Trainer::seeded(config.clone(), 7).unwrap();
    /// let second = Trainer::seeded(config, 7).unwrap();
    ///
    /// assert_eq!(
    ///     first.current_generation()[3].genes(),
    ///     second.current_generation()[3].genes(),
    /// );
    /// ```
    pub fn seeded(config: TrainerConfig, seed: u64) -> Result<Trainer<ChaCha8Rng>, ConfigError> {
        Trainer::new(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Trainer<R> {
    /// Creates a training run with the passed configuration,
    /// whose first generation is made of `population_size`
    /// fresh, fully-connected genomes.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid
    /// (see [`TrainerConfig::validate`]).
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    /// use toponeat::{Trainer, TrainerConfig};
    ///
    /// let config = TrainerConfig {
    ///     population_size: NonZeroUsize::new(50).unwrap(),
    ///     input_count: NonZeroUsize::new(8).unwrap(),
    ///     output_count: NonZeroUsize::new(8).unwrap(),
    ///     excess_connection_modifier: 1.0,
    ///     disjoint_connection_modifier: 1.0,
    ///     average_weight_difference_modifier: 0.4,
    ///     compatibility_threshold: 0.2,
    ///     interspecies_mating_rate: 0.001,
    ///     connection_disable_rate: 0.75,
    ///     connection_mutation_rate: 0.8,
    ///     connection_perturbation_rate: 0.9,
    ///     connection_segmentation_rate: 0.03,
    ///     connection_generation_rate: 0.05,
    /// };
    ///
    /// let trainer = Trainer::new(config, ChaCha8Rng::seed_from_u64(0)).unwrap();
    ///
    /// assert_eq!(trainer.current_generation().len(), 50);
    /// assert_eq!(trainer.generation_number(), 0);
    /// ```
    pub fn new(config: TrainerConfig, rng: R) -> Result<Trainer<R>, ConfigError> {
        config.validate()?;

        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        let mut context = TrainerContext::new(input_count, output_count, rng);
        let first_generation = (0..config.population_size.get())
            .map(|_| fresh_genome(input_count, output_count, context.rng()))
            .collect();

        Ok(Trainer {
            config,
            context,
            generations: vec![first_generation],
            species: vec![],
        })
    }

    /// Evaluates the current generation with `evaluator`,
    /// speciates it, and breeds the next generation from it.
    ///
    /// Genomes that already have a fitness are not re-evaluated.
    /// `NaN` fitness values are stored as `0.0`.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use toponeat::{Trainer, TrainerConfig};
    ///
    /// let mut trainer = Trainer::seeded(
    ///     TrainerConfig {
    ///         population_size: NonZeroUsize::new(10).unwrap(),
    ///         input_count: NonZeroUsize::new(2).unwrap(),
    ///         ..TrainerConfig::zero()
    ///     },
    ///     42,
    /// )
    /// .unwrap();
    ///
    /// for _ in 0..3 {
    ///     trainer.advance_generation(|genome| {
    ///         let output = genome.evaluate(&[0.5, 1.0])[0];
    ///         1.0 / (1.0 + (output - 1.0).abs())
    ///     });
    /// }
    ///
    /// assert_eq!(trainer.generation_number(), 3);
    /// assert!(trainer.champion().is_some());
    /// ```
    pub fn advance_generation<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&Genome) -> f64,
    {
        for genome in self.current_generation_mut() {
            if genome.fitness().is_none() {
                let fitness = evaluator(genome);
                genome.set_fitness(fitness);
            }
        }
        self.evolve();
    }

    /// Same as [`advance_generation`](Trainer::advance_generation),
    /// but evaluates genomes in parallel. Fitness values are stored
    /// in population order before speciation, so results do not
    /// depend on thread scheduling.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use toponeat::{Trainer, TrainerConfig};
    ///
    /// let mut trainer = Trainer::seeded(
    ///     TrainerConfig {
    ///         population_size: NonZeroUsize::new(16).unwrap(),
    ///         ..TrainerConfig::zero()
    ///     },
    ///     3,
    /// )
    /// .unwrap();
    ///
    /// trainer.advance_generation_par(|genome| genome.genes().len() as f64);
    ///
    /// assert!(trainer.generation(0).unwrap().iter().all(|g| g.fitness() == Some(1.0)));
    /// ```
    pub fn advance_generation_par<E>(&mut self, evaluator: E)
    where
        E: Fn(&Genome) -> f64 + Sync,
    {
        let fitnesses: Vec<Option<f64>> = self
            .current_generation()
            .par_iter()
            .map(|genome| genome.fitness().is_none().then(|| evaluator(genome)))
            .collect();
        for (genome, fitness) in self.current_generation_mut().iter_mut().zip(fitnesses) {
            if let Some(fitness) = fitness {
                genome.set_fitness(fitness);
            }
        }
        self.evolve();
    }

    /// Speciates the evaluated current generation,
    /// breeds and mutates its offspring, and makes
    /// them the new current generation.
    fn evolve(&mut self) {
        let generation = self.generation_number();
        self.speciate(generation);

        let population_size = self.config.population_size.get();
        let interspecies = count_successes(
            population_size,
            self.config.interspecies_mating_rate,
            self.context.rng(),
        );
        let allotted_offspring = self.allot_offspring(generation, population_size - interspecies);

        let offspring = OffspringFactory::new(
            &self.generations[generation],
            &self.species,
            generation,
            &self.config,
            &mut self.context,
        )
        .generate_offspring(interspecies, allotted_offspring);

        self.advance_species(generation);
        self.generations.push(offspring);
    }

    /// Assigns each genome of the generation, in order, to the
    /// first species whose representative is within the
    /// compatibility threshold, founding a new species with the
    /// genome as representative if there is none.
    fn speciate(&mut self, generation: usize) {
        for index in 0..self.generations[generation].len() {
            let genome_id = GenomeId { generation, index };
            let compatible = {
                let genome = &self.generations[generation][index];
                self.species.iter().position(|species| {
                    species.representative(generation).map_or(false, |id| {
                        self.is_compatible(genome, &self.generations[id.generation][id.index])
                    })
                })
            };

            let species_id = match compatible {
                Some(position) => {
                    self.species[position].add_member(genome_id);
                    self.species[position].id()
                }
                None => {
                    let id = SpeciesId(self.species.len());
                    self.species.push(Species::new(id, genome_id));
                    id
                }
            };
            self.generations[generation][index].set_species(species_id);
        }
    }

    fn is_compatible(&self, genome: &Genome, representative: &Genome) -> bool {
        genome.compatibility_distance(
            representative,
            self.config.excess_connection_modifier,
            self.config.disjoint_connection_modifier,
            self.config.average_weight_difference_modifier,
        ) <= self.config.compatibility_threshold
    }

    /// Allots `slots` offspring among species,
    /// by mean fitness in the generation.
    fn allot_offspring(&mut self, generation: usize, slots: usize) -> Vec<usize> {
        let genomes = &self.generations[generation];
        let means: Vec<Option<f64>> = self
            .species
            .iter()
            .map(|s| s.mean_fitness(generation, genomes))
            .collect();
        allot_offspring(&means, slots, self.context.rng())
    }

    /// Picks each species' representative for the next
    /// generation among its current members.
    fn advance_species(&mut self, generation: usize) {
        for species in &mut self.species {
            let representative = species
                .members(generation)
                .choose(self.context.rng())
                .copied();
            species.advance(representative);
        }
    }

    fn current_generation_mut(&mut self) -> &mut [Genome] {
        self.generations
            .last_mut()
            .map(Vec::as_mut_slice)
            .unwrap_or(&mut [])
    }
}

impl<R> Trainer<R> {
    /// Returns every generation produced so far, oldest first.
    /// Only the last one is unevaluated.
    pub fn generations(&self) -> &[Vec<Genome>] {
        &self.generations
    }

    /// Returns generation number `number`, if it exists.
    pub fn generation(&self, number: usize) -> Option<&[Genome]> {
        self.generations.get(number).map(Vec::as_slice)
    }

    /// Returns the generation waiting to be evaluated.
    pub fn current_generation(&self) -> &[Genome] {
        self.generations.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the number of the current generation,
    /// i.e. how many generations have been evaluated.
    pub fn generation_number(&self) -> usize {
        self.generations.len() - 1
    }

    /// Returns the number of the latest evaluated and
    /// speciated generation, or `None` before the first
    /// call to `advance_generation`.
    pub fn evaluated_generation_number(&self) -> Option<usize> {
        self.generation_number().checked_sub(1)
    }

    /// Returns every species that has existed during the run,
    /// indexed by their [`SpeciesId`].
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Returns the species with the given ID.
    pub fn species_by_id(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(id.0)
    }

    /// Returns the genome with the given ID.
    pub fn genome(&self, id: GenomeId) -> Option<&Genome> {
        self.generations.get(id.generation)?.get(id.index)
    }

    /// Returns the best-performing genome of the latest
    /// evaluated generation, or `None` if no generation
    /// has been evaluated yet.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use toponeat::{Trainer, TrainerConfig};
    ///
    /// let mut trainer = Trainer::seeded(
    ///     TrainerConfig {
    ///         population_size: NonZeroUsize::new(20).unwrap(),
    ///         ..TrainerConfig::zero()
    ///     },
    ///     0,
    /// )
    /// .unwrap();
    /// assert!(trainer.champion().is_none());
    ///
    /// let mut fitness = 0.0;
    /// trainer.advance_generation(move |_| {
    ///     fitness += 10.0;
    ///     fitness
    /// });
    ///
    /// assert_eq!(trainer.champion().unwrap().fitness(), Some(20.0 * 10.0));
    /// ```
    pub fn champion(&self) -> Option<&Genome> {
        let generation = self.evaluated_generation_number()?;
        self.generations[generation]
            .iter()
            .filter(|g| g.fitness().is_some())
            .max_by(|a, b| {
                a.fitness()
                    .partial_cmp(&b.fitness())
                    .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
            })
    }

    /// Returns the run's configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Returns the run's innovation registry.
    pub fn registry(&self) -> &InnovationRegistry {
        self.context.registry()
    }
}

fn fresh_genome<R: Rng>(input_count: usize, output_count: usize, rng: &mut R) -> Genome {
    Genome::new(input_count, output_count, rng)
        .unwrap_or_else(|e| panic!("configured node counts rejected: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn config(population_size: usize) -> TrainerConfig {
        TrainerConfig {
            population_size: NonZeroUsize::new(population_size).unwrap(),
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            excess_connection_modifier: 1.0,
            disjoint_connection_modifier: 1.0,
            average_weight_difference_modifier: 0.4,
            compatibility_threshold: 0.3,
            interspecies_mating_rate: 0.05,
            connection_disable_rate: 0.75,
            connection_mutation_rate: 0.8,
            connection_perturbation_rate: 0.9,
            connection_segmentation_rate: 0.2,
            connection_generation_rate: 0.3,
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = TrainerConfig {
            connection_mutation_rate: f64::NAN,
            ..config(5)
        };
        assert!(matches!(
            Trainer::seeded(config, 0),
            Err(ConfigError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn first_generation_is_fresh() {
        let trainer = Trainer::seeded(config(12), 1).unwrap();
        assert_eq!(trainer.generations().len(), 1);
        assert!(trainer.species().is_empty());
        assert_eq!(trainer.evaluated_generation_number(), None);
        assert_eq!(trainer.registry().latest_innovation(), 1);
        for genome in trainer.current_generation() {
            assert_eq!(genome.genes().len(), 2);
            assert_eq!(genome.fitness(), None);
            assert_eq!(genome.species(), None);
        }
    }

    #[test]
    fn speciation_partitions_every_generation() {
        let mut trainer = Trainer::seeded(config(30), 2).unwrap();
        for _ in 0..10 {
            trainer.advance_generation(|g| g.evaluate(&[0.3, -0.7])[0].abs().min(100.0));
        }
        for generation in 0..10 {
            let mut seen = vec![0; 30];
            for species in trainer.species() {
                for id in species.members(generation) {
                    assert_eq!(id.generation, generation);
                    seen[id.index] += 1;
                    assert_eq!(
                        trainer.genome(*id).unwrap().species(),
                        Some(species.id())
                    );
                }
            }
            assert!(seen.iter().all(|&count| count == 1));
        }
    }

    #[test]
    fn representatives_come_from_members() {
        let mut trainer = Trainer::seeded(config(20), 3).unwrap();
        for _ in 0..6 {
            trainer.advance_generation(|g| g.genes().len() as f64);
        }
        for species in trainer.species() {
            for generation in species.first_generation() + 1..=6 {
                let previous = species.members(generation - 1);
                match species.representative(generation) {
                    Some(representative) => assert!(previous.contains(&representative)),
                    None => assert!(previous.is_empty()),
                }
            }
        }
    }

    #[test]
    fn population_size_is_constant() {
        let mut trainer = Trainer::seeded(
            TrainerConfig {
                interspecies_mating_rate: 0.5,
                ..config(25)
            },
            4,
        )
        .unwrap();
        for _ in 0..8 {
            trainer.advance_generation(|g| g.hidden_nodes().len() as f64);
            assert_eq!(trainer.current_generation().len(), 25);
        }
    }

    #[test]
    fn already_evaluated_genomes_are_kept() {
        let mut trainer = Trainer::seeded(config(5), 5).unwrap();
        trainer.current_generation_mut()[0].set_fitness(9.0);
        let mut calls = 0;
        trainer.advance_generation(|_| {
            calls += 1;
            1.0
        });
        assert_eq!(calls, 4);
        assert_eq!(trainer.generation(0).unwrap()[0].fitness(), Some(9.0));
    }

    #[test]
    fn nan_fitness_becomes_zero() {
        let mut trainer = Trainer::seeded(config(5), 6).unwrap();
        trainer.advance_generation(|_| f64::NAN);
        assert!(trainer
            .generation(0)
            .unwrap()
            .iter()
            .all(|g| g.fitness() == Some(0.0)));
        assert_eq!(trainer.current_generation().len(), 5);
    }

    #[test]
    fn parallel_evaluation_matches_sequential() {
        let evaluator = |g: &Genome| {
            let output = g.evaluate(&[1.0, 0.5])[0];
            if output.is_finite() {
                output.abs()
            } else {
                0.0
            }
        };
        let mut sequential = Trainer::seeded(config(40), 7).unwrap();
        let mut parallel = Trainer::seeded(config(40), 7).unwrap();
        for _ in 0..5 {
            sequential.advance_generation(evaluator);
            parallel.advance_generation_par(evaluator);
        }
        for (a, b) in sequential.generations().iter().zip(parallel.generations()) {
            for (x, y) in a.iter().zip(b) {
                assert_eq!(x.genes(), y.genes());
                assert_eq!(x.fitness(), y.fitness());
            }
        }
    }

    #[test]
    fn champion_is_fittest_of_latest_evaluated_generation() {
        let mut trainer = Trainer::seeded(config(10), 8).unwrap();
        trainer.advance_generation(|g| g.genes()[0].weight());
        let best = trainer
            .generation(0)
            .unwrap()
            .iter()
            .map(|g| g.genes()[0].weight())
            .fold(f64::MIN, f64::max);
        assert_eq!(trainer.champion().unwrap().fitness(), Some(best));
    }
}

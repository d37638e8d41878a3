use super::selection::select_random_weights;
use super::{Species, SpeciesId, TrainerConfig, TrainerContext};
use crate::genomics::Genome;

use rand::Rng;

/// Auxiliary type for offspring generation.
/// Handles all the tasks of breeding and mutating a
/// generation's offspring according to the configuration
/// and allotted offspring.
pub(super) struct OffspringFactory<'a, R> {
    genomes: &'a [Genome],
    species: &'a [Species],
    generation: usize,
    config: &'a TrainerConfig,
    context: &'a mut TrainerContext<R>,
}

impl<'a, R: Rng> OffspringFactory<'a, R> {
    /// `genomes` must be generation number `generation`,
    /// already evaluated and speciated.
    pub(super) fn new(
        genomes: &'a [Genome],
        species: &'a [Species],
        generation: usize,
        config: &'a TrainerConfig,
        context: &'a mut TrainerContext<R>,
    ) -> OffspringFactory<'a, R> {
        OffspringFactory {
            genomes,
            species,
            generation,
            config,
            context,
        }
    }

    /// Breeds `interspecies` offspring across species and
    /// `allotted_offspring[i]` offspring within species `i`,
    /// then mutates all of them.
    pub(super) fn generate_offspring(
        &mut self,
        interspecies: usize,
        mut allotted_offspring: Vec<usize>,
    ) -> Vec<Genome> {
        let mut offspring =
            Vec::with_capacity(interspecies + allotted_offspring.iter().sum::<usize>());
        self.add_interspecies_offspring(interspecies, &mut allotted_offspring, &mut offspring);
        self.add_intraspecies_offspring(&allotted_offspring, &mut offspring);

        self.context.split().0.begin_generation();
        for child in &mut offspring {
            self.mutate(child);
        }
        offspring
    }

    /// Mates parents chosen by fitness from the whole generation
    /// with partners from other species. When no other species
    /// has members, the slot goes back to the first parent's
    /// species quota instead.
    fn add_interspecies_offspring(
        &mut self,
        count: usize,
        allotted_offspring: &mut [usize],
        offspring: &mut Vec<Genome>,
    ) {
        let genomes = self.genomes;
        let fitnesses: Vec<f64> = genomes.iter().map(fitness_weight).collect();

        for first in select_random_weights(&fitnesses, count, self.context.rng()) {
            let first_species = species_of(&genomes[first]);
            let partners: Vec<usize> = (0..genomes.len())
                .filter(|&i| species_of(&genomes[i]) != first_species)
                .collect();
            match self.choose_by_fitness(&partners) {
                Some(second) => offspring.push(self.mate(first, second)),
                None => allotted_offspring[first_species.0] += 1,
            }
        }
    }

    /// Mates members of each species with each other,
    /// both parents chosen by fitness.
    fn add_intraspecies_offspring(
        &mut self,
        allotted_offspring: &[usize],
        offspring: &mut Vec<Genome>,
    ) {
        // Copy the slice reference out of `self`, so the
        // borrow checker lets us use the rng while iterating.
        let all_species = self.species;
        for (species, &count) in all_species.iter().zip(allotted_offspring) {
            if count == 0 {
                continue;
            }
            let members: Vec<usize> = species
                .members(self.generation)
                .iter()
                .map(|id| id.index)
                .collect();
            assert!(
                !members.is_empty(),
                "species {} allotted offspring without members",
                species.id()
            );

            let fitnesses: Vec<f64> = members
                .iter()
                .map(|&m| fitness_weight(&self.genomes[m]))
                .collect();
            for first in select_random_weights(&fitnesses, count, self.context.rng()) {
                let first = members[first];
                let partners: Vec<usize> = if members.len() == 1 {
                    members.clone()
                } else {
                    members.iter().copied().filter(|&m| m != first).collect()
                };
                if let Some(second) = self.choose_by_fitness(&partners) {
                    offspring.push(self.mate(first, second));
                }
            }
        }
    }

    /// Picks one of `candidates` (indices into the generation)
    /// with probability proportional to fitness.
    fn choose_by_fitness(&mut self, candidates: &[usize]) -> Option<usize> {
        let fitnesses: Vec<f64> = candidates
            .iter()
            .map(|&c| fitness_weight(&self.genomes[c]))
            .collect();
        select_random_weights(&fitnesses, 1, self.context.rng())
            .first()
            .map(|&i| candidates[i])
    }

    fn mate(&mut self, first: usize, second: usize) -> Genome {
        self.genomes[first].crossover(
            &self.genomes[second],
            self.config.connection_disable_rate,
            self.context.rng(),
        )
    }

    /// Applies a weight mutation, then possibly a node
    /// split, then possibly a new connection.
    fn mutate(&mut self, child: &mut Genome) {
        let config = self.config;
        let (registry, rng) = self.context.split();

        child.mutate_weights(
            config.connection_mutation_rate,
            config.connection_perturbation_rate,
            rng,
        );
        if rng.gen::<f64>() < config.connection_segmentation_rate {
            child.mutate_split_connection(registry, rng);
        }
        if rng.gen::<f64>() < config.connection_generation_rate {
            child.mutate_add_connection(registry, rng);
        }
    }
}

fn fitness_weight(genome: &Genome) -> f64 {
    genome.fitness().unwrap_or(0.0)
}

fn species_of(genome: &Genome) -> SpeciesId {
    genome
        .species()
        .unwrap_or_else(|| panic!("breeding from unspeciated genome {}", genome))
}

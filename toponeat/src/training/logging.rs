use super::{SpeciesId, Trainer};
use crate::genomics::Genome;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones the entire generation.
    AllGenomes,
    /// Clones each species' representative.
    SpeciesRepresentatives,
    /// Clones only the generation's champion.
    Champion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of an evaluated generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    /// Species with members in the generation.
    pub species_count: usize,
    /// Species founded up to and including the generation.
    pub historical_species_count: usize,
    pub fitness: Stats,
    pub gene_count: Stats,
    pub enabled_gene_count: Stats,
    pub hidden_node_count: Stats,
    /// Highest innovation number carried by the generation,
    /// which is the registry's counter as of its breeding.
    pub latest_innovation: Innovation,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tspecies_count: {:?}\n\
            \thistorical_species_count: {:?}\n\
            \tfitness: {}\n\
            \tgene_count: {}\n\
            \tenabled_gene_count: {}\n\
            \thidden_node_count: {}\n\
            \tlatest_innovation: {:?}\n\
            }}",
            &self.generation_number,
            &self.species_count,
            &self.historical_species_count,
            &self.fitness,
            &self.gene_count,
            &self.enabled_gene_count,
            &self.hidden_node_count,
            &self.latest_innovation
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// All statistics of an empty sequence are `0`.
    ///
    /// # Examples
    /// ```
    /// use toponeat::training::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
    /// assert_eq!(stats.median, 2.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: 0.0,
                minimum: 0.0,
                mean: 0.0,
                median: 0.0,
            };
        }
        data.sort_unstable_by(f64::total_cmp);

        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f64>() / data.len() as f64,
            median,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max {} / min {} / mean {} / median {}",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

/// A reporting-level dependant store
/// of genomes from a generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GenerationMemberRecord {
    /// Species IDs and their members.
    Species(Vec<(SpeciesId, Vec<Genome>)>),
    /// Species IDs and the representative their
    /// members were compared against.
    SpeciesRepresentatives(Vec<(SpeciesId, Genome)>),
    /// Only the generation's champion.
    Champion(Genome),
    /// Empty.
    None,
}

/// A log of the evolution of a training run over time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropriate reporting level.
    ///
    /// # Examples
    /// ```
    /// use toponeat::training::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Stores a snapshot of the latest evaluated generation
    /// of a training run. Does nothing if no generation has
    /// been evaluated yet.
    ///
    /// # Examples
    /// ```
    /// use toponeat::{Trainer, TrainerConfig};
    /// use toponeat::training::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::Champion);
    /// let mut trainer = Trainer::seeded(TrainerConfig::zero(), 0).unwrap();
    ///
    /// trainer.advance_generation(|_| 1.0);
    /// logger.log(&trainer);
    ///
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.generation_number, 0);
    /// assert_eq!(log.fitness.maximum, 1.0);
    /// ```
    pub fn log<R>(&mut self, trainer: &Trainer<R>) {
        let generation = match trainer.evaluated_generation_number() {
            Some(generation) => generation,
            None => return,
        };
        let genomes = match trainer.generation(generation) {
            Some(genomes) => genomes,
            None => return,
        };
        let live_species: Vec<_> = trainer
            .species()
            .iter()
            .filter(|s| !s.members(generation).is_empty())
            .collect();

        let generation_sample = match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                live_species
                    .iter()
                    .map(|s| {
                        let members = s
                            .members(generation)
                            .iter()
                            .filter_map(|id| trainer.genome(*id))
                            .cloned()
                            .collect();
                        (s.id(), members)
                    })
                    .collect(),
            ),
            ReportingLevel::SpeciesRepresentatives => {
                GenerationMemberRecord::SpeciesRepresentatives(
                    live_species
                        .iter()
                        .filter_map(|s| {
                            let representative = trainer.genome(s.representative(generation)?)?;
                            Some((s.id(), representative.clone()))
                        })
                        .collect(),
                )
            }
            ReportingLevel::Champion => match trainer.champion() {
                Some(champion) => GenerationMemberRecord::Champion(champion.clone()),
                None => GenerationMemberRecord::None,
            },
            ReportingLevel::NoGenomes => GenerationMemberRecord::None,
        };

        self.logs.push(Log {
            generation_number: generation,
            generation_sample,
            species_count: live_species.len(),
            historical_species_count: trainer
                .species()
                .iter()
                .filter(|s| s.first_generation() <= generation)
                .count(),
            fitness: Stats::from(genomes.iter().map(|g| g.fitness().unwrap_or(0.0))),
            gene_count: Stats::from(genomes.iter().map(|g| g.genes().len() as f64)),
            enabled_gene_count: Stats::from(
                genomes
                    .iter()
                    .map(|g| g.genes().iter().filter(|gene| gene.enabled()).count() as f64),
            ),
            hidden_node_count: Stats::from(genomes.iter().map(|g| g.hidden_nodes().len() as f64)),
            latest_innovation: genomes
                .iter()
                .flat_map(|g| g.genes().last())
                .map(|gene| gene.innovation())
                .max()
                .unwrap_or_else(|| trainer.registry().latest_innovation()),
        })
    }

    /// Iterate over all logged snapshots.
    ///
    /// # Examples
    /// ```
    /// use toponeat::training::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrainerConfig;
    use std::num::NonZeroUsize;

    fn trainer() -> Trainer {
        let config = TrainerConfig {
            population_size: NonZeroUsize::new(12).unwrap(),
            input_count: NonZeroUsize::new(2).unwrap(),
            excess_connection_modifier: 1.0,
            disjoint_connection_modifier: 1.0,
            average_weight_difference_modifier: 1.0,
            compatibility_threshold: 0.5,
            connection_segmentation_rate: 0.5,
            connection_mutation_rate: 0.5,
            ..TrainerConfig::zero()
        };
        Trainer::seeded(config, 11).unwrap()
    }

    #[test]
    fn stats_of_constant_data() {
        let stats = Stats::from(std::iter::repeat(3.0).take(5));
        assert_eq!(
            stats,
            Stats {
                maximum: 3.0,
                minimum: 3.0,
                mean: 3.0,
                median: 3.0
            }
        );
    }

    #[test]
    fn stats_of_empty_data() {
        let stats = Stats::from(std::iter::empty());
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.median, 0.0);
    }

    #[test]
    fn nothing_logged_before_evaluation() {
        let mut logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
        logger.log(&trainer());
        assert_eq!(logger.iter().count(), 0);
    }

    #[test]
    fn all_genomes_partitioned_by_species() {
        let mut trainer = trainer();
        let mut logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
        for _ in 0..4 {
            trainer.advance_generation(|g| g.genes().len() as f64);
            logger.log(&trainer);
        }

        assert_eq!(logger.iter().count(), 4);
        for (number, log) in logger.iter().enumerate() {
            assert_eq!(log.generation_number, number);
            match &log.generation_sample {
                GenerationMemberRecord::Species(species) => {
                    assert_eq!(species.len(), log.species_count);
                    let total: usize = species.iter().map(|(_, members)| members.len()).sum();
                    assert_eq!(total, 12);
                }
                other => panic!("unexpected record {:?}", other),
            }
            assert!(log.historical_species_count >= log.species_count);
            assert!(log.enabled_gene_count.maximum <= log.gene_count.maximum);
        }
    }

    #[test]
    fn representatives_and_champion() {
        let mut trainer = trainer();
        let mut representatives = EvolutionLogger::new(ReportingLevel::SpeciesRepresentatives);
        let mut champion = EvolutionLogger::new(ReportingLevel::Champion);
        let mut silent = EvolutionLogger::new(ReportingLevel::NoGenomes);
        for _ in 0..3 {
            trainer.advance_generation(|g| g.genes().iter().map(|gene| gene.weight()).sum());
            representatives.log(&trainer);
            champion.log(&trainer);
            silent.log(&trainer);
        }

        for log in representatives.iter() {
            match &log.generation_sample {
                GenerationMemberRecord::SpeciesRepresentatives(r) => {
                    assert_eq!(r.len(), log.species_count)
                }
                other => panic!("unexpected record {:?}", other),
            }
        }
        for log in champion.iter() {
            match &log.generation_sample {
                GenerationMemberRecord::Champion(genome) => {
                    assert_eq!(genome.fitness(), Some(log.fitness.maximum))
                }
                other => panic!("unexpected record {:?}", other),
            }
        }
        assert!(silent
            .iter()
            .all(|log| matches!(log.generation_sample, GenerationMemberRecord::None)));
    }

    #[test]
    fn display() {
        let mut trainer = trainer();
        trainer.advance_generation(|_| 2.0);
        let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
        logger.log(&trainer);
        let text = logger.iter().next().unwrap().to_string();
        assert!(text.starts_with("Log {"));
        assert!(text.contains("generation_number: 0"));
        assert!(text.contains("fitness: max 2 / min 2 / mean 2 / median 2"));
    }

    #[test]
    fn innovation_reported_as_of_logged_generation() {
        let mut trainer = Trainer::seeded(
            TrainerConfig {
                population_size: NonZeroUsize::new(10).unwrap(),
                input_count: NonZeroUsize::new(2).unwrap(),
                connection_segmentation_rate: 1.0,
                ..TrainerConfig::zero()
            },
            12,
        )
        .unwrap();
        let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);

        trainer.advance_generation(|_| 1.0);
        logger.log(&trainer);
        // Generation 1 has been bred with new structure,
        // but generation 0 only carries the initial genes.
        assert!(trainer.registry().latest_innovation() > 1);
        assert_eq!(logger.iter().last().unwrap().latest_innovation, 1);

        let before_breeding = trainer.registry().latest_innovation();
        trainer.advance_generation(|_| 1.0);
        logger.log(&trainer);
        assert_eq!(logger.iter().last().unwrap().latest_innovation, before_breeding);
    }
}

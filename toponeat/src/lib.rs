//! An implementation of NeuroEvolution of Augmenting Topologies for
//! feed-forward networks, following the 2002 paper:
//! <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Genomes are lists of connection genes tagged with innovation numbers.
//! A [`Trainer`] evaluates each generation with a user-supplied fitness
//! function, groups genomes into species by compatibility distance,
//! allots offspring to species in proportion to their mean fitness, and
//! breeds and mutates the next generation. Structural mutations never
//! introduce a cycle: every genome can be evaluated in a single pass.
//!
//! Innovation numbers are counted over the whole run, but identical
//! structural mutations are only recognized as such within a single
//! generation.
//!
//! All randomness comes from the trainer's generator, so runs started
//! with [`Trainer::seeded`] are reproducible. Generational logging is
//! available in [`training::logging`].
//!
//! # Example usage: Evolution of an XOR approximator
//! ```
//! use std::num::NonZeroUsize;
//! use toponeat::genomics::Genome;
//! use toponeat::training::logging::{EvolutionLogger, ReportingLevel};
//! use toponeat::{Trainer, TrainerConfig};
//!
//! fn evaluate_xor(genome: &Genome) -> f64 {
//!     let cases = [
//!         ([1.0, 0.0, 0.0], 0.0),
//!         ([1.0, 0.0, 1.0], 1.0),
//!         ([1.0, 1.0, 0.0], 1.0),
//!         ([1.0, 1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut error = 0.0;
//!     for (inputs, expected) in cases.iter() {
//!         let output = genome.evaluate(inputs)[0];
//!         error += if output.is_finite() {
//!             (output - expected).abs().min(1.0)
//!         } else {
//!             1.0
//!         };
//!     }
//!
//!     (4.0 - error).powi(2)
//! }
//!
//! fn main() {
//!     let config = TrainerConfig {
//!         population_size: NonZeroUsize::new(60).unwrap(),
//!         input_count: NonZeroUsize::new(3).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         excess_connection_modifier: 1.0,
//!         disjoint_connection_modifier: 1.0,
//!         average_weight_difference_modifier: 0.4,
//!         compatibility_threshold: 1.0,
//!         interspecies_mating_rate: 0.001,
//!         connection_disable_rate: 0.75,
//!         connection_mutation_rate: 0.8,
//!         connection_perturbation_rate: 0.9,
//!         connection_segmentation_rate: 0.03,
//!         connection_generation_rate: 0.05,
//!     };
//!
//!     let mut trainer = Trainer::seeded(config, 2002).unwrap();
//!     let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
//!     for _ in 0..20 {
//!         trainer.advance_generation(evaluate_xor);
//!         logger.log(&trainer);
//!     }
//!
//!     let champion = trainer.champion().unwrap();
//!     println!("Best genome: {}", champion);
//!     println!("{}", logger.iter().last().unwrap());
//! }
//! ```
pub mod genomics;
pub mod training;

/// Identifier of a node within a genome.
pub type NodeId = usize;
/// Historical marker of a structural mutation.
pub type Innovation = u64;

pub use genomics::{transfer, ConnectionGene, Genome, GenomeError, InnovationRegistry};
pub use training::{
    select_random_weights, ConfigError, GenomeId, Species, SpeciesId, Trainer, TrainerConfig,
    TrainerContext,
};

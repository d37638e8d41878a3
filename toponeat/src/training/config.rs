use super::ConfigError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for training runs.
///
/// # Note
/// All quantities expressing probabilities must be
/// in the range [0.0, 1.0], and all modifiers and the
/// compatibility threshold must be finite and non-negative.
/// [`validate`](TrainerConfig::validate) checks this, and
/// training refuses to start on an invalid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Number of genomes in every generation.
    pub population_size: NonZeroUsize,
    /// Number of input nodes of every genome.
    pub input_count: NonZeroUsize,
    /// Number of output nodes of every genome.
    pub output_count: NonZeroUsize,
    /// Weight of excess genes in the compatibility distance.
    pub excess_connection_modifier: f64,
    /// Weight of disjoint genes in the compatibility distance.
    pub disjoint_connection_modifier: f64,
    /// Weight of the mean weight difference of matching
    /// genes in the compatibility distance.
    pub average_weight_difference_modifier: f64,
    /// Maximum compatibility distance between a genome
    /// and a species representative for the genome to
    /// join that species.
    pub compatibility_threshold: f64,
    /// Chance, per offspring slot, that the slot is filled
    /// by mating genomes from different species.
    pub interspecies_mating_rate: f64,
    /// Chance that a gene disabled in either parent is
    /// inherited disabled.
    pub connection_disable_rate: f64,
    /// Chance that each gene of an offspring has its
    /// weight mutated.
    pub connection_mutation_rate: f64,
    /// Chance that a weight mutation is a perturbation
    /// rather than a fresh random weight.
    pub connection_perturbation_rate: f64,
    /// Chance that an offspring has one of its
    /// connections split by a new node.
    pub connection_segmentation_rate: f64,
    /// Chance that an offspring gains a new connection.
    pub connection_generation_rate: f64,
}

impl TrainerConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use toponeat::TrainerConfig;
    ///
    /// let cfg1 = TrainerConfig::zero();
    ///
    /// let cfg2 = TrainerConfig {
    ///     // Specify some values here...
    ///     connection_segmentation_rate: 0.03,
    ///     // Default the rest...
    ///     ..TrainerConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> TrainerConfig {
        TrainerConfig {
            population_size: NonZeroUsize::MIN,
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            excess_connection_modifier: 0.0,
            disjoint_connection_modifier: 0.0,
            average_weight_difference_modifier: 0.0,
            compatibility_threshold: 0.0,
            interspecies_mating_rate: 0.0,
            connection_disable_rate: 0.0,
            connection_mutation_rate: 0.0,
            connection_perturbation_rate: 0.0,
            connection_segmentation_rate: 0.0,
            connection_generation_rate: 0.0,
        }
    }

    /// Checks that every probability lies in [0.0, 1.0] and
    /// that the distance modifiers and threshold are finite and
    /// non-negative.
    ///
    /// # Errors
    /// Returns an error naming the first offending field.
    ///
    /// # Examples
    /// ```
    /// use toponeat::TrainerConfig;
    ///
    /// assert!(TrainerConfig::zero().validate().is_ok());
    ///
    /// let config = TrainerConfig {
    ///     interspecies_mating_rate: 1.5,
    ///     ..TrainerConfig::zero()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let modifiers = [
            ("excess_connection_modifier", self.excess_connection_modifier),
            ("disjoint_connection_modifier", self.disjoint_connection_modifier),
            (
                "average_weight_difference_modifier",
                self.average_weight_difference_modifier,
            ),
            ("compatibility_threshold", self.compatibility_threshold),
        ];
        for (field, value) in modifiers {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidModifier { field, value });
            }
        }

        let probabilities = [
            ("interspecies_mating_rate", self.interspecies_mating_rate),
            ("connection_disable_rate", self.connection_disable_rate),
            ("connection_mutation_rate", self.connection_mutation_rate),
            ("connection_perturbation_rate", self.connection_perturbation_rate),
            ("connection_segmentation_rate", self.connection_segmentation_rate),
            ("connection_generation_rate", self.connection_generation_rate),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { field, value });
            }
        }

        Ok(())
    }
}

use crate::{Innovation, NodeId};

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of times a perturbed weight is pulled
/// halfway back towards its previous value.
const PERTURBATION_HALVINGS: usize = 3;

/// Connection genes are the principal components of genomes.
/// Each one is a directed, weighted edge between two nodes,
/// tagged with the innovation number of the structural
/// mutation that first created it.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    input: NodeId,
    output: NodeId,
    weight: f64,
    enabled: bool,
    innovation: Innovation,
}

impl ConnectionGene {
    /// Returns a new gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(0, 3, 0.5, true, 7);
    /// ```
    pub fn new(
        input: NodeId,
        output: NodeId,
        weight: f64,
        enabled: bool,
        innovation: Innovation,
    ) -> ConnectionGene {
        ConnectionGene {
            input,
            output,
            weight,
            enabled,
            innovation,
        }
    }

    /// Returns a new enabled gene with a random weight
    /// in the range `[-1.0, 1.0)`.
    pub fn with_random_weight<R: Rng + ?Sized>(
        input: NodeId,
        output: NodeId,
        innovation: Innovation,
        rng: &mut R,
    ) -> ConnectionGene {
        ConnectionGene::new(input, output, random_weight(rng), true, innovation)
    }

    /// Sets the gene's weight to a random value
    /// in the range `[-1.0, 1.0)`.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::genomics::ConnectionGene;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(5);
    /// let mut gene = ConnectionGene::new(0, 1, 4.0, true, 0);
    ///
    /// gene.randomize_weight(&mut rng);
    /// assert!((-1.0..1.0).contains(&gene.weight()));
    /// ```
    pub fn randomize_weight<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.weight = random_weight(rng);
    }

    /// Perturbs the gene's weight. A fresh random weight
    /// is drawn, then moved halfway back towards the
    /// previous weight three times, so the result lands
    /// within `1/8` of the random range around the
    /// original value.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::genomics::ConnectionGene;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(5);
    /// let mut gene = ConnectionGene::new(0, 1, 0.5, true, 0);
    ///
    /// gene.perturb_weight(&mut rng);
    /// assert!((gene.weight() - 0.5).abs() <= 1.5 / 8.0);
    /// ```
    pub fn perturb_weight<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let original = self.weight;
        self.randomize_weight(rng);
        for _ in 0..PERTURBATION_HALVINGS {
            self.weight += (original - self.weight) / 2.0;
        }
    }

    /// Returns the node the gene takes its value from.
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// Returns the node the gene feeds into.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Returns the gene's `(input, output)` endpoints.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.input, self.output)
    }

    /// Returns the gene's weight.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(0, 3, 0.5, true, 7);
    ///
    /// assert_eq!(gene.weight(), 0.5);
    /// ```
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the gene's weight.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Returns whether the gene is expressed
    /// in the genome's network.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enabling or disabling a gene changes the shape
    /// of the genome's graph, so only the owning genome
    /// may do it.
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the gene's innovation number.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(0, 3, 0.5, true, 7);
    ///
    /// assert_eq!(gene.innovation(), 7);
    /// ```
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }
}

/// Uniform over `[-1.0, 1.0)`.
pub(crate) fn random_weight<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(-1.0..1.0)
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}, {}, {}, {}>",
            self.input, self.output, self.weight, self.enabled, self.innovation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn random_weights_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut gene = ConnectionGene::new(0, 1, 0.0, true, 0);
        for _ in 0..1000 {
            gene.randomize_weight(&mut rng);
            assert!(gene.weight() >= -1.0 && gene.weight() < 1.0);
        }
    }

    #[test]
    fn perturbation_stays_close() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for original in [-1.0, -0.3, 0.0, 0.8] {
            for _ in 0..200 {
                let mut gene = ConnectionGene::new(0, 1, original, true, 0);
                gene.perturb_weight(&mut rng);
                // Random point r moves to original + (r - original) / 8.
                assert!((gene.weight() - original).abs() <= 2.0 / 8.0 + 1e-12);
            }
        }
    }

    #[test]
    fn display() {
        let gene = ConnectionGene::new(2, 5, 1.0, false, 9);
        assert_eq!(gene.to_string(), "<2, 5, 1, false, 9>");
    }
}

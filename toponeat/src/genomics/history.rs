use crate::{Innovation, NodeId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// An `InnovationRegistry` hands out innovation numbers
/// for structural mutations, so that identical mutations
/// arising independently in different genomes during the
/// same generation are tagged identically.
///
/// Mutations are identified by the `(input node, output node)`
/// pair of the gene they create. The innovation counter runs for
/// the whole training run, but the table of known mutations only
/// lives for one generation: the same pair mutated again in a
/// later generation receives a fresh number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationRegistry {
    latest_innovation: Innovation,
    generation_innovations: HashMap<(NodeId, NodeId), Innovation, RandomState>,
}

impl InnovationRegistry {
    /// Creates a registry for genomes with the given
    /// node counts.
    ///
    /// Initial genes take the innovation numbers
    /// `0..input_count × output_count`, so the first
    /// number handed out by the registry is
    /// `input_count × output_count`.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new(3, 2);
    ///
    /// assert_eq!(registry.latest_innovation(), 5);
    /// assert_eq!(registry.get_or_assign(0, 5), 6);
    /// ```
    pub fn new(input_count: usize, output_count: usize) -> InnovationRegistry {
        let initial_genes = (input_count * output_count) as Innovation;
        InnovationRegistry {
            // Counts of at least 1 are enforced by genome and
            // trainer construction; saturate rather than wrap otherwise.
            latest_innovation: initial_genes.saturating_sub(1),
            generation_innovations: HashMap::default(),
        }
    }

    /// Returns the innovation number assigned to the
    /// `input -> output` mutation during the current
    /// generation, assigning the next number if the
    /// mutation is new.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new(2, 1);
    ///
    /// let first = registry.get_or_assign(0, 3);
    /// let second = registry.get_or_assign(3, 2);
    ///
    /// // Repeating a mutation within the generation reuses its number.
    /// assert_eq!(registry.get_or_assign(0, 3), first);
    /// assert_eq!((first, second), (2, 3));
    /// ```
    pub fn get_or_assign(&mut self, input: NodeId, output: NodeId) -> Innovation {
        match self.generation_innovations.entry((input, output)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                self.latest_innovation += 1;
                *entry.insert(self.latest_innovation)
            }
        }
    }

    /// Forgets the mutations of the previous generation.
    /// The innovation counter is kept.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new(2, 1);
    /// let before = registry.get_or_assign(0, 3);
    ///
    /// registry.begin_generation();
    ///
    /// assert_ne!(registry.get_or_assign(0, 3), before);
    /// ```
    pub fn begin_generation(&mut self) {
        self.generation_innovations.clear();
    }

    /// Returns the highest innovation number assigned so far.
    pub fn latest_innovation(&self) -> Innovation {
        self.latest_innovation
    }

    /// Returns an iterator over the current generation's
    /// mutations, as `((input node, output node), innovation)`.
    /// No ordering is guaranteed.
    pub fn generation_innovations(
        &self,
    ) -> impl Iterator<Item = (&(NodeId, NodeId), &Innovation)> {
        self.generation_innovations.iter()
    }
}

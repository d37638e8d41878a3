use crate::genomics::Genome;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Species identifier. Species are numbered
/// in order of appearance, starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub usize);

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a genome of a training run: its generation,
/// and its position within that generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenomeId {
    pub generation: usize,
    pub index: usize,
}

/// Species are collections of reproductively compatible
/// genomes. Membership is determined by the compatibility
/// distance to a _representative_, a random member of the
/// species in the previous generation (or, for a species
/// founded this generation, its founder).
///
/// Species keep a record of their members and representative
/// for every generation since their foundation, and are never
/// removed: a species with no members simply stays empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesId,
    first_generation: usize,
    members: Vec<Vec<GenomeId>>,
    representatives: Vec<Option<GenomeId>>,
}

impl Species {
    /// Founds a species in the founder's generation,
    /// with the founder as its first member and the
    /// generation's representative.
    ///
    /// # Examples
    /// ```
    /// use toponeat::training::{GenomeId, Species, SpeciesId};
    ///
    /// let founder = GenomeId { generation: 3, index: 7 };
    /// let species = Species::new(SpeciesId(2), founder);
    ///
    /// assert_eq!(species.first_generation(), 3);
    /// assert_eq!(species.members(3), &[founder]);
    /// assert_eq!(species.representative(3), Some(founder));
    /// assert!(species.members(2).is_empty());
    /// ```
    pub fn new(id: SpeciesId, founder: GenomeId) -> Species {
        Species {
            id,
            first_generation: founder.generation,
            members: vec![vec![founder]],
            representatives: vec![Some(founder)],
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Returns the generation the species was founded in.
    pub fn first_generation(&self) -> usize {
        self.first_generation
    }

    /// Returns the species' members in the given generation,
    /// in order of arrival. Empty for generations outside
    /// the species' lifetime.
    pub fn members(&self, generation: usize) -> &[GenomeId] {
        generation
            .checked_sub(self.first_generation)
            .and_then(|offset| self.members.get(offset))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the species' members in the
    /// latest generation it has a record for.
    pub fn current_members(&self) -> &[GenomeId] {
        self.members.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the genome new members of the given generation
    /// are compared against, if the species has one.
    pub fn representative(&self, generation: usize) -> Option<GenomeId> {
        generation
            .checked_sub(self.first_generation)
            .and_then(|offset| self.representatives.get(offset))
            .copied()
            .flatten()
    }

    /// Returns the mean fitness of the species' members
    /// in `generation`, whose genomes are `genomes`.
    /// Unevaluated members count as having fitness `0`.
    /// Returns `None` if the species had no members.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::genomics::Genome;
    /// use toponeat::training::{GenomeId, Species, SpeciesId};
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut genomes: Vec<Genome> = (0..3)
    ///     .map(|_| Genome::new(1, 1, &mut rng).unwrap())
    ///     .collect();
    /// genomes[0].set_fitness(2.0);
    /// genomes[2].set_fitness(5.0);
    ///
    /// let species = Species::new(SpeciesId(0), GenomeId { generation: 0, index: 2 });
    ///
    /// assert_eq!(species.mean_fitness(0, &genomes), Some(5.0));
    /// assert_eq!(species.mean_fitness(1, &genomes), None);
    /// ```
    pub fn mean_fitness(&self, generation: usize, genomes: &[Genome]) -> Option<f64> {
        let members = self.members(generation);
        if members.is_empty() {
            return None;
        }
        let total: f64 = members
            .iter()
            .map(|id| genomes[id.index].fitness().unwrap_or(0.0))
            .sum();
        Some(total / members.len() as f64)
    }

    pub(super) fn add_member(&mut self, genome: GenomeId) {
        assert_eq!(
            genome.generation,
            self.first_generation + self.members.len() - 1,
            "genome {:?} added to species {} outside of its current generation",
            genome,
            self.id,
        );
        if let Some(current) = self.members.last_mut() {
            current.push(genome);
        }
    }

    /// Opens the record of the next generation, with
    /// `representative` to compare its genomes against.
    pub(super) fn advance(&mut self, representative: Option<GenomeId>) {
        self.members.push(vec![]);
        self.representatives.push(representative);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(generation: usize, index: usize) -> GenomeId {
        GenomeId { generation, index }
    }

    #[test]
    fn records_members_per_generation() {
        let mut species = Species::new(SpeciesId(0), id(1, 0));
        species.add_member(id(1, 4));
        species.advance(Some(id(1, 4)));
        species.add_member(id(2, 1));
        species.advance(None);

        assert_eq!(species.members(1), &[id(1, 0), id(1, 4)]);
        assert_eq!(species.members(2), &[id(2, 1)]);
        assert!(species.members(3).is_empty());
        assert!(species.current_members().is_empty());
        assert!(species.members(0).is_empty());
        assert!(species.members(9).is_empty());

        assert_eq!(species.representative(1), Some(id(1, 0)));
        assert_eq!(species.representative(2), Some(id(1, 4)));
        assert_eq!(species.representative(3), None);
        assert_eq!(species.representative(0), None);
    }

    #[test]
    #[should_panic]
    fn rejects_members_of_other_generations() {
        let mut species = Species::new(SpeciesId(0), id(1, 0));
        species.add_member(id(2, 0));
    }

    #[test]
    fn display() {
        assert_eq!(SpeciesId(12).to_string(), "12");
    }
}

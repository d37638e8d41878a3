use crate::genomics::InnovationRegistry;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// The mutable state shared by every step of a training run:
/// the run's innovation registry and its random number generator.
/// All randomness of a run is drawn from this generator, so a
/// run started from a seeded generator is reproducible.
#[derive(Debug, Clone)]
pub struct TrainerContext<R = ChaCha8Rng> {
    registry: InnovationRegistry,
    rng: R,
}

impl<R> TrainerContext<R> {
    /// Returns the run's innovation registry.
    pub fn registry(&self) -> &InnovationRegistry {
        &self.registry
    }
}

impl<R: Rng> TrainerContext<R> {
    /// Creates a context for genomes with the given
    /// node counts, drawing randomness from `rng`.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::training::TrainerContext;
    ///
    /// let context = TrainerContext::new(3, 1, ChaCha8Rng::seed_from_u64(1));
    /// assert_eq!(context.registry().latest_innovation(), 2);
    /// ```
    pub fn new(input_count: usize, output_count: usize, rng: R) -> TrainerContext<R> {
        TrainerContext {
            registry: InnovationRegistry::new(input_count, output_count),
            rng,
        }
    }

    /// Returns the run's random number generator.
    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Borrows the registry and generator at once.
    pub(crate) fn split(&mut self) -> (&mut InnovationRegistry, &mut R) {
        (&mut self.registry, &mut self.rng)
    }
}

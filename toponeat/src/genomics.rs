//! Genomes are the focus of evolution in NEAT.
//! They are an ordered collection of connection genes over a
//! fixed set of input and output nodes, plus any hidden nodes
//! introduced by mutation. Genomes are always feed-forward:
//! their enabled genes never form a cycle.
//!
//! Node ids follow a fixed partition: `[0, input_count)` are
//! input nodes, `[input_count, input_count + output_count)` are
//! output nodes, and every higher id is a hidden node.

mod errors;
mod genes;
mod history;
mod topology;

pub use errors::GenomeError;
pub use genes::ConnectionGene;
pub use history::InnovationRegistry;

use crate::training::SpeciesId;
use crate::{Innovation, NodeId};
use topology::{EnabledGraph, Topology};

use ahash::RandomState;
use rand::prelude::{Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Node transfer function: `1 / (1 - e^(-4.9x))`.
///
/// Note the minus sign in the denominator: this is not the
/// usual NEAT sigmoid `1 / (1 + e^(-4.9x))`. The function is
/// unbounded, diverging to `+∞` at `x = 0`.
///
/// # Examples
/// ```
/// use toponeat::genomics::transfer;
///
/// assert_eq!(transfer(0.0), f64::INFINITY);
/// assert!((transfer(1.0) - 1.0 / (1.0 - (-4.9f64).exp())).abs() < 1e-12);
/// ```
pub fn transfer(x: f64) -> f64 {
    1.0 / (1.0 - (-4.9 * x).exp())
}

/// An evolvable feed-forward network.
///
/// Supports Serde for saving and loading. Loaded genomes go
/// through the same checks as [`Genome::from_genes`], so a
/// malformed genome is rejected at deserialization.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "GenomeRecord")]
pub struct Genome {
    input_count: usize,
    output_count: usize,
    genes: Vec<ConnectionGene>,
    fitness: Option<f64>,
    species: Option<SpeciesId>,
    #[serde(skip)]
    topology: OnceLock<Topology>,
}

/// Unvalidated form of a [`Genome`], as read by Serde.
#[derive(Deserialize)]
struct GenomeRecord {
    input_count: usize,
    output_count: usize,
    genes: Vec<ConnectionGene>,
    fitness: Option<f64>,
    species: Option<SpeciesId>,
}

impl TryFrom<GenomeRecord> for Genome {
    type Error = GenomeError;

    fn try_from(record: GenomeRecord) -> Result<Genome, GenomeError> {
        let mut genome = Genome::from_genes(record.input_count, record.output_count, record.genes)?;
        genome.fitness = record.fitness;
        genome.species = record.species;
        Ok(genome)
    }
}

impl Genome {
    /// Creates a fully-connected genome: one enabled gene from
    /// every input to every output, with random weights in
    /// `[-1.0, 1.0)`.
    ///
    /// The gene from input `i` to the `o`-th output is given
    /// innovation number `i × output_count + o`, so all fresh
    /// genomes with the same node counts align perfectly.
    ///
    /// # Errors
    /// Returns an error if either count is zero.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::genomics::Genome;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let genome = Genome::new(3, 2, &mut rng).unwrap();
    ///
    /// assert_eq!(genome.genes().len(), 3 * 2);
    /// assert!(genome.genes().iter().all(|g| g.enabled()));
    /// assert_eq!(genome.genes()[4].endpoints(), (2, 3));
    /// assert_eq!(genome.genes()[4].innovation(), 4);
    ///
    /// assert!(Genome::new(0, 2, &mut rng).is_err());
    /// ```
    pub fn new<R: Rng + ?Sized>(
        input_count: usize,
        output_count: usize,
        rng: &mut R,
    ) -> Result<Genome, GenomeError> {
        check_node_counts(input_count, output_count)?;

        let mut genome = Genome::empty(input_count, output_count);
        for i in 0..input_count {
            for o in 0..output_count {
                genome.genes.push(ConnectionGene::with_random_weight(
                    i,
                    input_count + o,
                    (i * output_count + o) as Innovation,
                    rng,
                ));
            }
        }
        Ok(genome)
    }

    /// Builds a genome from an explicit list of genes,
    /// sorting them by innovation number.
    ///
    /// # Errors
    /// Returns an error describing the first gene that breaks
    /// the node partition, duplicates another gene's innovation
    /// or endpoints, or closes a cycle through enabled genes.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::{ConnectionGene, Genome};
    ///
    /// let genome = Genome::from_genes(1, 1, vec![
    ///     ConnectionGene::new(2, 1, 0.5, true, 2),
    ///     ConnectionGene::new(0, 1, 0.3, false, 0),
    ///     ConnectionGene::new(0, 2, 1.0, true, 1),
    /// ]).unwrap();
    ///
    /// assert_eq!(genome.hidden_nodes(), vec![2]);
    /// assert_eq!(genome.genes()[0].innovation(), 0);
    ///
    /// // Output nodes can't feed other nodes.
    /// assert!(Genome::from_genes(1, 1, vec![
    ///     ConnectionGene::new(1, 2, 0.5, true, 0),
    /// ]).is_err());
    /// ```
    pub fn from_genes(
        input_count: usize,
        output_count: usize,
        mut genes: Vec<ConnectionGene>,
    ) -> Result<Genome, GenomeError> {
        check_node_counts(input_count, output_count)?;
        genes.sort_by_key(|g| g.innovation());

        let mut genome = Genome::empty(input_count, output_count);
        let mut graph = EnabledGraph::default();
        let mut pairings: HashSet<(NodeId, NodeId), RandomState> = HashSet::default();
        for gene in genes {
            genome.check_gene_viability(&gene, &graph, &pairings)?;
            if gene.enabled() {
                graph.add_edge(gene.input(), gene.output());
            }
            pairings.insert(gene.endpoints());
            genome.genes.push(gene);
        }
        Ok(genome)
    }

    fn empty(input_count: usize, output_count: usize) -> Genome {
        Genome {
            input_count,
            output_count,
            genes: vec![],
            fitness: None,
            species: None,
            topology: OnceLock::new(),
        }
    }

    /// Checks a gene against the node partition and the genes
    /// already in the genome. Assumes genes arrive in
    /// increasing innovation order.
    fn check_gene_viability(
        &self,
        gene: &ConnectionGene,
        graph: &EnabledGraph,
        pairings: &HashSet<(NodeId, NodeId), RandomState>,
    ) -> Result<(), GenomeError> {
        use GenomeError::*;
        let innovation = gene.innovation();
        if self.is_input(gene.output()) {
            Err(InputEndpoint(innovation, gene.output()))
        } else if self.is_output(gene.input()) {
            Err(OutputEndpoint(innovation, gene.input()))
        } else if gene.input() == gene.output() {
            Err(SelfLoop(innovation, gene.input()))
        } else if self.genes.last().map(|g| g.innovation()) == Some(innovation) {
            Err(DuplicateInnovation(innovation))
        } else if pairings.contains(&gene.endpoints()) {
            Err(DuplicateEndpoints(innovation, gene.endpoints()))
        } else if gene.enabled() && graph.reaches(gene.output(), gene.input()) {
            Err(Cycle(innovation, gene.endpoints()))
        } else {
            Ok(())
        }
    }

    /// Returns the values of the output nodes for the given
    /// input values.
    ///
    /// `inputs` is truncated to the genome's input count, or
    /// padded with `0.0` if shorter. Input nodes pass their value
    /// through unchanged; every other node applies [`transfer`] to
    /// the weighted sum of its enabled incoming genes. Each node is
    /// computed once per call.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::{transfer, ConnectionGene, Genome};
    ///
    /// // Input 0 feeds output 2 through hidden node 3.
    /// let genome = Genome::from_genes(2, 1, vec![
    ///     ConnectionGene::new(0, 2, 0.7, false, 0),
    ///     ConnectionGene::new(1, 2, -0.5, true, 1),
    ///     ConnectionGene::new(0, 3, 1.0, true, 2),
    ///     ConnectionGene::new(3, 2, 0.7, true, 3),
    /// ]).unwrap();
    ///
    /// let hidden = transfer(1.0 * 0.25);
    /// let expected = transfer(-0.5 * 0.5 + 0.7 * hidden);
    /// assert_eq!(genome.evaluate(&[0.25, 0.5]), vec![expected]);
    /// ```
    pub fn evaluate(&self, inputs: &[f64]) -> Vec<f64> {
        let topology = self.topology();
        let mut values = vec![0.0; topology.slots()];
        for (value, input) in values.iter_mut().zip(inputs.iter().take(self.input_count)) {
            *value = *input;
        }

        for &node in topology.order() {
            let net_input: f64 = topology
                .incoming(node)
                .iter()
                .map(|&g| self.genes[g].weight() * values[self.genes[g].input()])
                .sum();
            values[node] = transfer(net_input);
        }

        values[self.input_count..self.input_count + self.output_count].to_vec()
    }

    /// Calculates the _compatibility distance_ between `self`
    /// and `other`, normalizing gene counts by the length of the
    /// larger genome. See
    /// [`compatibility_distance_normalized`](Genome::compatibility_distance_normalized).
    ///
    /// # Panics
    /// Panics if the genomes have different node counts.
    pub fn compatibility_distance(
        &self,
        other: &Genome,
        excess_modifier: f64,
        disjoint_modifier: f64,
        weight_difference_modifier: f64,
    ) -> f64 {
        let normalizer = self.genes.len().max(other.genes.len()) as f64;
        self.compatibility_distance_normalized(
            other,
            excess_modifier,
            disjoint_modifier,
            weight_difference_modifier,
            normalizer,
        )
    }

    /// Calculates the _compatibility distance_ between `self`
    /// and `other`:
    ///
    /// `excess_modifier × excess / normalizer
    ///   + disjoint_modifier × disjoint / normalizer
    ///   + weight_difference_modifier × mean weight difference`
    ///
    /// Genes are aligned by innovation number. Unmatched genes
    /// are _disjoint_ while both gene lists still have genes left,
    /// and _excess_ once either list is exhausted. The mean weight
    /// difference is taken over matching genes, and is `0` when
    /// there are none. A non-positive `normalizer` zeroes the
    /// gene count terms.
    ///
    /// # Panics
    /// Panics if the genomes have different node counts.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::{ConnectionGene, Genome};
    ///
    /// let first = Genome::from_genes(2, 1, vec![
    ///     ConnectionGene::new(0, 2, 1.0, true, 0),
    ///     ConnectionGene::new(1, 2, 0.5, true, 1),
    ///     ConnectionGene::new(0, 3, 1.0, true, 3),
    ///     ConnectionGene::new(3, 2, 1.0, true, 4),
    /// ]).unwrap();
    /// let second = Genome::from_genes(2, 1, vec![
    ///     ConnectionGene::new(0, 2, -1.0, true, 0),
    ///     ConnectionGene::new(1, 2, 0.5, true, 1),
    ///     ConnectionGene::new(1, 3, 1.0, true, 2),
    /// ]).unwrap();
    ///
    /// // Gene 2 is disjoint; genes 3 and 4 are excess.
    /// // Matching genes 0 and 1 differ by 2.0 and 0.0.
    /// assert_eq!(
    ///     first.compatibility_distance_normalized(&second, 1.0, 1.0, 0.4, 1.0),
    ///     2.0 + 1.0 + 0.4 * (2.0 + 0.0) / 2.0,
    /// );
    /// ```
    pub fn compatibility_distance_normalized(
        &self,
        other: &Genome,
        excess_modifier: f64,
        disjoint_modifier: f64,
        weight_difference_modifier: f64,
        normalizer: f64,
    ) -> f64 {
        self.assert_same_node_scheme(other, "compatibility distance");

        let (mut matching, mut disjoint, mut excess) = (0usize, 0usize, 0usize);
        let mut total_weight_difference = 0.0;
        for aligned in align(&self.genes, &other.genes) {
            match aligned {
                Aligned::Matching(first, second) => {
                    matching += 1;
                    total_weight_difference += (first.weight() - second.weight()).abs();
                }
                Aligned::Disjoint(..) => disjoint += 1,
                Aligned::Excess(..) => excess += 1,
            }
        }

        let count_term = |modifier: f64, count: usize| {
            if count == 0 || normalizer <= 0.0 {
                0.0
            } else {
                modifier * count as f64 / normalizer
            }
        };
        let mean_weight_difference = if matching == 0 {
            0.0
        } else {
            total_weight_difference / matching as f64
        };

        count_term(excess_modifier, excess)
            + count_term(disjoint_modifier, disjoint)
            + weight_difference_modifier * mean_weight_difference
    }

    /// Combines the genome with an `other` genome and returns
    /// their _child_ genome, which has no fitness or species.
    ///
    /// Genes are aligned by innovation number:
    /// - Matching genes are copied from either parent with equal
    ///   probability.
    /// - Disjoint and excess genes are copied only from the fitter
    ///   parent. On equal fitness, each one is copied with
    ///   probability `1/2`.
    /// - Copied genes disabled in either parent stay disabled with
    ///   probability `disable_rate`, and are re-enabled otherwise.
    ///
    /// A gene whose endpoints are already connected in the child
    /// is skipped, and a gene that would close a cycle through the
    /// child's enabled genes is copied disabled, so the child is
    /// always feed-forward. Unevaluated parents count as having
    /// fitness `0`.
    ///
    /// # Panics
    /// Panics if the genomes have different node counts.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::genomics::{ConnectionGene, Genome};
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(3);
    /// let mut fitter = Genome::from_genes(1, 1, vec![
    ///     ConnectionGene::new(0, 1, 0.5, false, 0),
    ///     ConnectionGene::new(0, 2, 1.0, true, 1),
    ///     ConnectionGene::new(2, 1, 0.5, true, 2),
    /// ]).unwrap();
    /// let mut weaker = Genome::from_genes(1, 1, vec![
    ///     ConnectionGene::new(0, 1, -0.5, true, 0),
    /// ]).unwrap();
    /// fitter.set_fitness(2.0);
    /// weaker.set_fitness(1.0);
    ///
    /// let child = weaker.crossover(&fitter, 1.0, &mut rng);
    ///
    /// let innovations: Vec<_> = child.genes().iter().map(|g| g.innovation()).collect();
    /// assert_eq!(innovations, vec![0, 1, 2]);
    /// // With a disable rate of 1, genes disabled in a parent stay disabled.
    /// assert!(!child.genes()[0].enabled());
    /// assert_eq!(child.fitness(), None);
    /// ```
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        other: &Genome,
        disable_rate: f64,
        rng: &mut R,
    ) -> Genome {
        self.assert_same_node_scheme(other, "crossover");

        let own_fitness = self.fitness.unwrap_or(0.0);
        let other_fitness = other.fitness.unwrap_or(0.0);
        let mut child = Genome::empty(self.input_count, self.output_count);
        let mut graph = EnabledGraph::default();
        let mut pairings: HashSet<(NodeId, NodeId), RandomState> = HashSet::default();

        for aligned in align(&self.genes, &other.genes) {
            let gene = match aligned {
                Aligned::Matching(own, others) => {
                    let mut gene = if rng.gen::<bool>() { own } else { others }.clone();
                    if !own.enabled() || !others.enabled() {
                        gene.set_enabled(rng.gen::<f64>() >= disable_rate);
                    }
                    gene
                }
                Aligned::Disjoint(parent, gene) | Aligned::Excess(parent, gene) => {
                    let (parent_fitness, mate_fitness) = match parent {
                        Parent::First => (own_fitness, other_fitness),
                        Parent::Second => (other_fitness, own_fitness),
                    };
                    let inherited = match parent_fitness.partial_cmp(&mate_fitness) {
                        Some(Ordering::Greater) => true,
                        Some(Ordering::Equal) => rng.gen::<bool>(),
                        _ => false,
                    };
                    if !inherited {
                        continue;
                    }
                    let mut gene = gene.clone();
                    if !gene.enabled() {
                        gene.set_enabled(rng.gen::<f64>() >= disable_rate);
                    }
                    gene
                }
            };
            child.inherit_gene(gene, &mut graph, &mut pairings);
        }

        child
    }

    /// Appends a gene inherited through crossover, keeping
    /// the child free of duplicate connections and cycles.
    fn inherit_gene(
        &mut self,
        mut gene: ConnectionGene,
        graph: &mut EnabledGraph,
        pairings: &mut HashSet<(NodeId, NodeId), RandomState>,
    ) {
        if !pairings.insert(gene.endpoints()) {
            return;
        }
        if gene.enabled() {
            if graph.reaches(gene.output(), gene.input()) {
                gene.set_enabled(false);
            } else {
                graph.add_edge(gene.input(), gene.output());
            }
        }
        self.genes.push(gene);
    }

    /// Returns every `(input, output)` pair that could be joined
    /// by a new gene: pairs not already connected by any gene,
    /// not targeting an input node, not originating at an output
    /// node, not self-loops, and not closing a cycle through
    /// enabled genes.
    ///
    /// # Examples
    /// ```
    /// use toponeat::genomics::{ConnectionGene, Genome};
    ///
    /// let genome = Genome::from_genes(2, 1, vec![
    ///     ConnectionGene::new(0, 2, 0.5, false, 0),
    ///     ConnectionGene::new(1, 2, 0.5, true, 1),
    ///     ConnectionGene::new(0, 3, 1.0, true, 2),
    ///     ConnectionGene::new(3, 2, 0.5, true, 3),
    /// ]).unwrap();
    ///
    /// // Only input 1 -> hidden 3 remains.
    /// assert_eq!(genome.candidate_connections(), vec![(1, 3)]);
    /// ```
    pub fn candidate_connections(&self) -> Vec<(NodeId, NodeId)> {
        let topology = self.topology();
        let nodes = self.node_ids();
        let pairings: HashSet<(NodeId, NodeId), RandomState> =
            self.genes.iter().map(ConnectionGene::endpoints).collect();

        // A new gene input -> output closes a cycle
        // iff output already reaches input.
        let downstream: Vec<(NodeId, Vec<bool>)> = nodes
            .iter()
            .copied()
            .filter(|&n| !self.is_input(n))
            .map(|n| (n, topology.graph().reachable_from(n, topology.slots())))
            .collect();

        let mut candidates = vec![];
        for &input in nodes.iter().filter(|&&n| !self.is_output(n)) {
            for (output, reachable) in &downstream {
                if !reachable[input] && !pairings.contains(&(input, *output)) {
                    candidates.push((input, *output));
                }
            }
        }
        candidates
    }

    /// Induces a _weight mutation_: each gene has a
    /// `mutation_rate` chance of being mutated, in which case it
    /// is perturbed with probability `perturbation_rate` and
    /// given a fresh random weight otherwise.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::genomics::Genome;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(9);
    /// let mut genome = Genome::new(2, 2, &mut rng).unwrap();
    /// let before: Vec<f64> = genome.genes().iter().map(|g| g.weight()).collect();
    ///
    /// genome.mutate_weights(0.0, 0.5, &mut rng);
    /// let after: Vec<f64> = genome.genes().iter().map(|g| g.weight()).collect();
    ///
    /// assert_eq!(before, after);
    /// ```
    pub fn mutate_weights<R: Rng + ?Sized>(
        &mut self,
        mutation_rate: f64,
        perturbation_rate: f64,
        rng: &mut R,
    ) {
        for gene in &mut self.genes {
            if rng.gen::<f64>() < mutation_rate {
                if rng.gen::<f64>() < perturbation_rate {
                    gene.perturb_weight(rng);
                } else {
                    gene.randomize_weight(rng);
                }
            }
        }
    }

    /// Induces a _node mutation_: a random enabled gene is
    /// disabled and replaced by a new hidden node with two genes,
    /// `input -> new` with weight `1.0` and `new -> output` with
    /// the old gene's weight. The new node's id is one past the
    /// highest node id in the genome.
    ///
    /// Returns the innovation numbers of the two new genes, or
    /// `None` if the genome has no enabled gene to split.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::genomics::{Genome, InnovationRegistry};
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(2);
    /// let mut registry = InnovationRegistry::new(1, 1);
    /// let mut genome = Genome::new(1, 1, &mut rng).unwrap();
    /// let weight = genome.genes()[0].weight();
    ///
    /// let (into, out_of) = genome.mutate_split_connection(&mut registry, &mut rng).unwrap();
    ///
    /// assert_eq!((into, out_of), (1, 2));
    /// assert!(!genome.genes()[0].enabled());
    /// assert_eq!(genome.genes()[1].endpoints(), (0, 2));
    /// assert_eq!(genome.genes()[1].weight(), 1.0);
    /// assert_eq!(genome.genes()[2].endpoints(), (2, 1));
    /// assert_eq!(genome.genes()[2].weight(), weight);
    /// ```
    pub fn mutate_split_connection<R: Rng + ?Sized>(
        &mut self,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Option<(Innovation, Innovation)> {
        let enabled: Vec<usize> = (0..self.genes.len())
            .filter(|&i| self.genes[i].enabled())
            .collect();
        let split = *enabled.choose(rng)?;

        let new_node = self.next_node_id();
        let (input, output) = self.genes[split].endpoints();
        let weight = self.genes[split].weight();
        self.genes[split].set_enabled(false);

        let into = registry.get_or_assign(input, new_node);
        let out_of = registry.get_or_assign(new_node, output);
        self.insert_gene(ConnectionGene::new(input, new_node, 1.0, true, into));
        self.insert_gene(ConnectionGene::new(new_node, output, weight, true, out_of));
        self.topology.take();

        Some((into, out_of))
    }

    /// Induces a _connection mutation_: a random pair from
    /// [`candidate_connections`](Genome::candidate_connections)
    /// is joined by a new enabled gene with a random weight.
    ///
    /// Returns the new gene's innovation number, or `None` if
    /// there are no candidate connections.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::genomics::{Genome, InnovationRegistry};
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(4);
    /// let mut registry = InnovationRegistry::new(2, 1);
    /// let mut genome = Genome::new(2, 1, &mut rng).unwrap();
    ///
    /// // A fresh genome is already fully connected.
    /// assert_eq!(genome.mutate_add_connection(&mut registry, &mut rng), None);
    ///
    /// genome.mutate_split_connection(&mut registry, &mut rng).unwrap();
    /// assert!(genome.mutate_add_connection(&mut registry, &mut rng).is_some());
    /// assert_eq!(genome.genes().len(), 2 + 2 + 1);
    /// ```
    pub fn mutate_add_connection<R: Rng + ?Sized>(
        &mut self,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Option<Innovation> {
        let candidates = self.candidate_connections();
        let &(input, output) = candidates.choose(rng)?;

        let innovation = registry.get_or_assign(input, output);
        self.insert_gene(ConnectionGene::with_random_weight(
            input, output, innovation, rng,
        ));
        self.topology.take();

        Some(innovation)
    }

    /// Inserts a gene at its innovation-ordered position.
    fn insert_gene(&mut self, gene: ConnectionGene) {
        match self
            .genes
            .binary_search_by_key(&gene.innovation(), |g| g.innovation())
        {
            Ok(_) => panic!("duplicate innovation {} in {}", gene.innovation(), self),
            Err(position) => self.genes.insert(position, gene),
        }
    }

    fn topology(&self) -> &Topology {
        self.topology.get_or_init(|| {
            Topology::build(self.input_count, self.output_count, &self.genes)
                .unwrap_or_else(|| panic!("enabled genes form a cycle in {}", self))
        })
    }

    fn assert_same_node_scheme(&self, other: &Genome, operation: &str) {
        assert!(
            self.input_count == other.input_count && self.output_count == other.output_count,
            "{} between genomes with different node counts ({} -> {} and {} -> {})",
            operation,
            self.input_count,
            self.output_count,
            other.input_count,
            other.output_count,
        );
    }

    fn is_input(&self, node: NodeId) -> bool {
        node < self.input_count
    }

    fn is_output(&self, node: NodeId) -> bool {
        (self.input_count..self.input_count + self.output_count).contains(&node)
    }

    /// Id for a new hidden node.
    fn next_node_id(&self) -> NodeId {
        self.genes
            .iter()
            .map(|g| g.input().max(g.output()) + 1)
            .fold(self.input_count + self.output_count, usize::max)
    }

    /// All node ids in the genome, in ascending order.
    fn node_ids(&self) -> Vec<NodeId> {
        (0..self.input_count + self.output_count)
            .chain(self.hidden_nodes())
            .collect()
    }

    /// Returns the ids of the genome's hidden nodes
    /// in ascending order.
    pub fn hidden_nodes(&self) -> Vec<NodeId> {
        let first_hidden = self.input_count + self.output_count;
        let mut hidden: Vec<NodeId> = self
            .genes
            .iter()
            .flat_map(|g| [g.input(), g.output()])
            .filter(|&n| n >= first_hidden)
            .collect();
        hidden.sort_unstable();
        hidden.dedup();
        hidden
    }

    /// Returns the total number of nodes in the genome.
    pub fn node_count(&self) -> usize {
        self.input_count + self.output_count + self.hidden_nodes().len()
    }

    /// Returns the number of input nodes.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Returns the number of output nodes.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Returns the genome's genes, sorted by innovation number.
    pub fn genes(&self) -> &[ConnectionGene] {
        &self.genes
    }

    /// Returns whether the genome's enabled genes are free of
    /// cycles. Always `true` for genomes built and evolved
    /// through this crate.
    pub fn is_feed_forward(&self) -> bool {
        Topology::build(self.input_count, self.output_count, &self.genes).is_some()
    }

    /// Returns the genome's fitness, or `None` if it
    /// has not been evaluated.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Sets the genome's fitness. Only the first call has an
    /// effect; `NaN` is stored as `0.0`.
    ///
    /// # Examples
    /// ```
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use toponeat::genomics::Genome;
    ///
    /// let mut genome = Genome::new(1, 1, &mut ChaCha8Rng::seed_from_u64(0)).unwrap();
    /// assert_eq!(genome.fitness(), None);
    ///
    /// genome.set_fitness(f64::NAN);
    /// genome.set_fitness(3.0);
    ///
    /// assert_eq!(genome.fitness(), Some(0.0));
    /// ```
    pub fn set_fitness(&mut self, fitness: f64) {
        if self.fitness.is_none() {
            self.fitness = Some(if fitness.is_nan() { 0.0 } else { fitness });
        }
    }

    /// Returns the species the genome was assigned to,
    /// if it has been speciated.
    pub fn species(&self) -> Option<SpeciesId> {
        self.species
    }

    /// Only the first assignment has an effect.
    pub(crate) fn set_species(&mut self, species: SpeciesId) {
        self.species.get_or_insert(species);
    }
}

fn check_node_counts(input_count: usize, output_count: usize) -> Result<(), GenomeError> {
    if input_count < 1 || output_count < 1 {
        Err(GenomeError::InvalidNodeCount {
            inputs: input_count,
            outputs: output_count,
        })
    } else {
        Ok(())
    }
}

/// Which of two aligned gene lists a gene came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Parent {
    First,
    Second,
}

/// A step of the linear merge of two innovation-sorted
/// gene lists.
#[derive(Debug)]
enum Aligned<'a> {
    Matching(&'a ConnectionGene, &'a ConnectionGene),
    Disjoint(Parent, &'a ConnectionGene),
    Excess(Parent, &'a ConnectionGene),
}

fn align<'a>(first: &'a [ConnectionGene], second: &'a [ConnectionGene]) -> Alignment<'a> {
    Alignment {
        first,
        second,
        i: 0,
        j: 0,
    }
}

struct Alignment<'a> {
    first: &'a [ConnectionGene],
    second: &'a [ConnectionGene],
    i: usize,
    j: usize,
}

impl<'a> Iterator for Alignment<'a> {
    type Item = Aligned<'a>;

    fn next(&mut self) -> Option<Aligned<'a>> {
        match (self.first.get(self.i), self.second.get(self.j)) {
            (Some(a), Some(b)) => match a.innovation().cmp(&b.innovation()) {
                Ordering::Equal => {
                    self.i += 1;
                    self.j += 1;
                    Some(Aligned::Matching(a, b))
                }
                Ordering::Less => {
                    self.i += 1;
                    Some(Aligned::Disjoint(Parent::First, a))
                }
                Ordering::Greater => {
                    self.j += 1;
                    Some(Aligned::Disjoint(Parent::Second, b))
                }
            },
            (Some(a), None) => {
                self.i += 1;
                Some(Aligned::Excess(Parent::First, a))
            }
            (None, Some(b)) => {
                self.j += 1;
                Some(Aligned::Excess(Parent::Second, b))
            }
            (None, None) => None,
        }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fitness {
            Some(fitness) => write!(f, "Fitness {}", fitness)?,
            None => write!(f, "Fitness -")?,
        }
        match self.species {
            Some(species) => write!(f, " - Species {}", species)?,
            None => write!(f, " - Species -")?,
        }
        write!(f, " - Connections {}:", self.genes.len())?;
        for gene in &self.genes {
            write!(f, " {}", gene)?;
        }
        Ok(())
    }
}

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::num::NonZeroUsize;
use toponeat::genomics::{ConnectionGene, Genome};
use toponeat::{Trainer, TrainerConfig};

fn config(population_size: usize, input_count: usize, output_count: usize) -> TrainerConfig {
    TrainerConfig {
        population_size: NonZeroUsize::new(population_size).unwrap(),
        input_count: NonZeroUsize::new(input_count).unwrap(),
        output_count: NonZeroUsize::new(output_count).unwrap(),
        ..TrainerConfig::zero()
    }
}

#[test]
fn no_mutation_keeps_structure() {
    let mut trainer = Trainer::seeded(config(10, 2, 1), 1).unwrap();
    for _ in 0..5 {
        trainer.advance_generation(|_| 1.0);
    }

    assert_eq!(trainer.generations().len(), 6);
    for (number, generation) in trainer.generations().iter().enumerate() {
        assert_eq!(generation.len(), 10);
        for genome in generation {
            assert_eq!(genome.genes().len(), 2);
            if number < 5 {
                assert_eq!(genome.fitness(), Some(1.0));
            } else {
                assert_eq!(genome.fitness(), None);
            }
        }
    }
    // Zero modifiers and threshold: everyone is compatible.
    assert_eq!(trainer.species().len(), 1);
}

#[test]
fn identical_genes_have_zero_distance() {
    let genes = vec![
        ConnectionGene::new(0, 2, 0.25, true, 0),
        ConnectionGene::new(1, 2, -0.5, false, 1),
        ConnectionGene::new(0, 3, 1.0, true, 2),
        ConnectionGene::new(3, 2, 0.75, true, 3),
    ];
    let first = Genome::from_genes(2, 1, genes.clone()).unwrap();
    let second = Genome::from_genes(2, 1, genes).unwrap();

    for modifiers in [(0.0, 0.0, 0.0), (1.0, 1.0, 0.4), (10.0, 3.0, 7.0)] {
        let (excess, disjoint, weight) = modifiers;
        assert_eq!(
            first.compatibility_distance(&second, excess, disjoint, weight),
            0.0
        );
    }
}

#[test]
fn full_segmentation_splits_every_offspring() {
    let config = TrainerConfig {
        connection_segmentation_rate: 1.0,
        ..config(10, 2, 1)
    };
    let mut trainer = Trainer::seeded(config, 3).unwrap();
    trainer.advance_generation(|_| 1.0);

    for genome in trainer.current_generation() {
        assert_eq!(genome.genes().len(), 2 + 2);
        assert_eq!(genome.genes().iter().filter(|g| !g.enabled()).count(), 1);
        let disabled = genome.genes().iter().find(|g| !g.enabled()).unwrap();
        assert!(disabled.innovation() < 2);
        assert_eq!(genome.hidden_nodes(), vec![3]);
    }
}

#[test]
fn fresh_genome_diverges_at_zero() {
    let genome = Genome::new(2, 1, &mut ChaCha8Rng::seed_from_u64(4)).unwrap();
    let output = genome.evaluate(&[0.0, 0.0]);
    assert_eq!(output, vec![1.0 / (1.0 - 0f64.exp())]);
    assert_eq!(output, vec![f64::INFINITY]);
}

#[test]
fn genomes_survive_serialization() {
    let mut trainer = Trainer::seeded(
        TrainerConfig {
            connection_segmentation_rate: 0.5,
            connection_generation_rate: 0.5,
            ..config(8, 2, 2)
        },
        5,
    )
    .unwrap();
    for _ in 0..3 {
        trainer.advance_generation(|g| g.genes().len() as f64);
    }

    for genome in trainer.current_generation() {
        let json = serde_json::to_string(genome).unwrap();
        let restored: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.genes().len(), genome.genes().len());
        for (a, b) in restored.genes().iter().zip(genome.genes()) {
            assert_eq!(a.endpoints(), b.endpoints());
            assert_eq!(a.enabled(), b.enabled());
            assert_eq!(a.innovation(), b.innovation());
            assert!((a.weight() - b.weight()).abs() < 1e-12);
        }
        assert_eq!(restored.fitness(), None);
        assert_eq!(restored.hidden_nodes(), genome.hidden_nodes());
        assert_eq!(restored.evaluate(&[0.3, 0.9]).len(), 2);
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let config = TrainerConfig {
        excess_connection_modifier: 1.0,
        disjoint_connection_modifier: 1.0,
        average_weight_difference_modifier: 0.4,
        compatibility_threshold: 0.5,
        interspecies_mating_rate: 0.05,
        connection_disable_rate: 0.75,
        connection_mutation_rate: 0.8,
        connection_perturbation_rate: 0.9,
        connection_segmentation_rate: 0.1,
        connection_generation_rate: 0.2,
        ..config(30, 3, 2)
    };
    let run = |seed| {
        let mut trainer = Trainer::seeded(config.clone(), seed).unwrap();
        for _ in 0..6 {
            trainer.advance_generation(|g| g.node_count() as f64);
        }
        trainer
    };

    let (first, second) = (run(9), run(9));
    assert_eq!(
        first.registry().latest_innovation(),
        second.registry().latest_innovation()
    );
    assert_eq!(first.species().len(), second.species().len());
    for (a, b) in first.generations().iter().zip(second.generations()) {
        for (x, y) in a.iter().zip(b) {
            assert_eq!(x.genes(), y.genes());
        }
    }
}

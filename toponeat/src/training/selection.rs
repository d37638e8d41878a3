use rand::Rng;

/// Draws `count` indices into `weights`, independently and with
/// replacement, each index being drawn with probability
/// proportional to its weight.
///
/// Negative and `NaN` weights count as zero. If all weights are
/// zero, every index is equally likely; if the weights add up to
/// infinity, the draw is uniform among the infinite weights.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use toponeat::training::select_random_weights;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(0);
///
/// let picks = select_random_weights(&[0.0, 3.0, 0.0, 1.0], 100, &mut rng);
/// assert_eq!(picks.len(), 100);
/// assert!(picks.iter().all(|&i| i == 1 || i == 3));
///
/// assert!(select_random_weights(&[], 5, &mut rng).is_empty());
/// ```
pub fn select_random_weights<R: Rng + ?Sized>(
    weights: &[f64],
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    if weights.is_empty() {
        return vec![];
    }

    let weights: Vec<f64> = weights
        .iter()
        .map(|&w| if w > 0.0 { w } else { 0.0 })
        .collect();
    let total: f64 = weights.iter().sum();

    if total == 0.0 {
        return (0..count).map(|_| rng.gen_range(0..weights.len())).collect();
    }
    if total.is_infinite() {
        let infinite: Vec<usize> = (0..weights.len())
            .filter(|&i| weights[i].is_infinite())
            .collect();
        if !infinite.is_empty() {
            return (0..count)
                .map(|_| infinite[rng.gen_range(0..infinite.len())])
                .collect();
        }
        // Finite weights that overflow when summed.
        let largest = weights.iter().copied().fold(0.0, f64::max);
        let scaled: Vec<f64> = weights.iter().map(|w| w / largest).collect();
        return select_random_weights(&scaled, count, rng);
    }

    (0..count)
        .map(|_| {
            let mut target = rng.gen::<f64>() * total;
            for (index, weight) in weights.iter().enumerate() {
                if *weight > 0.0 && target < *weight {
                    return index;
                }
                target -= weight;
            }
            // Rounding can leave a sliver of `target`: it
            // belongs to the last drawable index.
            weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
        })
        .collect()
}

/// Splits `slots` offspring among species in proportion to
/// their mean fitness. `means[i]` is `None` if species `i` has
/// no members, in which case it receives no offspring.
///
/// Every species gets the floor of its proportional share, and
/// the slots left over are drawn with [`select_random_weights`]
/// using the fractional parts as weights. Negative means count
/// as zero. If the means add up to zero or to infinity, every
/// species with members gets an equal share.
///
/// The allotment always sums to `slots`.
///
/// # Panics
/// Panics if `slots > 0` and no species has members.
pub(crate) fn allot_offspring<R: Rng + ?Sized>(
    means: &[Option<f64>],
    slots: usize,
    rng: &mut R,
) -> Vec<usize> {
    let live: Vec<bool> = means.iter().map(Option::is_some).collect();
    let live_count = live.iter().filter(|l| **l).count();
    if slots == 0 {
        return vec![0; means.len()];
    }
    assert!(live_count > 0, "cannot allot offspring without live species");

    let fitnesses: Vec<f64> = means
        .iter()
        .map(|m| match m {
            Some(f) if *f > 0.0 => *f,
            _ => 0.0,
        })
        .collect();
    let total: f64 = fitnesses.iter().sum();

    let shares: Vec<f64> = if total > 0.0 && total.is_finite() {
        fitnesses
            .iter()
            .map(|f| f / total * slots as f64)
            .collect()
    } else {
        live.iter()
            .map(|&l| if l { slots as f64 / live_count as f64 } else { 0.0 })
            .collect()
    };

    let mut allotment: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let assigned: usize = allotment.iter().sum();
    let remainder = slots.saturating_sub(assigned);

    let mut fractions: Vec<f64> = shares.iter().map(|s| s - s.floor()).collect();
    if fractions.iter().all(|f| *f <= 0.0) {
        fractions = live.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
    }
    for index in select_random_weights(&fractions, remainder, rng) {
        allotment[index] += 1;
    }
    allotment
}

/// Counts the successes of `trials` Bernoulli trials
/// with success probability `rate`.
pub(crate) fn count_successes<R: Rng + ?Sized>(trials: usize, rate: f64, rng: &mut R) -> usize {
    (0..trials).filter(|_| rng.gen::<f64>() < rate).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(17)
    }

    fn histogram(picks: &[usize], len: usize) -> Vec<usize> {
        let mut counts = vec![0; len];
        for &p in picks {
            counts[p] += 1;
        }
        counts
    }

    #[test]
    fn proportional_draws() {
        let picks = select_random_weights(&[1.0, 3.0], 20_000, &mut rng());
        let counts = histogram(&picks, 2);
        let ratio = counts[1] as f64 / counts[0] as f64;
        assert!((2.7..3.3).contains(&ratio), "ratio {}", ratio);
    }

    #[test]
    fn zero_total_is_uniform() {
        let picks = select_random_weights(&[0.0, 0.0, 0.0], 3_000, &mut rng());
        let counts = histogram(&picks, 3);
        assert!(counts.iter().all(|&c| c > 800), "{:?}", counts);
    }

    #[test]
    fn negative_and_nan_weights_never_drawn() {
        let picks = select_random_weights(&[-5.0, f64::NAN, 2.0, -0.0], 1_000, &mut rng());
        assert!(picks.iter().all(|&i| i == 2));
    }

    #[test]
    fn infinite_weights_dominate() {
        let picks = select_random_weights(
            &[1.0, f64::INFINITY, 5.0, f64::INFINITY],
            1_000,
            &mut rng(),
        );
        let counts = histogram(&picks, 4);
        assert_eq!(counts[0] + counts[2], 0);
        assert!(counts[1] > 0 && counts[3] > 0);
    }

    #[test]
    fn overflowing_finite_weights() {
        let picks = select_random_weights(&[f64::MAX, f64::MAX, 0.0], 1_000, &mut rng());
        let counts = histogram(&picks, 3);
        assert_eq!(counts[2], 0);
        assert!(counts[0] > 0 && counts[1] > 0);
    }

    #[test]
    fn allotment_sums_to_slots() {
        let mut rng = rng();
        let cases: Vec<Vec<Option<f64>>> = vec![
            vec![Some(5.2), Some(9.5), Some(2.8), None, Some(1.3)],
            vec![Some(1.0), Some(1.0), Some(1.0)],
            vec![Some(0.0), Some(0.0), None],
            vec![Some(-3.0), Some(2.0)],
            vec![Some(f64::INFINITY), Some(1.0)],
            vec![Some(f64::MAX), Some(f64::MAX)],
            vec![Some(1e-300), Some(1e-300), Some(1e-300)],
        ];
        for means in &cases {
            for slots in [0, 1, 7, 10, 150] {
                let allotment = allot_offspring(means, slots, &mut rng);
                assert_eq!(allotment.iter().sum::<usize>(), slots, "{:?}", means);
                for (mean, quota) in means.iter().zip(&allotment) {
                    if mean.is_none() {
                        assert_eq!(*quota, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn allotment_floors_proportional_shares() {
        let allotment = allot_offspring(&[Some(1.0), Some(3.0), None], 8, &mut rng());
        assert_eq!(allotment, vec![2, 6, 0]);

        let allotment = allot_offspring(&[Some(1.0), Some(2.0)], 10, &mut rng());
        // Shares 3.33 and 6.67: one slot left to draw.
        assert!(allotment == vec![4, 6] || allotment == vec![3, 7]);
    }

    #[test]
    fn zero_fitness_split_equally() {
        let allotment = allot_offspring(&[Some(0.0), None, Some(0.0)], 10, &mut rng());
        assert_eq!(allotment, vec![5, 0, 5]);
    }

    #[test]
    #[should_panic]
    fn allotment_without_live_species() {
        allot_offspring(&[None, None], 3, &mut rng());
    }

    #[test]
    fn bernoulli_extremes() {
        let mut rng = rng();
        assert_eq!(count_successes(50, 0.0, &mut rng), 0);
        assert_eq!(count_successes(50, 1.0, &mut rng), 50);
    }
}

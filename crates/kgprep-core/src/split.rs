//! Randomized train/eval/test partitioning of rating records.
//!
//! Train indices are drawn first, uniformly without replacement, then eval
//! indices are drawn from what is left; every remaining index goes to test.
//! Because sizes are truncated, test absorbs the rounding remainder.

use crate::{Error, Rating, Result};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fractions of the rating set assigned to train and eval.
///
/// Test receives everything else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    /// Train fraction, in `(0, 1)`.
    pub train: f64,
    /// Eval fraction, in `(0, 1)`.
    pub eval: f64,
}

impl Default for SplitRatios {
    /// train:eval:test = 6:2:2
    fn default() -> Self {
        Self {
            train: 0.6,
            eval: 0.2,
        }
    }
}

impl SplitRatios {
    /// Create ratios without validating them.
    pub const fn new(train: f64, eval: f64) -> Self {
        Self { train, eval }
    }

    /// Reject ratios that would overlap or produce empty/negative partitions.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("train_ratio", self.train), ("eval_ratio", self.eval)] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(Error::Config(format!(
                    "{name} must be in (0, 1), got {value}"
                )));
            }
        }
        if self.train + self.eval > 1.0 {
            return Err(Error::Config(format!(
                "train_ratio + eval_ratio must be <= 1, got {} + {}",
                self.train, self.eval
            )));
        }
        Ok(())
    }

    /// Partition sizes `(train, eval, test)` for `n` records.
    pub fn sizes(&self, n: usize) -> (usize, usize, usize) {
        let train = (n as f64 * self.train) as usize;
        let eval = (n as f64 * self.eval) as usize;
        (train, eval, n.saturating_sub(train + eval))
    }
}

/// Record indices of each partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitIndices {
    /// Train indices, in sampling order.
    pub train: Vec<usize>,
    /// Eval indices, in sampling order.
    pub eval: Vec<usize>,
    /// Test indices, ascending.
    pub test: Vec<usize>,
}

impl SplitIndices {
    /// Total number of indices across partitions.
    pub fn len(&self) -> usize {
        self.train.len() + self.eval.len() + self.test.len()
    }

    /// True when all partitions are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rating records of each partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSplit {
    /// Training records.
    pub train: Vec<Rating>,
    /// Evaluation records.
    pub eval: Vec<Rating>,
    /// Test records.
    pub test: Vec<Rating>,
}

impl DatasetSplit {
    /// Total number of records across partitions.
    pub fn len(&self) -> usize {
        self.train.len() + self.eval.len() + self.test.len()
    }

    /// True when all partitions are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition the index range `0..n`.
///
/// # Example
///
/// ```rust
/// use kgprep_core::split::{split_indices, SplitRatios};
/// use rand::SeedableRng;
/// use rand_xorshift::XorShiftRng;
///
/// let mut rng = XorShiftRng::seed_from_u64(42);
/// let parts = split_indices(10, SplitRatios::new(0.6, 0.2), &mut rng).unwrap();
///
/// assert_eq!(parts.train.len(), 6);
/// assert_eq!(parts.eval.len(), 2);
/// assert_eq!(parts.test.len(), 2);
/// ```
pub fn split_indices<R: Rng + ?Sized>(
    n: usize,
    ratios: SplitRatios,
    rng: &mut R,
) -> Result<SplitIndices> {
    ratios.validate()?;
    let (n_train, n_eval, _) = ratios.sizes(n);

    if n_train > n {
        return Err(Error::InsufficientRatings {
            requested: n_train,
            available: n,
        });
    }
    let train = index::sample(rng, n, n_train).into_vec();

    let mut taken = vec![false; n];
    for &i in &train {
        taken[i] = true;
    }
    let left: Vec<usize> = (0..n).filter(|&i| !taken[i]).collect();

    if n_eval > left.len() {
        return Err(Error::InsufficientRatings {
            requested: n_eval,
            available: left.len(),
        });
    }
    let eval: Vec<usize> = index::sample(rng, left.len(), n_eval)
        .into_iter()
        .map(|pos| left[pos])
        .collect();
    for &i in &eval {
        taken[i] = true;
    }

    let test: Vec<usize> = left.into_iter().filter(|&i| !taken[i]).collect();

    Ok(SplitIndices { train, eval, test })
}

/// Partition rating records into train, eval and test.
pub fn split_ratings<R: Rng + ?Sized>(
    ratings: &[Rating],
    ratios: SplitRatios,
    rng: &mut R,
) -> Result<DatasetSplit> {
    info!(ratings = ratings.len(), "splitting dataset");
    let parts = split_indices(ratings.len(), ratios, rng)?;

    let pick = |indices: &[usize]| indices.iter().map(|&i| ratings[i]).collect::<Vec<_>>();
    let split = DatasetSplit {
        train: pick(&parts.train),
        eval: pick(&parts.eval),
        test: pick(&parts.test),
    };
    debug!(
        train = split.train.len(),
        eval = split.eval.len(),
        test = split.test.len(),
        "dataset split"
    );
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;
    use std::collections::HashSet;

    fn ratings(n: u32) -> Vec<Rating> {
        (0..n).map(|i| Rating::new(i % 3, i, (i % 2) as i32)).collect()
    }

    #[test]
    fn test_ten_records_six_two_two() {
        let data = ratings(10);
        let mut rng = XorShiftRng::seed_from_u64(7);
        let split = split_ratings(&data, SplitRatios::new(0.6, 0.2), &mut rng).unwrap();

        assert_eq!(split.train.len(), 6);
        assert_eq!(split.eval.len(), 2);
        assert_eq!(split.test.len(), 2);

        // Items are unique per record, so they identify the source index.
        let mut items: Vec<u32> = split
            .train
            .iter()
            .chain(&split.eval)
            .chain(&split.test)
            .map(|r| r.item)
            .collect();
        items.sort_unstable();
        assert_eq!(items, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_indices_disjoint_and_exhaustive() {
        let mut rng = XorShiftRng::seed_from_u64(1);
        let parts = split_indices(101, SplitRatios::new(0.7, 0.15), &mut rng).unwrap();

        assert_eq!(parts.train.len(), 70);
        assert_eq!(parts.eval.len(), 15);
        assert_eq!(parts.test.len(), 16);

        let all: HashSet<usize> = parts
            .train
            .iter()
            .chain(&parts.eval)
            .chain(&parts.test)
            .copied()
            .collect();
        assert_eq!(all.len(), 101);
        assert!(all.iter().all(|&i| i < 101));
    }

    #[test]
    fn test_test_indices_ascending() {
        let mut rng = XorShiftRng::seed_from_u64(3);
        let parts = split_indices(50, SplitRatios::default(), &mut rng).unwrap();
        assert!(parts.test.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_input() {
        let mut rng = XorShiftRng::seed_from_u64(0);
        let split = split_ratings(&[], SplitRatios::default(), &mut rng).unwrap();
        assert!(split.is_empty());

        let parts = split_indices(0, SplitRatios::default(), &mut rng).unwrap();
        assert!(parts.is_empty());
        assert_eq!(parts.len(), 0);
    }

    #[test]
    fn test_ratios_filling_everything_leave_empty_test() {
        let mut rng = XorShiftRng::seed_from_u64(0);
        let parts = split_indices(10, SplitRatios::new(0.5, 0.5), &mut rng).unwrap();
        assert_eq!(parts.train.len(), 5);
        assert_eq!(parts.eval.len(), 5);
        assert!(parts.test.is_empty());
    }

    #[test]
    fn test_invalid_ratios_rejected() {
        let mut rng = XorShiftRng::seed_from_u64(0);
        for ratios in [
            SplitRatios::new(0.8, 0.3),
            SplitRatios::new(0.0, 0.2),
            SplitRatios::new(0.6, -0.1),
            SplitRatios::new(1.0, 0.2),
            SplitRatios::new(f64::NAN, 0.2),
        ] {
            let err = split_indices(10, ratios, &mut rng).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{ratios:?} gave {err:?}");
        }
    }

    #[test]
    fn test_seeded_split_is_reproducible() {
        let data = ratings(40);
        let a = split_ratings(&data, SplitRatios::default(), &mut XorShiftRng::seed_from_u64(9));
        let b = split_ratings(&data, SplitRatios::default(), &mut XorShiftRng::seed_from_u64(9));
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn test_sizes_truncate() {
        assert_eq!(SplitRatios::new(0.6, 0.2).sizes(7), (4, 1, 2));
        assert_eq!(SplitRatios::new(0.6, 0.2).sizes(0), (0, 0, 0));
    }
}

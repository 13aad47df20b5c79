// ============================================================
// Layer 4 - Random Train/Validation Splitter
// ============================================================
// Shuffles sample indices and splits them into (train, valid).
//
// Used when a dataset should not be split along its shipped
// TRAIN / TEST files, e.g. to hold out a random fraction of
// the combined data instead.
//
// A fixed seed makes the split reproducible between the train
// and predict commands.
//
// Reference: rand crate documentation (SliceRandom, StdRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::splits::Splits;

/// Randomly split `0..n` into train and validation index sets.
///
/// # Arguments
/// * `n`          - Number of samples
/// * `valid_size` - Proportion for validation, e.g. 0.2 = 20%
/// * `seed`       - RNG seed
pub fn random_splits(n: usize, valid_size: f64, seed: u64) -> Splits {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);

    // Fisher-Yates shuffle
    indices.shuffle(&mut rng);

    let n_valid = ((n as f64) * valid_size.clamp(0.0, 1.0)).round() as usize;
    let n_valid = n_valid.min(n);

    // split_off(k) leaves [0..k] in indices and returns [k..]
    let mut valid = indices.split_off(n - n_valid);
    let mut train = indices;
    train.sort_unstable();
    valid.sort_unstable();

    tracing::debug!(
        "Random split: {} training, {} validation (seed {})",
        train.len(),
        valid.len(),
        seed,
    );

    Splits::new(train, valid)
}

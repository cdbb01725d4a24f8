// ============================================================
// Layer 4 - Train/Held-out Splitter
// ============================================================
// Shuffles samples and splits them into two sets:
//   - Training set:  used to fit the forest
//   - Held-out set:  used only for evaluation
//
// Why shuffle before splitting?
//   The combined record set is ordered by source (all personal
//   indicator rows, then clinical records, then heart failure).
//   Without shuffling, the held-out set would be drawn from the
//   first source only.
//
// The shuffle is seeded (ChaCha8Rng) so the same seed always
// yields the same partition, on every platform. The held-out
// set is the first round(total * test_fraction) shuffled samples.
//
// Reference: rand / rand_chacha crate documentation

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Shuffle `samples` with `seed` and split into (train, held_out).
///
/// # Arguments
/// * `samples`       - All available samples (consumed by this function)
/// * `test_fraction` - Proportion held out, e.g. 0.2 = 20%
/// * `seed`          - Shuffle seed
///
/// # Example
/// ```ignore
/// let (train, test) = split_train_test((0..22).collect(), 0.2, 42);
/// // test has round(22 * 0.2) = 4 items
/// ```
pub fn split_train_test<T>(mut samples: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total  = samples.len();
    let n_test = ((total as f64) * test_fraction.clamp(0.0, 1.0)).round() as usize;

    // split_off(n) leaves [0..n) in `samples` and returns [n..total);
    // the first n_test shuffled samples are held out
    let train    = samples.split_off(n_test.min(total));
    let held_out = samples;

    tracing::debug!(
        "Dataset split: {} training, {} held-out (seed {})",
        train.len(),
        held_out.len(),
        seed,
    );

    (train, held_out)
}

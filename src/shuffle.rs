use rand::seq::SliceRandom;
use rand::Rng;

/// Return a uniformly shuffled copy of `items`. The input is never
/// mutated; callers needing determinism inject a seeded RNG.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

use rand::prelude::{SeedableRng, StdRng};

/// Creates the generator used for every random decision in a search.
///
/// A fixed seed makes searches reproducible, `None` draws a seed from the OS.
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

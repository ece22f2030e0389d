use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the uniform draws an iteration makes (endpoint, text, pacing).
pub trait ChoiceSource {
    /// Returns a value uniformly drawn from `[0, upper)`; `upper == 0` yields 0.
    fn pick(&mut self, upper: u64) -> u64;
}

/// [`ChoiceSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngChoices<R> {
    rng: R,
}

impl<R> RngChoices<R> {
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngChoices<StdRng> {
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ChoiceSource for RngChoices<R> {
    fn pick(&mut self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }
}

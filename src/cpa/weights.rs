//! Weight callbacks used when a cumulative probability array is built
//! directly from a list of payloads.

use crate::rng::RandomSource;

/// Produces the sampling weight of a payload.
pub trait WeightFn<T> {
    fn weight(&mut self, payload: &T) -> f64;
}

impl<T, F> WeightFn<T> for F
where
    F: FnMut(&T) -> f64,
{
    fn weight(&mut self, payload: &T) -> f64 {
        self(payload)
    }
}

/// Stand-in weight generator: ignores the payload and draws a uniform
/// integer weight from `low..=high`.
///
/// Only meant for tests and demonstrations. The weights carry no
/// information about the payload, so sampling with them is meaningless
/// for a real model.
pub struct TestWeights<'a, R: RandomSource + ?Sized> {
    rng: &'a mut R,
    low: i64,
    high: i64,
}

impl<'a, R: RandomSource + ?Sized> TestWeights<'a, R> {
    /// Weights between 1 and 10 inclusive.
    pub fn new(rng: &'a mut R) -> Self {
        Self::with_range(rng, 1, 10)
    }

    pub fn with_range(rng: &'a mut R, low: i64, high: i64) -> Self {
        debug_assert!(low >= 1 && high >= low);
        TestWeights { rng, low, high }
    }
}

impl<T, R: RandomSource + ?Sized> WeightFn<T> for TestWeights<'_, R> {
    fn weight(&mut self, _payload: &T) -> f64 {
        self.rng.uniform_int_inclusive(self.low, self.high) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn test_closure_weights() {
        let mut by_value = |x: &u32| *x as f64 * 0.5;
        assert_eq!(WeightFn::weight(&mut by_value, &4), 2.0);
    }

    #[test]
    fn test_test_weights_stay_in_range() {
        let mut rng = seeded_rng(3);
        let mut weights = TestWeights::new(&mut rng);
        for i in 0..200u32 {
            let w = weights.weight(&i);
            assert!((1.0..=10.0).contains(&w));
            assert_eq!(w.fract(), 0.0);
        }
    }
}

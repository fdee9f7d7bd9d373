use std::any::TypeId;
use std::cell::RefMut;

use log::trace;
use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::distr::weighted::{Weight, WeightedIndex};
use rand::distr::Distribution;
use rand::{Rng, SeedableRng};
use rand_distr::{Gamma, Poisson};

use crate::context::SimulationContext;
use crate::hashing::hash_str;
use crate::random::{RngHolder, RngId, RngPlugin};

/// Seed used when a run does not specify one explicitly (mirrors the teacher's test-only
/// default; production runs always pass an explicit seed from `Config`).
pub const DEFAULT_RNG_SEED: u64 = 0;

/// Gets a mutable reference to the stream for `R`, creating it (seeded from the base seed plus
/// a name-derived offset) on first use. Panics if `init_random` has not been called yet.
fn get_rng<R: RngId + 'static>(context: &SimulationContext) -> RefMut<'_, R::RngType> {
    let data_container = context.get_data(RngPlugin);
    let rng_holders = data_container.rng_holders.borrow_mut();
    RefMut::map(rng_holders, |holders| {
        holders
            .entry(TypeId::of::<R>())
            .or_insert_with(|| {
                trace!("creating new RNG stream {}", R::get_name());
                let base_seed = data_container.base_seed;
                let seed_offset = hash_str(R::get_name());
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(
                        base_seed.wrapping_add(seed_offset),
                    )),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .unwrap()
    })
}

impl SimulationContext {
    /// Seeds all of this run's RNG streams from a single base seed. Must be called before any
    /// `sample*` call. Calling it again re-seeds every stream, which tests use to assert
    /// deterministic replay.
    pub fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module with base seed {base_seed}");
        let data_container = self.get_data_mut(RngPlugin);
        data_container.base_seed = base_seed;
        data_container.rng_holders.borrow_mut().clear();
    }

    /// Draws from the stream `R` using an arbitrary sampler closure.
    pub fn sample<R: RngId + 'static, T>(
        &self,
        _rng_id: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        let mut rng = get_rng::<R>(self);
        sampler(&mut rng)
    }

    /// Draws from the given distribution using the stream `R`.
    pub fn sample_distr<R: RngId + 'static, T>(
        &self,
        _rng_id: R,
        distribution: impl Distribution<T>,
    ) -> T
    where
        R::RngType: Rng,
    {
        let mut rng = get_rng::<R>(self);
        distribution.sample::<R::RngType>(&mut rng)
    }

    /// Draws a value uniformly from `range` using the stream `R`.
    pub fn sample_range<R: RngId + 'static, S, T>(&self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    /// Draws `true` with probability `p` using the stream `R`.
    pub fn sample_bool<R: RngId + 'static>(&self, rng_id: R, p: f64) -> bool
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| rng.random_bool(p))
    }

    /// Draws a categorical index from `weights` (relative, need not sum to 1) using stream `R`.
    /// Backs multi-first-line-therapy selection (`strategy::Mft`) and weighted biting-recipient
    /// selection.
    pub fn sample_weighted<R: RngId + 'static, T>(&self, _rng_id: R, weights: &[T]) -> usize
    where
        R::RngType: Rng,
        T: Clone
            + Default
            + SampleUniform
            + for<'a> std::ops::AddAssign<&'a T>
            + PartialOrd
            + Weight,
    {
        let index = WeightedIndex::new(weights).unwrap();
        let mut rng = get_rng::<R>(self);
        index.sample(&mut *rng)
    }

    /// Draws a Poisson-distributed count with the given mean using stream `R`. Backs the daily
    /// biting-bite-count draw and district-importation daily-rate draws.
    pub fn sample_poisson<R: RngId + 'static>(&self, rng_id: R, mean: f64) -> u64 {
        if mean <= 0.0 {
            return 0;
        }
        self.sample_distr(rng_id, Poisson::new(mean).expect("poisson mean must be finite and positive")) as u64
    }

    /// Draws a Gamma-distributed value with the given shape/scale using stream `R`. Backs
    /// immune-component decay-rate heterogeneity draws.
    pub fn sample_gamma<R: RngId + 'static>(&self, rng_id: R, shape: f64, scale: f64) -> f64 {
        self.sample_distr(
            rng_id,
            Gamma::new(shape, scale).expect("gamma shape/scale must be finite and positive"),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::context::SimulationContext;
    use crate::define_rng;
    use rand::RngCore;

    define_rng!(FooRng);
    define_rng!(BarRng);

    #[test]
    fn get_rng_basic() {
        let mut context = SimulationContext::new();
        context.init_random(42);
        assert_ne!(
            context.sample(FooRng, RngCore::next_u64),
            context.sample(FooRng, RngCore::next_u64)
        );
    }

    #[test]
    fn multiple_rng_types_are_independent() {
        let mut context = SimulationContext::new();
        context.init_random(42);
        assert_ne!(
            context.sample(FooRng, RngCore::next_u64),
            context.sample(BarRng, RngCore::next_u64)
        );
    }

    #[test]
    fn reset_seed_reproduces_the_same_sequence() {
        let mut context = SimulationContext::new();
        context.init_random(42);
        let run_0 = context.sample(FooRng, RngCore::next_u64);
        let run_1 = context.sample(FooRng, RngCore::next_u64);

        context.init_random(42);
        assert_eq!(run_0, context.sample(FooRng, RngCore::next_u64));
        assert_eq!(run_1, context.sample(FooRng, RngCore::next_u64));

        context.init_random(88);
        assert_ne!(run_0, context.sample(FooRng, RngCore::next_u64));
    }

    #[test]
    fn sample_range_stays_in_bounds() {
        let mut context = SimulationContext::new();
        context.init_random(42);
        let result: i32 = context.sample_range(FooRng, 0..10);
        assert!((0..10).contains(&result));
    }

    #[test]
    fn sample_poisson_of_zero_mean_is_zero() {
        let mut context = SimulationContext::new();
        context.init_random(42);
        assert_eq!(context.sample_poisson(FooRng, 0.0), 0);
    }

    #[test]
    fn sample_weighted_respects_index_bounds() {
        let mut context = SimulationContext::new();
        context.init_random(42);
        let index = context.sample_weighted(FooRng, &[0.1, 0.3, 0.6]);
        assert!(index < 3);
    }
}

//! Deterministic synthetic distributions for monitoring demo mode.
//!
//! When fewer than 100 realised outcomes exist the monitors degrade to
//! these seeded samples; reports carry the `Demo` tag so a reader never
//! mistakes them for portfolio data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded sampler; identical seeds yield identical sequences on every run
pub struct DemoSampler {
    rng: StdRng,
}

impl DemoSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn uniform(&mut self, lower: f64, upper: f64) -> f64 {
        lower + (upper - lower) * self.rng.gen::<f64>()
    }

    /// Standard Box-Muller normal draw
    fn standard_normal(&mut self) -> f64 {
        let u1: f64 = self.rng.gen::<f64>().max(1e-12);
        let u2: f64 = self.rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.standard_normal()
    }

    /// A clipped normal sample vector
    pub fn normal_vec(
        &mut self,
        mean: f64,
        std_dev: f64,
        n: usize,
        clip_lower: f64,
        clip_upper: f64,
    ) -> Vec<f64> {
        (0..n)
            .map(|_| self.normal(mean, std_dev).clamp(clip_lower, clip_upper))
            .collect()
    }

    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_seeds_reproduce_sequences() {
        let mut a = DemoSampler::new(42);
        let mut b = DemoSampler::new(42);
        for _ in 0..100 {
            assert_eq!(a.normal(0.0, 1.0).to_bits(), b.normal(0.0, 1.0).to_bits());
        }
    }

    #[test]
    fn test_normal_moments_are_plausible() {
        let mut sampler = DemoSampler::new(7);
        let values = sampler.normal_vec(680.0, 80.0, 20_000, f64::NEG_INFINITY, f64::INFINITY);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        assert!((mean - 680.0).abs() < 3.0, "mean {mean}");
        assert!((var.sqrt() - 80.0).abs() < 3.0, "sd {}", var.sqrt());
    }
}

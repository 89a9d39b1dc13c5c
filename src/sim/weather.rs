//! Density modulation ("weather")
//!
//! A slow noise-driven target coverage fraction. Regrowth chance is scaled by
//! how far the grid's current coverage sits below or above the target, so the
//! overall fog density drifts toward a moving goal without touching every tile.

use serde::{Deserialize, Serialize};

use super::noise::smooth_noise;
use crate::error::{ConfigError, check_ordered, check_probability, check_rate};
use crate::lerp;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherParams {
    pub enabled: bool,
    /// Lowest target coverage fraction
    pub min_coverage: f32,
    /// Highest target coverage fraction
    pub max_coverage: f32,
    /// Noise frequency (cycles per second of game time)
    pub noise_scale: f32,
}

impl Default for WeatherParams {
    fn default() -> Self {
        Self {
            enabled: true,
            min_coverage: 0.45,
            max_coverage: 0.85,
            noise_scale: 0.01,
        }
    }
}

impl WeatherParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("weather.min_coverage", self.min_coverage)?;
        check_probability("weather.max_coverage", self.max_coverage)?;
        check_ordered("weather coverage", self.min_coverage, self.max_coverage)?;
        check_rate("weather.noise_scale", self.noise_scale)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Weather {
    params: WeatherParams,
    elapsed: f32,
    seed: u32,
    target: f32,
}

impl Weather {
    pub fn new(params: WeatherParams, seed: u64) -> Result<Self, ConfigError> {
        params.validate()?;
        let seed = (seed ^ (seed >> 32)) as u32;
        let target = sample_target(&params, 0.0, seed);
        Ok(Self {
            params,
            elapsed: 0.0,
            seed,
            target,
        })
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
        self.target = sample_target(&self.params, self.elapsed, self.seed);
    }

    /// Current target coverage, or None when modulation is disabled
    pub fn target_coverage(&self) -> Option<f32> {
        self.params.enabled.then_some(self.target)
    }
}

fn sample_target(params: &WeatherParams, t: f32, seed: u32) -> f32 {
    let n = smooth_noise(t, seed, params.noise_scale);
    lerp(params.min_coverage, params.max_coverage, 0.5 * (n + 1.0))
}

/// Scale `base_chance` toward a target coverage: below target fog spreads
/// faster, above target it slows down.
pub fn modulated_chance(base_chance: f32, target: f32, current: f32) -> f32 {
    (base_chance * (1.0 + (target - current))).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_stays_in_band() {
        let mut weather = Weather::new(WeatherParams::default(), 5).unwrap();
        for _ in 0..5000 {
            weather.update(0.5);
            let t = weather.target_coverage().unwrap();
            assert!((0.45 - 1e-5..=0.85 + 1e-5).contains(&t));
        }
    }

    #[test]
    fn test_disabled_weather_has_no_target() {
        let params = WeatherParams {
            enabled: false,
            ..Default::default()
        };
        let weather = Weather::new(params, 1).unwrap();
        assert_eq!(weather.target_coverage(), None);
    }

    #[test]
    fn test_modulation_direction() {
        let base = 0.2;
        assert!(modulated_chance(base, 0.8, 0.3) > base);
        assert!(modulated_chance(base, 0.3, 0.8) < base);
        assert_eq!(modulated_chance(base, 0.5, 0.5), base);
        assert_eq!(modulated_chance(0.9, 1.0, 0.0), 1.0);
    }
}

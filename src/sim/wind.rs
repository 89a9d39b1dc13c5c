//! Wind field driving miasma drift
//!
//! Direction and speed ease toward targets with framerate-independent
//! exponential smoothing. Direction easing always takes the shortest arc.
//! Targets are re-rolled periodically so the wind reads as weather, not dice.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::noise::smooth_noise;
use crate::error::{ConfigError, check_ordered, check_positive, check_probability, check_rate};
use crate::{lerp, polar_to_cartesian, shortest_arc};

/// How often the wind picks a new target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RetargetPolicy {
    /// Every `secs` seconds
    Interval { secs: f32 },
    /// Per-frame Bernoulli draw with probability `chance_per_sec * dt`
    Chance { chance_per_sec: f32 },
}

/// Wind tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindParams {
    /// World units per second
    pub min_speed: f32,
    pub max_speed: f32,
    /// Initial direction (degrees)
    pub start_direction_deg: f32,
    /// Largest turn per retarget (degrees, either way)
    pub shift_magnitude_deg: f32,
    pub retarget: RetargetPolicy,
    /// Easing time constant (seconds)
    pub smooth_time: f32,
    /// 0 = uniform random target speed, 1 = speed follows the noise signal
    pub noise_bias: f32,
    /// Noise frequency (cycles per second of game time)
    pub noise_scale: f32,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            min_speed: 4.0,
            max_speed: 18.0,
            start_direction_deg: 0.0,
            shift_magnitude_deg: 60.0,
            retarget: RetargetPolicy::Interval { secs: 12.0 },
            smooth_time: 3.0,
            noise_bias: 0.5,
            noise_scale: 0.05,
        }
    }
}

impl WindParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("wind.min_speed", self.min_speed)?;
        check_ordered("wind speed", self.min_speed, self.max_speed)?;
        check_rate("wind.shift_magnitude_deg", self.shift_magnitude_deg)?;
        check_positive("wind.smooth_time", self.smooth_time)?;
        check_probability("wind.noise_bias", self.noise_bias)?;
        check_rate("wind.noise_scale", self.noise_scale)?;
        match self.retarget {
            RetargetPolicy::Interval { secs } => check_positive("wind.retarget.secs", secs)?,
            RetargetPolicy::Chance { chance_per_sec } => {
                check_rate("wind.retarget.chance_per_sec", chance_per_sec)?
            }
        }
        Ok(())
    }
}

/// Whether the wind retargets itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindMode {
    /// Picks its own targets per the retarget policy
    Auto,
    /// Targets only change through `set_target`
    Manual,
}

/// Live wind state, owned by the world and updated once per frame
#[derive(Debug, Clone)]
pub struct WindState {
    /// Current heading (radians, not wrapped every frame)
    pub direction: f32,
    /// Current speed (world units per second)
    pub speed: f32,
    pub target_direction: f32,
    pub target_speed: f32,
    pub mode: WindMode,
    /// Seconds since the last retarget
    drift_timer: f32,
    /// Total game time seen, drives the noise bias
    elapsed: f32,
    noise_seed: u32,
    rng: Pcg32,
}

impl WindState {
    pub fn new(params: &WindParams, seed: u64) -> Result<Self, ConfigError> {
        params.validate()?;
        let direction = params.start_direction_deg.to_radians();
        Ok(Self {
            direction,
            speed: params.min_speed,
            target_direction: direction,
            target_speed: params.min_speed,
            mode: WindMode::Auto,
            drift_timer: 0.0,
            elapsed: 0.0,
            noise_seed: (seed ^ (seed >> 32)) as u32,
            rng: Pcg32::seed_from_u64(seed),
        })
    }

    /// World-space velocity of the wind
    pub fn vector(&self) -> Vec2 {
        polar_to_cartesian(self.speed, self.direction)
    }

    /// Switch to manual control and steer toward the given heading and speed
    pub fn set_target(&mut self, direction: f32, speed: f32) {
        self.mode = WindMode::Manual;
        self.target_direction = direction;
        self.target_speed = speed.max(0.0);
    }

    /// Advance by one frame
    pub fn update(&mut self, dt: f32, params: &WindParams) {
        if dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        self.drift_timer += dt;

        if self.mode == WindMode::Auto && self.retarget_due(dt, params) {
            self.retarget(params);
        }

        let k = 1.0 - (-dt / params.smooth_time).exp();
        self.direction += shortest_arc(self.direction, self.target_direction) * k;
        self.speed += (self.target_speed - self.speed) * k;

        self.rewrap();
    }

    fn retarget_due(&mut self, dt: f32, params: &WindParams) -> bool {
        match params.retarget {
            RetargetPolicy::Interval { secs } => self.drift_timer >= secs,
            RetargetPolicy::Chance { chance_per_sec } => {
                let p = (chance_per_sec * dt).clamp(0.0, 1.0) as f64;
                self.rng.random_bool(p)
            }
        }
    }

    fn retarget(&mut self, params: &WindParams) {
        self.drift_timer = 0.0;

        let magnitude = params.shift_magnitude_deg.to_radians();
        let turn = self.rng.random_range(-magnitude..=magnitude);
        self.target_direction = self.direction + turn;

        let uniform = self.rng.random_range(params.min_speed..=params.max_speed);
        let n = smooth_noise(self.elapsed, self.noise_seed, params.noise_scale);
        let noisy = lerp(params.min_speed, params.max_speed, 0.5 * (n + 1.0));
        self.target_speed = lerp(uniform, noisy, params.noise_bias);

        log::debug!(
            "[wind] new target: dir={:.2} rad speed={:.2}",
            self.target_direction,
            self.target_speed
        );
    }

    /// Keep direction bounded. Shifting direction and target by the same whole
    /// turn leaves every shortest-arc delta unchanged.
    fn rewrap(&mut self) {
        if self.direction.abs() > 2.0 * TAU {
            let turns = (self.direction / TAU).trunc() * TAU;
            self.direction -= turns;
            self.target_direction -= turns;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize_angle;

    fn calm() -> WindParams {
        WindParams {
            smooth_time: 1.0,
            retarget: RetargetPolicy::Interval { secs: 1.0e6 },
            ..Default::default()
        }
    }

    #[test]
    fn test_shortest_arc_easing_across_zero() {
        let params = calm();
        let mut wind = WindState::new(&params, 1).unwrap();
        wind.direction = 350.0_f32.to_radians();
        wind.set_target(10.0_f32.to_radians(), 5.0);

        wind.update(1.0, &params);

        // k = 1 - e^-1 ≈ 0.632, so 350° + 0.632 * 20° ≈ 362.6°
        let heading = normalize_angle(wind.direction).to_degrees();
        let heading = if heading < 0.0 { heading + 360.0 } else { heading };
        let progressed = (heading - 350.0).rem_euclid(360.0);
        assert!(progressed > 12.0 && progressed < 13.5, "went the long way: {heading}");
    }

    #[test]
    fn test_easing_never_overshoots() {
        let params = calm();
        let mut wind = WindState::new(&params, 2).unwrap();
        wind.set_target(1.0, 10.0);
        let mut last = wind.direction;
        for _ in 0..200 {
            wind.update(0.05, &params);
            assert!(wind.direction >= last);
            assert!(wind.direction <= 1.0 + 1e-5);
            last = wind.direction;
        }
        assert!((wind.speed - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_smoothing_is_framerate_independent() {
        let params = calm();
        let mut coarse = WindState::new(&params, 3).unwrap();
        let mut fine = WindState::new(&params, 3).unwrap();
        coarse.set_target(0.8, 12.0);
        fine.set_target(0.8, 12.0);
        coarse.update(0.5, &params);
        for _ in 0..10 {
            fine.update(0.05, &params);
        }
        assert!((coarse.direction - fine.direction).abs() < 1e-4);
        assert!((coarse.speed - fine.speed).abs() < 1e-3);
    }

    #[test]
    fn test_auto_retarget_stays_in_bounds() {
        let params = WindParams {
            retarget: RetargetPolicy::Interval { secs: 0.5 },
            ..Default::default()
        };
        let mut wind = WindState::new(&params, 42).unwrap();
        for _ in 0..600 {
            let before = wind.direction;
            wind.update(0.1, &params);
            assert!(wind.target_speed >= params.min_speed - 1e-4);
            assert!(wind.target_speed <= params.max_speed + 1e-4);
            assert!(shortest_arc(before, wind.direction).abs() <= params.shift_magnitude_deg.to_radians());
        }
    }

    #[test]
    fn test_chance_policy_is_deterministic() {
        let params = WindParams {
            retarget: RetargetPolicy::Chance { chance_per_sec: 0.5 },
            ..Default::default()
        };
        let mut a = WindState::new(&params, 9).unwrap();
        let mut b = WindState::new(&params, 9).unwrap();
        for _ in 0..500 {
            a.update(1.0 / 60.0, &params);
            b.update(1.0 / 60.0, &params);
        }
        assert_eq!(a.direction, b.direction);
        assert_eq!(a.speed, b.speed);
    }

    #[test]
    fn test_invalid_speed_range_rejected() {
        let params = WindParams {
            min_speed: 10.0,
            max_speed: 2.0,
            ..Default::default()
        };
        assert!(WindState::new(&params, 0).is_err());
    }
}

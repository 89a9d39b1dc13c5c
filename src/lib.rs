//! Miasma Sweep - fog field simulation for a top-down survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (beam geometry, wind, miasma grid, weather)
//! - `settings`: Data-driven tuning, loadable from JSON
//! - `error`: Construction-time configuration errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal render frame step used by the headless runner (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Largest frame step accepted by `tick` (hitches are clamped to this)
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Initial `last_cleared` value: far enough in the past that any cooldown has elapsed
    pub const NEVER_CLEARED: f32 = -1.0e9;

    /// Default regrowth tick rate (Hz)
    pub const REGROW_TICK_HZ: f32 = 8.0;
    /// Most regrowth ticks run in one call; any further backlog is dropped
    pub const MAX_REGROW_TICKS: u32 = 32;
    /// Side length of a bookkeeping chunk, in tiles
    pub const CHUNK_TILES: usize = 32;

    /// Laser fan is never wider than this many rays
    pub const MAX_LASER_FAN: u32 = 5;
    /// Control value the laser falls back to below the cone breakpoint when energy runs out
    pub const LASER_CUTOFF_MARGIN: f32 = 0.01;
}

/// Wrap an angle into (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    angle %= TAU;
    if angle > PI {
        angle -= TAU;
    } else if angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Shortest signed arc from `from` to `to`, in (-π, π]
#[inline]
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Position of `v` within `[lo, hi]`, clamped to [0, 1]
#[inline]
pub fn inverse_lerp(v: f32, lo: f32, hi: f32) -> f32 {
    if hi <= lo {
        return 1.0;
    }
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}

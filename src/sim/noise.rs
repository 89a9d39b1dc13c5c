//! Lightweight 1-D value noise
//!
//! Used for slow "weather" signals: wind speed bias and target fog coverage.
//! Deterministic for a given seed, no allocation, no RNG state.

/// Smooth value noise in [-1, 1].
///
/// Lattice values are hashed from the integer cell and seed, then blended with
/// a smoothstep so the signal has no kinks at lattice points.
pub fn smooth_noise(t: f32, seed: u32, scale: f32) -> f32 {
    let x = t * scale;
    let cell = x.floor();
    let f = x - cell;
    let i0 = cell as i32;
    let v0 = lattice(i0, seed);
    let v1 = lattice(i0.wrapping_add(1), seed);
    let u = f * f * (3.0 - 2.0 * f);
    (v0 + (v1 - v0) * u) * 2.0 - 1.0
}

/// Hash an integer lattice point into [0, 1)
fn lattice(i: i32, seed: u32) -> f32 {
    let mut h = (i as u32).wrapping_mul(0x9E37_79B1) ^ seed.wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

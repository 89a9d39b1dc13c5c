//! Deterministic simulation module
//!
//! Everything here must stay pure and deterministic:
//! - Seeded RNG only, one stream per component
//! - Regrowth on a fixed tick, independent of frame rate
//! - No rendering, audio or platform dependencies

pub mod beam;
pub mod clear;
pub mod drift;
pub mod grid;
pub mod noise;
pub mod regrow;
pub mod state;
pub mod tick;
pub mod weather;
pub mod wind;

pub use beam::{
    BeamController, BeamMode, BeamParams, BeamShape, BeamState, LaserEnergyParams, aim_angle,
    derive_geometry,
};
pub use grid::{FillPolicy, MiasmaGrid, MiasmaParams, TileIndex};
pub use noise::smooth_noise;
pub use state::World;
pub use tick::{FrameInput, FrameReport, tick};
pub use weather::{Weather, WeatherParams, modulated_chance};
pub use wind::{RetargetPolicy, WindMode, WindParams, WindState};

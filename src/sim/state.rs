//! Run state
//!
//! `World` owns one of each simulation component for the length of a run and is
//! passed explicitly into `tick`. Restarting a run builds a fresh `World`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::beam::BeamController;
use super::grid::MiasmaGrid;
use super::weather::Weather;
use super::wind::WindState;
use crate::error::ConfigError;
use crate::settings::Settings;

/// Independent seeds for each randomised component, derived from the run seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubSeeds {
    pub wind: u64,
    pub weather: u64,
    pub miasma: u64,
}

impl SubSeeds {
    pub fn from_run_seed(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        Self {
            wind: rng.random(),
            weather: rng.random(),
            miasma: rng.random(),
        }
    }
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Game time (seconds)
    pub time: f32,
    /// Frames simulated
    pub frame: u64,
    /// Player world position as of the last tick
    pub player: Vec2,
    pub(crate) settings: Settings,
    pub(crate) wind: WindState,
    pub(crate) beam: BeamController,
    pub(crate) weather: Weather,
    pub(crate) miasma: MiasmaGrid,
}

impl World {
    /// Validate settings and build every component for a fresh run
    pub fn new(settings: Settings, seed: u64) -> Result<Self, ConfigError> {
        settings.validate()?;
        let seeds = SubSeeds::from_run_seed(seed);

        let wind = WindState::new(&settings.wind, seeds.wind)?;
        let beam = BeamController::new(settings.beam.clone())?;
        let weather = Weather::new(settings.weather.clone(), seeds.weather)?;
        let miasma = MiasmaGrid::new(settings.miasma.clone(), seeds.miasma)?;

        log::info!("World created (seed {seed})");
        Ok(Self {
            seed,
            time: 0.0,
            frame: 0,
            player: settings.miasma.spawn,
            settings,
            wind,
            beam,
            weather,
            miasma,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read-only view of the fog grid for damage, collision and rendering
    pub fn miasma(&self) -> &MiasmaGrid {
        &self.miasma
    }

    pub fn wind(&self) -> &WindState {
        &self.wind
    }

    /// Wind access for hosts that steer it manually
    pub fn wind_mut(&mut self) -> &mut WindState {
        &mut self.wind
    }

    pub fn beam(&self) -> &BeamController {
        &self.beam
    }

    pub fn weather(&self) -> &Weather {
        &self.weather
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_seeds_are_distinct_and_stable() {
        let a = SubSeeds::from_run_seed(7);
        assert_eq!(a, SubSeeds::from_run_seed(7));
        assert_ne!(a.wind, a.miasma);
        assert_ne!(a, SubSeeds::from_run_seed(8));
    }

    #[test]
    fn test_world_rejects_invalid_settings() {
        let mut settings = Settings::default();
        settings.miasma.rows = -1;
        assert!(World::new(settings, 1).is_err());
    }

    #[test]
    fn test_player_starts_in_safe_zone() {
        let mut settings = Settings::default();
        settings.miasma.cols = 80;
        settings.miasma.rows = 80;
        let world = World::new(settings, 3).unwrap();
        assert_eq!(world.player, Vec2::ZERO);
        assert!(!world.miasma().disc_touches_fog(world.player, world.settings().player.radius));
    }
}

//! Per-frame update
//!
//! Order each frame: wind → weather → beam geometry → drift → beam clearing →
//! regrowth ticks → fog damage check. Drift and clearing run every frame;
//! regrowth drains its own fixed-rate accumulator.

use glam::Vec2;

use super::beam::BeamMode;
use super::state::World;
use crate::consts::MAX_FRAME_DT;

/// Input for a single frame
#[derive(Debug, Clone)]
pub struct FrameInput {
    /// Player world position (the beam origin)
    pub player_pos: Vec2,
    /// World position the player aims at
    pub aim_target: Vec2,
    /// Scroll wheel delta this frame; only the sign matters
    pub scroll: f32,
    /// Run fog drift, clearing, regrowth and damage (debug toggle)
    pub miasma_enabled: bool,
    /// Freeze the simulation
    pub paused: bool,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            player_pos: Vec2::ZERO,
            aim_target: Vec2::X,
            scroll: 0.0,
            miasma_enabled: true,
            paused: false,
        }
    }
}

/// What happened during a frame, for the host game layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub beam_mode: Option<BeamMode>,
    pub tiles_cleared: usize,
    pub drift_shifts: u32,
    pub regrow_ticks: u32,
    /// Laser energy ran out this frame
    pub laser_cut: bool,
    /// Player disc touches fog
    pub in_fog: bool,
    /// Fog damage to apply to the player this frame
    pub damage: f32,
}

/// Advance the world by one rendered frame
pub fn tick(world: &mut World, input: &FrameInput, dt: f32) -> FrameReport {
    if input.paused || dt <= 0.0 {
        return FrameReport::default();
    }
    let dt = dt.min(MAX_FRAME_DT);

    world.time += dt;
    world.frame += 1;
    world.player = input.player_pos;

    let mut report = FrameReport::default();

    // Wind and weather
    world.wind.update(dt, &world.settings.wind);
    world.weather.update(dt);

    // Beam geometry from scroll + aim
    if input.scroll != 0.0 {
        world.beam.on_scroll(input.scroll);
    }
    world.beam.update(input.player_pos, input.aim_target);
    report.laser_cut = world.beam.update_energy(dt);
    report.beam_mode = Some(world.beam.state().mode());

    if !input.miasma_enabled {
        return report;
    }

    // Fog: drift, clear, regrow
    let now = world.time;
    report.drift_shifts = world.miasma.advance(world.wind.vector(), dt);
    report.tiles_cleared = world.miasma.clear_with_beam(world.beam.state(), now);
    report.regrow_ticks = world
        .miasma
        .regrow(now, dt, world.weather.target_coverage());

    // Damage
    report.in_fog = world
        .miasma
        .disc_touches_fog(input.player_pos, world.settings.player.radius);
    if report.in_fog {
        report.damage = world.miasma.params().fog_dps * dt;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::grid::FillPolicy;

    fn small_settings() -> Settings {
        let mut settings = Settings::default();
        settings.miasma.cols = 120;
        settings.miasma.rows = 120;
        settings.miasma.fill = FillPolicy::Random { fog_chance: 0.8 };
        settings.miasma.edge_jitter = 0.1;
        settings
    }

    fn sweep_input(frame: u32) -> FrameInput {
        let t = frame as f32 * 0.05;
        FrameInput {
            player_pos: Vec2::new(t.cos() * 40.0, t.sin() * 40.0),
            aim_target: Vec2::new((t * 1.7).cos(), (t * 1.7).sin()) * 200.0,
            scroll: if frame % 30 == 0 { 1.0 } else { 0.0 },
            ..Default::default()
        }
    }

    #[test]
    fn test_determinism() {
        // Two worlds with the same seed and inputs end identical
        let mut a = World::new(small_settings(), 99_999).unwrap();
        let mut b = World::new(small_settings(), 99_999).unwrap();
        for frame in 0..600 {
            let input = sweep_input(frame);
            let ra = tick(&mut a, &input, 1.0 / 60.0);
            let rb = tick(&mut b, &input, 1.0 / 60.0);
            assert_eq!(ra, rb);
        }
        assert_eq!(a.miasma.fog, b.miasma.fog);
        assert_eq!(a.miasma.last_cleared, b.miasma.last_cleared);
        assert_eq!(a.wind.direction, b.wind.direction);
        a.miasma.assert_counts_consistent();
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut world = World::new(small_settings(), 1).unwrap();
        let fog_before = world.miasma.fog.clone();
        let input = FrameInput {
            paused: true,
            ..Default::default()
        };
        let report = tick(&mut world, &input, 1.0 / 60.0);
        assert_eq!(report, FrameReport::default());
        assert_eq!(world.time, 0.0);
        assert_eq!(world.miasma.fog, fog_before);
    }

    #[test]
    fn test_beam_clears_ahead_of_player() {
        let mut settings = small_settings();
        settings.miasma.fill = FillPolicy::Solid;
        settings.miasma.drift_enabled = false;
        settings.miasma.regrow_enabled = false;
        let mut world = World::new(settings, 4).unwrap();

        // Default start control (0.42) is the widest bubble; one notch up is a cone
        let input = FrameInput {
            aim_target: Vec2::new(200.0, 0.0),
            scroll: 1.0,
            ..Default::default()
        };
        let report = tick(&mut world, &input, 1.0 / 60.0);
        assert_eq!(report.beam_mode, Some(BeamMode::Cone));
        assert!(report.tiles_cleared > 0);
        assert!(!world.miasma().is_fog_at(Vec2::new(150.0, 2.0)));
        assert!(world.miasma().is_fog_at(Vec2::new(-150.0, 2.0)));
    }

    #[test]
    fn test_damage_only_in_fog() {
        let mut settings = small_settings();
        settings.miasma.fill = FillPolicy::Solid;
        settings.miasma.drift_enabled = false;
        settings.beam.start_control = 0.0;
        let mut world = World::new(settings, 2).unwrap();

        let safe = tick(&mut world, &FrameInput::default(), 0.1);
        assert!(!safe.in_fog);
        assert_eq!(safe.damage, 0.0);

        let exposed = FrameInput {
            player_pos: Vec2::new(250.0, 250.0),
            ..Default::default()
        };
        let report = tick(&mut world, &exposed, 0.1);
        assert!(report.in_fog);
        assert!((report.damage - 3.5).abs() < 1e-4);

        // Off the map is hazardous too
        let off_map = FrameInput {
            player_pos: Vec2::new(10_000.0, 0.0),
            ..Default::default()
        };
        assert!(tick(&mut world, &off_map, 0.1).in_fog);
    }

    #[test]
    fn test_miasma_toggle_skips_fog() {
        let mut world = World::new(small_settings(), 5).unwrap();
        let fog_before = world.miasma.fog.clone();
        let input = FrameInput {
            miasma_enabled: false,
            player_pos: Vec2::new(250.0, 250.0),
            ..Default::default()
        };
        let report = tick(&mut world, &input, 0.2);
        assert!(!report.in_fog);
        assert_eq!(report.tiles_cleared, 0);
        assert_eq!(world.miasma.fog, fog_before);
        assert!(world.time > 0.0);
    }

    #[test]
    fn test_extreme_settings_keep_frames_bounded() {
        let mut settings = small_settings();
        settings.wind.min_speed = 1.0e9;
        settings.wind.max_speed = 1.0e9;
        settings.miasma.tick_hz = 1.0e6;
        settings.beam.laser_range = 1.0e12;
        settings.beam.start_control = 0.95;
        let mut world = World::new(settings, 8).unwrap();

        for _ in 0..3 {
            let report = tick(&mut world, &FrameInput::default(), 1.0 / 60.0);
            assert_eq!(report.beam_mode, Some(BeamMode::Laser));
            assert!(report.drift_shifts > 0);
            assert_eq!(report.regrow_ticks, crate::consts::MAX_REGROW_TICKS);
        }
        world.miasma.assert_counts_consistent();
    }

    #[test]
    fn test_frame_hitch_is_clamped() {
        let mut world = World::new(small_settings(), 6).unwrap();
        let report = tick(&mut world, &FrameInput::default(), 10.0);
        assert!((world.time - MAX_FRAME_DT).abs() < 1e-6);
        // 0.25 s at 8 Hz
        assert_eq!(report.regrow_ticks, 2);
    }
}

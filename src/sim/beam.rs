//! Beam geometry state machine
//!
//! A single control scalar in [0, 1] (driven by the scroll wheel) selects one of
//! four beam regimes:
//!
//! ```text
//! 0 ---- t_no_beam_end ---- t_bubble_end ---- t_cone_end ---- 1
//!   None        |    Bubble      |      Cone       |   Laser
//! ```
//!
//! Inside the bubble and cone bands the shape is interpolated continuously, so
//! moving the wheel never snaps between shapes. Bands are closed on the right:
//! a control value exactly on a breakpoint belongs to the lower band.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{LASER_CUTOFF_MARGIN, MAX_LASER_FAN};
use crate::error::{ConfigError, check_ordered, check_positive, check_probability, check_rate};
use crate::{inverse_lerp, lerp, polar_to_cartesian};

/// Laser energy pool tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserEnergyParams {
    /// When false the laser never drains and never cuts out
    pub enabled: bool,
    /// Pool capacity
    pub max: f32,
    /// Energy per second spent while the beam is in laser mode
    pub drain_rate: f32,
    /// Energy per second regained in any other mode
    pub recharge_rate: f32,
}

impl Default for LaserEnergyParams {
    fn default() -> Self {
        Self {
            enabled: true,
            max: 100.0,
            drain_rate: 20.0,
            recharge_rate: 10.0,
        }
    }
}

/// Static beam shape parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamParams {
    /// Control value at the start of a run
    pub start_control: f32,
    /// Control change per wheel notch
    pub wheel_step: f32,

    // Band breakpoints
    pub t_no_beam_end: f32,
    pub t_bubble_end: f32,
    pub t_cone_end: f32,

    // Bubble radius range (world units)
    pub bubble_r_min: f32,
    pub bubble_r_max: f32,

    // Cone/laser angular half-widths (degrees)
    pub cone_half_arc_wide_deg: f32,
    pub cone_half_arc_narrow_deg: f32,
    pub laser_min_half_arc_deg: f32,

    // Reach (world units)
    pub base_range: f32,
    pub bump_range: f32,
    pub laser_range: f32,

    /// Width of the bright laser core line
    pub laser_core_width: f32,
    /// Halo width as a multiple of the core width
    pub laser_outline_mult: f32,

    pub energy: LaserEnergyParams,
}

impl Default for BeamParams {
    fn default() -> Self {
        Self {
            start_control: 0.42,
            wheel_step: 0.05,
            t_no_beam_end: 0.08,
            t_bubble_end: 0.42,
            t_cone_end: 0.88,
            bubble_r_min: 16.0,
            bubble_r_max: 90.0,
            cone_half_arc_wide_deg: 60.0,
            cone_half_arc_narrow_deg: 1.6,
            laser_min_half_arc_deg: 0.22,
            base_range: 150.0,
            bump_range: 20.0,
            laser_range: 240.0,
            laser_core_width: 8.0,
            laser_outline_mult: 2.0,
            energy: LaserEnergyParams::default(),
        }
    }
}

impl BeamParams {
    /// Check ordering and sign constraints. The cone must narrow and lengthen
    /// monotonically into the laser, so those pairs are checked as ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (t0, t1, t2) = (self.t_no_beam_end, self.t_bubble_end, self.t_cone_end);
        if !(0.0 <= t0 && t0 < t1 && t1 < t2 && t2 <= 1.0) {
            return Err(ConfigError::InvalidBreakpoints {
                no_beam: t0,
                bubble: t1,
                cone: t2,
            });
        }
        check_probability("start_control", self.start_control)?;
        check_positive("wheel_step", self.wheel_step)?;
        check_rate("bubble_r_min", self.bubble_r_min)?;
        check_ordered("bubble radius", self.bubble_r_min, self.bubble_r_max)?;
        check_rate("laser_min_half_arc_deg", self.laser_min_half_arc_deg)?;
        check_ordered(
            "laser/cone half arc",
            self.laser_min_half_arc_deg,
            self.cone_half_arc_narrow_deg,
        )?;
        check_ordered(
            "cone half arc",
            self.cone_half_arc_narrow_deg,
            self.cone_half_arc_wide_deg,
        )?;
        check_rate("base_range", self.base_range)?;
        check_rate("bump_range", self.bump_range)?;
        check_ordered(
            "cone range",
            self.base_range + self.bump_range,
            self.laser_range,
        )?;
        check_rate("laser_core_width", self.laser_core_width)?;
        check_rate("laser_outline_mult", self.laser_outline_mult)?;
        check_rate("energy.max", self.energy.max)?;
        check_rate("energy.drain_rate", self.energy.drain_rate)?;
        check_rate("energy.recharge_rate", self.energy.recharge_rate)?;
        Ok(())
    }

    /// Combined visual width of the laser (core plus halo)
    pub fn laser_visual_width(&self) -> f32 {
        self.laser_core_width + self.laser_core_width * self.laser_outline_mult
    }
}

/// Discriminant of the beam shape, ordered along the control axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BeamMode {
    None,
    Bubble,
    Cone,
    Laser,
}

/// Mode-specific beam extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BeamShape {
    /// Beam off, zero extent
    None,
    /// Omnidirectional circle around the origin
    Bubble { radius: f32 },
    /// Sector around the aim direction
    Cone { half_arc: f32, range: f32 },
    /// Thin ray along the aim direction; `visual_width` is core + halo
    Laser {
        half_arc: f32,
        range: f32,
        visual_width: f32,
    },
}

/// Derived beam geometry for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamState {
    /// Scroll-driven control value in [0, 1]
    pub control: f32,
    /// World-space origin (the player position)
    pub origin: Vec2,
    /// Aim direction (radians)
    pub angle: f32,
    pub shape: BeamShape,
}

impl BeamState {
    /// An inactive beam at the world origin
    pub fn off(control: f32) -> Self {
        Self {
            control: control.clamp(0.0, 1.0),
            origin: Vec2::ZERO,
            angle: 0.0,
            shape: BeamShape::None,
        }
    }

    pub fn mode(&self) -> BeamMode {
        match self.shape {
            BeamShape::None => BeamMode::None,
            BeamShape::Bubble { .. } => BeamMode::Bubble,
            BeamShape::Cone { .. } => BeamMode::Cone,
            BeamShape::Laser { .. } => BeamMode::Laser,
        }
    }

    /// Bubble radius (zero for other modes)
    pub fn radius(&self) -> f32 {
        match self.shape {
            BeamShape::Bubble { radius } => radius,
            _ => 0.0,
        }
    }

    /// Angular half-width (zero for None and Bubble)
    pub fn half_arc(&self) -> f32 {
        match self.shape {
            BeamShape::Cone { half_arc, .. } | BeamShape::Laser { half_arc, .. } => half_arc,
            _ => 0.0,
        }
    }

    /// Directional reach (zero for None and Bubble)
    pub fn range(&self) -> f32 {
        match self.shape {
            BeamShape::Cone { range, .. } | BeamShape::Laser { range, .. } => range,
            _ => 0.0,
        }
    }

    /// Unit vector along the aim angle
    pub fn direction(&self) -> Vec2 {
        polar_to_cartesian(1.0, self.angle)
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.shape, BeamShape::None)
    }

    /// Apply one wheel notch. Only the sign of `delta_sign` matters; zero is ignored.
    pub fn on_scroll(&mut self, delta_sign: f32, step: f32) {
        if delta_sign == 0.0 || delta_sign.is_nan() {
            return;
        }
        self.control = (self.control + delta_sign.signum() * step).clamp(0.0, 1.0);
    }
}

/// Aim angle from `origin` toward `target`
#[inline]
pub fn aim_angle(origin: Vec2, target: Vec2) -> f32 {
    (target.y - origin.y).atan2(target.x - origin.x)
}

/// Map a control value and aim into beam geometry. Pure; call every frame.
pub fn derive_geometry(control: f32, aim_angle: f32, origin: Vec2, params: &BeamParams) -> BeamState {
    let control = control.clamp(0.0, 1.0);
    let (t0, t1, t2) = (params.t_no_beam_end, params.t_bubble_end, params.t_cone_end);

    let shape = if control <= t0 {
        BeamShape::None
    } else if control <= t1 {
        let u = inverse_lerp(control, t0, t1);
        BeamShape::Bubble {
            radius: lerp(params.bubble_r_min, params.bubble_r_max, u),
        }
    } else if control <= t2 {
        let u = inverse_lerp(control, t1, t2);
        BeamShape::Cone {
            half_arc: lerp(
                params.cone_half_arc_wide_deg,
                params.cone_half_arc_narrow_deg,
                u,
            )
            .to_radians(),
            range: lerp(params.base_range + params.bump_range, params.laser_range, u),
        }
    } else {
        BeamShape::Laser {
            half_arc: params.laser_min_half_arc_deg.to_radians(),
            range: params.laser_range,
            visual_width: params.laser_visual_width(),
        }
    };

    BeamState {
        control,
        origin,
        angle: aim_angle,
        shape,
    }
}

/// Owns the control value and laser energy, re-deriving geometry each frame.
#[derive(Debug, Clone)]
pub struct BeamController {
    params: BeamParams,
    state: BeamState,
    energy: f32,
}

impl BeamController {
    pub fn new(params: BeamParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let state = derive_geometry(params.start_control, 0.0, Vec2::ZERO, &params);
        let energy = params.energy.max;
        Ok(Self {
            params,
            state,
            energy,
        })
    }

    pub fn params(&self) -> &BeamParams {
        &self.params
    }

    /// Geometry derived by the last `update`
    pub fn state(&self) -> &BeamState {
        &self.state
    }

    pub fn control(&self) -> f32 {
        self.state.control
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    /// Energy as a fraction of capacity (1.0 when the pool has no capacity)
    pub fn energy_fraction(&self) -> f32 {
        if self.params.energy.max > 0.0 {
            self.energy / self.params.energy.max
        } else {
            1.0
        }
    }

    /// One wheel notch in the direction of `delta_sign`
    pub fn on_scroll(&mut self, delta_sign: f32) {
        let step = self.params.wheel_step;
        self.state.on_scroll(delta_sign, step);
    }

    /// Re-derive geometry for the current control, origin and aim target.
    pub fn update(&mut self, origin: Vec2, aim_target: Vec2) -> &BeamState {
        let angle = aim_angle(origin, aim_target);
        self.state = derive_geometry(self.state.control, angle, origin, &self.params);
        &self.state
    }

    /// Drain or recharge the laser pool. Returns true when the pool ran dry this
    /// frame and the beam was forced back into a narrow cone.
    pub fn update_energy(&mut self, dt: f32) -> bool {
        let energy = &self.params.energy;
        if !energy.enabled {
            return false;
        }

        if self.state.mode() == BeamMode::Laser {
            self.energy -= energy.drain_rate * dt;
            if self.energy <= 0.0 {
                self.energy = 0.0;
                let control = self.params.t_cone_end - LASER_CUTOFF_MARGIN;
                self.state = derive_geometry(control, self.state.angle, self.state.origin, &self.params);
                log::debug!("Laser energy depleted, falling back to cone");
                return true;
            }
        } else {
            self.energy = (self.energy + energy.recharge_rate * dt).min(energy.max);
        }
        false
    }
}

/// Angular spacing and count of the laser ray fan
pub(crate) fn laser_fan(half_arc: f32, fan_count: u32, fan_min_deg: f32) -> (u32, f32) {
    let count = fan_count.clamp(1, MAX_LASER_FAN);
    let spacing = fan_min_deg.to_radians().max(half_arc * 0.5);
    (count, spacing)
}

//! Beam clearing
//!
//! Runs every frame so clearing feels instant under the cursor. Each shape only
//! scans the clamped bounding box of its candidates, so cost scales with beam
//! size rather than world size. Tests run on tile centres.

use glam::Vec2;

use super::beam::{BeamShape, BeamState, laser_fan};
use super::grid::MiasmaGrid;
use crate::polar_to_cartesian;

impl MiasmaGrid {
    /// Clear every fogged tile covered by the beam. Returns the number of tiles
    /// that transitioned to clear. Repeating the call with the same inputs
    /// changes nothing further.
    pub fn clear_with_beam(&mut self, beam: &BeamState, now: f32) -> usize {
        match beam.shape {
            BeamShape::None => 0,
            BeamShape::Bubble { radius } => self.clear_disc(beam.origin, radius, now),
            BeamShape::Cone { half_arc, range } => {
                self.clear_sector(beam.origin, beam.angle, half_arc, range, now)
            }
            BeamShape::Laser {
                half_arc,
                range,
                visual_width,
            } => {
                let thickness = self.laser_thickness(visual_width);
                let (count, spacing) =
                    laser_fan(half_arc, self.params.laser_fan_count, self.params.laser_fan_min_deg);
                let start = beam.angle - spacing * (count - 1) as f32 * 0.5;
                (0..count)
                    .map(|k| {
                        let angle = start + k as f32 * spacing;
                        self.stamp_ray(beam.origin, angle, range, thickness, now)
                    })
                    .sum()
            }
        }
    }

    /// Laser stamp width: never thinner than the configured tile minimum
    pub fn laser_thickness(&self, visual_width: f32) -> f32 {
        (self.params.laser_min_thickness_tiles * self.tile).max(visual_width)
    }

    /// Tiles whose centre lies within `radius` of `center`
    fn clear_disc(&mut self, center: Vec2, radius: f32, now: f32) -> usize {
        let (x0, x1) = self.slot_span_x(center.x - radius, center.x + radius);
        let (y0, y1) = self.slot_span_y(center.y - radius, center.y + radius);
        let r2 = radius * radius;
        let mut cleared = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                if self.slot_center(x, y).distance_squared(center) <= r2
                    && self.set_cleared(y * self.cols + x, now)
                {
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Tiles within `range` whose direction from the origin is within
    /// `half_arc` of `angle`, tested as `dot(dir, beam_dir) >= cos(half_arc)`
    fn clear_sector(&mut self, origin: Vec2, angle: f32, half_arc: f32, range: f32, now: f32) -> usize {
        let (x0, x1) = self.slot_span_x(origin.x - range, origin.x + range);
        let (y0, y1) = self.slot_span_y(origin.y - range, origin.y + range);
        let beam_dir = polar_to_cartesian(1.0, angle);
        let cos_thresh = half_arc.cos();
        let r2 = range * range;
        let mut cleared = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                let d = self.slot_center(x, y) - origin;
                let d2 = d.length_squared();
                if d2 > r2 {
                    continue;
                }
                // The tile under the emitter is always inside the sector
                let inside = d2 <= f32::EPSILON || (d / d2.sqrt()).dot(beam_dir) >= cos_thresh;
                if inside && self.set_cleared(y * self.cols + x, now) {
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// March a thick ray from `origin` out to `range`, one sample per tile,
    /// clearing tiles within `thickness / 2` of each sample. Only samples whose
    /// stamp can reach the grid are visited.
    fn stamp_ray(&mut self, origin: Vec2, angle: f32, range: f32, thickness: f32, now: f32) -> usize {
        let dir = polar_to_cartesian(1.0, angle);
        let half = thickness * 0.5;
        let Some((near, far)) = self.ray_span(origin, dir, range, half) else {
            return 0;
        };

        let step = self.tile;
        let first = (near / step).ceil() as usize;
        let last = (far / step).floor() as usize;
        let mut cleared = 0;
        for s in first..=last {
            let p = origin + dir * (s as f32 * step);
            cleared += self.clear_disc(p, half, now);
        }
        cleared
    }

    /// Distances along the ray, clipped to `0..=range`, that lie within the
    /// world bounds grown by `pad`. `None` when the ray misses the grid.
    fn ray_span(&self, origin: Vec2, dir: Vec2, range: f32, pad: f32) -> Option<(f32, f32)> {
        if !(origin.is_finite() && range >= 0.0) {
            return None;
        }
        let (min, max) = self.world_bounds();
        let (min, max) = (min - Vec2::splat(pad), max + Vec2::splat(pad));

        let mut near = 0.0f32;
        let mut far = range;
        for axis in 0..2 {
            let (o, d) = (origin[axis], dir[axis]);
            if d.abs() <= f32::EPSILON {
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }
            let (a, b) = ((min[axis] - o) / d, (max[axis] - o) / d);
            near = near.max(a.min(b));
            far = far.min(a.max(b));
        }
        (near <= far).then_some((near, far))
    }
}

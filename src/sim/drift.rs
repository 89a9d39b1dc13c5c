//! Wind-driven drift of the miasma grid
//!
//! Wind displacement accumulates in world units. Whenever an axis accumulator
//! holds whole tiles, the field shifts by that many tiles in one pass: content
//! leaving the grid is discarded and the entering edge is spawned from the
//! fill policy. `fog` and `last_cleared` move together so regrowth cooldowns
//! travel with the fog they belong to.

use glam::Vec2;
use rand::Rng;

use super::grid::MiasmaGrid;
use crate::consts::NEVER_CLEARED;

/// Grid axis being shifted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl MiasmaGrid {
    /// Accumulate drift from a wind velocity over `dt` and apply any whole-tile
    /// shifts now due. Returns the number of shifts performed.
    pub fn advance(&mut self, wind: Vec2, dt: f32) -> u32 {
        if !self.params.drift_enabled || dt <= 0.0 || !wind.is_finite() {
            return 0;
        }
        self.drift_acc += wind * dt;

        let shifts = self
            .drain_axis(Axis::X)
            .saturating_add(self.drain_axis(Axis::Y));

        if shifts > 0 {
            self.recount_chunks();
            log::trace!("Miasma drifted {} tiles, offset now {}", shifts, self.content_offset);
        }
        shifts
    }

    /// Sub-tile drift not yet applied (world units). Renderers may offset fog by
    /// this for smooth motion; queries never do.
    pub fn drift_remainder(&self) -> Vec2 {
        self.drift_acc
    }

    /// Apply every whole-tile shift pending on one axis in a single pass.
    /// The accumulator keeps only its sub-tile remainder.
    fn drain_axis(&mut self, axis: Axis) -> u32 {
        let acc = match axis {
            Axis::X => &mut self.drift_acc.x,
            Axis::Y => &mut self.drift_acc.y,
        };
        if !acc.is_finite() {
            *acc = 0.0;
            return 0;
        }
        let tiles = (*acc / self.tile).trunc();
        if tiles == 0.0 {
            return 0;
        }
        *acc %= self.tile;

        let dir = tiles.signum() as i32;
        let count = tiles.abs();
        let len = match axis {
            Axis::X => self.cols,
            Axis::Y => self.rows,
        };
        if count >= len as f32 {
            // Everything on this axis left the grid; respawn it once
            self.shift(axis, dir, len, tiles as i32);
        } else {
            self.shift(axis, dir, count as usize, tiles as i32);
        }
        count as u32
    }

    /// Move all content `lines` tiles along `axis` in direction `dir` (+1 or -1)
    /// and spawn the lines that entered. `offset` is the content displacement
    /// recorded for the fill pattern, which may exceed `lines` when the whole
    /// axis was replaced.
    fn shift(&mut self, axis: Axis, dir: i32, lines: usize, offset: i32) {
        let (cols, rows) = (self.cols, self.rows);
        match axis {
            Axis::X => {
                self.content_offset.x = self.content_offset.x.wrapping_add(offset);
                for y in 0..rows {
                    let row = y * cols..(y + 1) * cols;
                    shift_slice(&mut self.fog[row.clone()], lines, dir);
                    shift_slice(&mut self.last_cleared[row], lines, dir);
                }
            }
            Axis::Y => {
                self.content_offset.y = self.content_offset.y.wrapping_add(offset);
                shift_slice(&mut self.fog, lines * cols, dir);
                shift_slice(&mut self.last_cleared, lines * cols, dir);
            }
        }

        // Innermost line first, matching the order single shifts would spawn them
        let len = match axis {
            Axis::X => cols,
            Axis::Y => rows,
        };
        for k in (0..lines).rev() {
            let line = if dir > 0 { k } else { len - 1 - k };
            self.spawn_line(axis, line);
        }
    }

    /// Fill one entering line of tiles from the fill policy
    fn spawn_line(&mut self, axis: Axis, line: usize) {
        let jitter = self.params.edge_jitter;
        let base = self.base_fill_chance();
        let chance = if jitter > 0.0 {
            (base + self.rng.random_range(-jitter..=jitter)).clamp(0.0, 1.0)
        } else {
            base
        };

        let (cols, rows) = (self.cols, self.rows);
        match axis {
            Axis::X => {
                let gx = line as i32 - self.half_cols;
                for y in 0..rows {
                    let gy = y as i32 - self.half_rows;
                    let i = y * cols + line;
                    self.fog[i] = self.spawn_fog(gx, gy, chance);
                    self.last_cleared[i] = NEVER_CLEARED;
                }
            }
            Axis::Y => {
                let gy = line as i32 - self.half_rows;
                for x in 0..cols {
                    let gx = x as i32 - self.half_cols;
                    let i = line * cols + x;
                    self.fog[i] = self.spawn_fog(gx, gy, chance);
                    self.last_cleared[i] = NEVER_CLEARED;
                }
            }
        }
    }
}

/// Shift a slice by `stride` elements toward higher (`dir > 0`) or lower
/// indices. The vacated stride keeps stale values and is overwritten by the
/// caller; a stride covering the whole slice leaves it untouched.
fn shift_slice<T: Copy>(data: &mut [T], stride: usize, dir: i32) {
    let len = data.len();
    if stride >= len {
        return;
    }
    if dir > 0 {
        data.copy_within(0..len - stride, stride);
    } else {
        data.copy_within(stride..len, 0);
    }
}

//! Miasma grid: fog occupancy over a world-origin-centred tile field
//!
//! Tile `(gx, gy)` covers world `[gx * tile, (gx + 1) * tile)` on each axis with
//! `gx` in `[-cols/2, cols - cols/2)` (same for rows). Storage is row-major over
//! array slots `(gx + cols/2, gy + rows/2)`.
//!
//! The grid is the only writer of its arrays. Drift, regrowth and beam clearing
//! live in sibling modules as further `impl MiasmaGrid` blocks; everything here
//! is layout, initial fill and read-only queries.
//!
//! Anything outside the grid is fog. Off-map positions are never a safe zone.

use glam::{IVec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{CHUNK_TILES, NEVER_CLEARED, REGROW_TICK_HZ};
use crate::error::{ConfigError, check_positive, check_probability, check_rate};

/// How fresh fog is laid down, at run start and on edges entering during drift
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Every tile is fog
    Solid,
    /// Each tile is fog with probability `fog_chance`
    Random { fog_chance: f32 },
    /// Straight stripes of fog, `duty` fraction of each `period_tiles` band
    Bands {
        period_tiles: f32,
        duty: f32,
        angle_deg: f32,
    },
}

/// Grid tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MiasmaParams {
    pub cols: i32,
    pub rows: i32,
    /// Tile edge length (world units)
    pub tile: f32,
    pub fill: FillPolicy,
    /// Random fill chance jitter applied per entering edge (absolute, either way)
    pub edge_jitter: f32,

    /// Spawn point (world units); a safe disc is carved around it at init
    pub spawn: Vec2,
    pub safe_radius_tiles: f32,

    pub drift_enabled: bool,

    pub regrow_enabled: bool,
    /// Seconds a cleared tile stays immune to regrowth
    pub regrow_delay: f32,
    /// Per-neighbour infection chance per tick
    pub base_chance: f32,
    pub tick_hz: f32,

    // Laser sweep
    pub laser_min_thickness_tiles: f32,
    pub laser_fan_count: u32,
    pub laser_fan_min_deg: f32,

    /// Bookkeeping chunk edge (tiles)
    pub chunk_tiles: usize,

    /// Damage per second while the player touches fog
    pub fog_dps: f32,
}

impl Default for MiasmaParams {
    fn default() -> Self {
        Self {
            cols: 450,
            rows: 450,
            tile: 5.0,
            fill: FillPolicy::Solid,
            edge_jitter: 0.0,
            spawn: Vec2::ZERO,
            safe_radius_tiles: 12.0,
            drift_enabled: true,
            regrow_enabled: true,
            regrow_delay: 1.0,
            base_chance: 0.20,
            tick_hz: REGROW_TICK_HZ,
            laser_min_thickness_tiles: 2.0,
            laser_fan_count: 3,
            laser_fan_min_deg: 0.25,
            chunk_tiles: CHUNK_TILES,
            fog_dps: 35.0,
        }
    }
}

impl MiasmaParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cols <= 0 || self.rows <= 0 {
            return Err(ConfigError::InvalidDimensions {
                cols: self.cols as i64,
                rows: self.rows as i64,
            });
        }
        if !(self.tile.is_finite() && self.tile > 0.0) {
            return Err(ConfigError::InvalidTileSize(self.tile));
        }
        match self.fill {
            FillPolicy::Solid => {}
            FillPolicy::Random { fog_chance } => check_probability("fill.fog_chance", fog_chance)?,
            FillPolicy::Bands {
                period_tiles, duty, ..
            } => {
                check_positive("fill.period_tiles", period_tiles)?;
                check_probability("fill.duty", duty)?;
            }
        }
        check_rate("edge_jitter", self.edge_jitter)?;
        check_rate("safe_radius_tiles", self.safe_radius_tiles)?;
        check_rate("regrow_delay", self.regrow_delay)?;
        check_probability("base_chance", self.base_chance)?;
        check_positive("tick_hz", self.tick_hz)?;
        check_rate("laser_min_thickness_tiles", self.laser_min_thickness_tiles)?;
        check_rate("laser_fan_min_deg", self.laser_fan_min_deg)?;
        check_positive("chunk_tiles", self.chunk_tiles as f32)?;
        check_rate("fog_dps", self.fog_dps)?;
        Ok(())
    }
}

/// Array slot of an in-bounds tile. Out-of-bounds positions have no index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex(pub(crate) usize);

impl TileIndex {
    pub fn slot(self) -> usize {
        self.0
    }
}

/// The fog field
#[derive(Debug, Clone)]
pub struct MiasmaGrid {
    pub(crate) params: MiasmaParams,
    pub(crate) cols: usize,
    pub(crate) rows: usize,
    pub(crate) half_cols: i32,
    pub(crate) half_rows: i32,
    pub(crate) tile: f32,

    /// 1 = fog, 0 = clear (front buffer)
    pub(crate) fog: Vec<u8>,
    /// Regrowth back buffer, swapped with `fog` each tick
    pub(crate) fog_next: Vec<u8>,
    pub(crate) last_cleared: Vec<f32>,

    pub(crate) chunk_size: usize,
    pub(crate) chunk_cols: usize,
    pub(crate) chunk_fog: Vec<u32>,
    pub(crate) fog_count: usize,

    /// Sub-tile drift carried between frames (world units)
    pub(crate) drift_acc: Vec2,
    /// Net whole-tile shifts so far; anchors band patterns to the moving fog
    pub(crate) content_offset: IVec2,
    pub(crate) regrow_accum: f32,

    pub(crate) rng: Pcg32,
}

impl MiasmaGrid {
    /// Allocate the grid, apply the fill policy and carve the spawn safe zone.
    pub fn new(params: MiasmaParams, seed: u64) -> Result<Self, ConfigError> {
        params.validate()?;

        let cols = params.cols as usize;
        let rows = params.rows as usize;
        let size = cols * rows;
        let chunk_size = params.chunk_tiles;
        let chunk_cols = cols.div_ceil(chunk_size);
        let chunk_rows = rows.div_ceil(chunk_size);

        let mut grid = Self {
            cols,
            rows,
            half_cols: params.cols / 2,
            half_rows: params.rows / 2,
            tile: params.tile,
            fog: vec![0; size],
            fog_next: vec![0; size],
            last_cleared: vec![NEVER_CLEARED; size],
            chunk_size,
            chunk_cols,
            chunk_fog: vec![0; chunk_cols * chunk_rows],
            fog_count: 0,
            drift_acc: Vec2::ZERO,
            content_offset: IVec2::ZERO,
            regrow_accum: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            params,
        };

        for y in 0..rows {
            for x in 0..cols {
                let gx = x as i32 - grid.half_cols;
                let gy = y as i32 - grid.half_rows;
                let chance = grid.base_fill_chance();
                grid.fog[y * cols + x] = grid.spawn_fog(gx, gy, chance);
            }
        }
        grid.recount_chunks();
        let carved = grid.carve_safe_zone();

        log::info!(
            "Miasma grid {}x{} (tile {}) seeded {}, coverage {:.1}%, safe zone {} tiles",
            cols,
            rows,
            grid.tile,
            seed,
            grid.coverage() * 100.0,
            carved
        );
        Ok(grid)
    }

    pub fn params(&self) -> &MiasmaParams {
        &self.params
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile(&self) -> f32 {
        self.tile
    }

    /// Total tile count (fixed for the grid's lifetime)
    pub fn len(&self) -> usize {
        self.fog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fog.is_empty()
    }

    /// Number of fogged tiles
    pub fn fog_count(&self) -> usize {
        self.fog_count
    }

    /// Fogged fraction of the grid in [0, 1]
    pub fn coverage(&self) -> f32 {
        self.fog_count as f32 / self.fog.len() as f32
    }

    /// World-space rectangle covered by the grid (min, max)
    pub fn world_bounds(&self) -> (Vec2, Vec2) {
        let min = Vec2::new(
            -self.half_cols as f32 * self.tile,
            -self.half_rows as f32 * self.tile,
        );
        let size = Vec2::new(self.cols as f32, self.rows as f32) * self.tile;
        (min, min + size)
    }

    /// Tile containing a world position, None when off the grid
    pub fn world_to_tile(&self, world: Vec2) -> Option<TileIndex> {
        if !world.is_finite() {
            return None;
        }
        let gx = (world.x / self.tile).floor() as i64;
        let gy = (world.y / self.tile).floor() as i64;
        self.tile_at(gx, gy)
    }

    /// Index of tile `(gx, gy)` in centred tile coordinates
    pub fn tile_at(&self, gx: i64, gy: i64) -> Option<TileIndex> {
        let x = gx + self.half_cols as i64;
        let y = gy + self.half_rows as i64;
        if x < 0 || y < 0 || x >= self.cols as i64 || y >= self.rows as i64 {
            return None;
        }
        Some(TileIndex(y as usize * self.cols + x as usize))
    }

    /// Centred tile coordinates of an index
    pub fn tile_coords(&self, index: TileIndex) -> IVec2 {
        let x = (index.0 % self.cols) as i32;
        let y = (index.0 / self.cols) as i32;
        IVec2::new(x - self.half_cols, y - self.half_rows)
    }

    /// World-space centre of a tile
    pub fn tile_center(&self, index: TileIndex) -> Vec2 {
        let c = self.tile_coords(index);
        Vec2::new((c.x as f32 + 0.5) * self.tile, (c.y as f32 + 0.5) * self.tile)
    }

    /// Fog test by index; no index (off-map) is always fog
    pub fn is_fog(&self, index: Option<TileIndex>) -> bool {
        match index {
            Some(TileIndex(i)) => self.fog[i] == 1,
            None => true,
        }
    }

    pub fn is_fog_at(&self, world: Vec2) -> bool {
        self.is_fog(self.world_to_tile(world))
    }

    /// Game time the tile last turned clear (`NEVER_CLEARED` if it never did)
    pub fn last_cleared_at(&self, index: TileIndex) -> f32 {
        self.last_cleared[index.0]
    }

    /// Whether any point of a disc is in fog, sampled every half tile.
    /// Off-map samples count as fog.
    pub fn disc_touches_fog(&self, center: Vec2, radius: f32) -> bool {
        if radius <= 0.0 {
            return self.is_fog_at(center);
        }
        let step = self.tile * 0.5;
        let r2 = radius * radius;
        let mut dy = -radius;
        while dy <= radius {
            let mut dx = -radius;
            while dx <= radius {
                if dx * dx + dy * dy <= r2 && self.is_fog_at(center + Vec2::new(dx, dy)) {
                    return true;
                }
                dx += step;
            }
            dy += step;
        }
        false
    }

    /// Centres of fogged tiles overlapping a world-space viewport. Chunks with
    /// no fog are skipped without visiting their tiles.
    pub fn fog_tiles_in_view(&self, min: Vec2, max: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        let (x0, x1) = self.slot_span_x(min.x, max.x);
        let (y0, y1) = self.slot_span_y(min.y, max.y);
        let cs = self.chunk_size;
        let chunk_span = |a: usize, b: usize| if a < b { (a / cs)..((b - 1) / cs + 1) } else { 0..0 };
        let chunk_xs = chunk_span(x0, x1);
        let chunk_ys = chunk_span(y0, y1);

        chunk_ys
            .flat_map(move |cy| chunk_xs.clone().map(move |cx| (cx, cy)))
            .filter(move |&(cx, cy)| self.chunk_fog[cy * self.chunk_cols + cx] > 0)
            .flat_map(move |(cx, cy)| {
                let xs = (cx * cs).max(x0)..((cx + 1) * cs).min(x1);
                let ys = (cy * cs).max(y0)..((cy + 1) * cs).min(y1);
                ys.flat_map(move |y| xs.clone().map(move |x| (x, y)))
            })
            .filter(move |&(x, y)| self.fog[y * self.cols + x] == 1)
            .map(move |(x, y)| self.tile_center(TileIndex(y * self.cols + x)))
    }

    // ---- internals shared by drift / regrow / clear ----

    /// Clamped slot span `[start, end)` of columns overlapping `[lo, hi]` world x
    pub(crate) fn slot_span_x(&self, lo: f32, hi: f32) -> (usize, usize) {
        axis_span(lo, hi, self.tile, self.half_cols, self.cols)
    }

    pub(crate) fn slot_span_y(&self, lo: f32, hi: f32) -> (usize, usize) {
        axis_span(lo, hi, self.tile, self.half_rows, self.rows)
    }

    /// World centre of array slot `(x, y)`
    #[inline]
    pub(crate) fn slot_center(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(
            (x as i32 - self.half_cols) as f32 * self.tile + self.tile * 0.5,
            (y as i32 - self.half_rows) as f32 * self.tile + self.tile * 0.5,
        )
    }

    #[inline]
    pub(crate) fn chunk_of(&self, i: usize) -> usize {
        let x = i % self.cols;
        let y = i / self.cols;
        (y / self.chunk_size) * self.chunk_cols + x / self.chunk_size
    }

    /// Clear a fogged tile; already clear tiles keep their timestamp.
    /// Returns true on a fog-to-clear transition.
    #[inline]
    pub(crate) fn set_cleared(&mut self, i: usize, now: f32) -> bool {
        if self.fog[i] == 0 {
            return false;
        }
        self.fog[i] = 0;
        self.last_cleared[i] = now;
        let c = self.chunk_of(i);
        self.chunk_fog[c] -= 1;
        self.fog_count -= 1;
        true
    }

    /// Rebuild chunk counts and the global fog count from the fog array
    pub(crate) fn recount_chunks(&mut self) {
        self.chunk_fog.iter_mut().for_each(|c| *c = 0);
        let mut total = 0;
        for i in 0..self.fog.len() {
            if self.fog[i] == 1 {
                let c = self.chunk_of(i);
                self.chunk_fog[c] += 1;
                total += 1;
            }
        }
        self.fog_count = total;
    }

    /// Fill chance before any per-edge jitter
    pub(crate) fn base_fill_chance(&self) -> f32 {
        match self.params.fill {
            FillPolicy::Random { fog_chance } => fog_chance,
            _ => 1.0,
        }
    }

    /// Content for a freshly spawned tile at centred coords `(gx, gy)`.
    /// `chance` is only consulted by the random policy.
    pub(crate) fn spawn_fog(&mut self, gx: i32, gy: i32, chance: f32) -> u8 {
        match self.params.fill {
            FillPolicy::Solid => 1,
            FillPolicy::Random { .. } => u8::from(self.rng.random::<f32>() < chance),
            FillPolicy::Bands {
                period_tiles,
                duty,
                angle_deg,
            } => {
                // Pattern coordinates travel with the drifting content
                let cx = gx.wrapping_sub(self.content_offset.x) as f32;
                let cy = gy.wrapping_sub(self.content_offset.y) as f32;
                let (sin, cos) = angle_deg.to_radians().sin_cos();
                let phase = ((cx * cos + cy * sin) / period_tiles).rem_euclid(1.0);
                u8::from(phase < duty)
            }
        }
    }

    /// Clear a disc around the spawn point so the run never starts in fog
    fn carve_safe_zone(&mut self) -> usize {
        let radius = self.params.safe_radius_tiles * self.tile;
        let spawn = self.params.spawn;
        let (x0, x1) = self.slot_span_x(spawn.x - radius, spawn.x + radius);
        let (y0, y1) = self.slot_span_y(spawn.y - radius, spawn.y + radius);
        let r2 = radius * radius;
        let mut carved = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                if self.slot_center(x, y).distance_squared(spawn) <= r2
                    && self.set_cleared(y * self.cols + x, 0.0)
                {
                    carved += 1;
                }
            }
        }
        carved
    }

    /// Test-only direct write that keeps the bookkeeping consistent
    #[cfg(test)]
    pub(crate) fn set_tile(&mut self, gx: i64, gy: i64, fog: bool, last_cleared: f32) {
        let i = self.tile_at(gx, gy).expect("tile in bounds").0;
        self.fog[i] = u8::from(fog);
        self.last_cleared[i] = last_cleared;
        self.recount_chunks();
    }

    /// Test-only check that cached counts match the fog array
    #[cfg(test)]
    pub(crate) fn assert_counts_consistent(&self) {
        let mut expected = vec![0u32; self.chunk_fog.len()];
        for (i, &f) in self.fog.iter().enumerate() {
            if f == 1 {
                expected[self.chunk_of(i)] += 1;
            }
        }
        assert_eq!(expected, self.chunk_fog, "chunk fog counts drifted");
        assert_eq!(
            expected.iter().map(|&c| c as usize).sum::<usize>(),
            self.fog_count
        );
    }
}

/// Clamped slot span covering world interval `[lo, hi]` on one axis
fn axis_span(lo: f32, hi: f32, tile: f32, half: i32, len: usize) -> (usize, usize) {
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return (0, 0);
    }
    let start = (lo / tile).floor() as i64 + half as i64;
    let end = (hi / tile).floor() as i64 + half as i64 + 1;
    let start = start.clamp(0, len as i64) as usize;
    let end = end.clamp(0, len as i64) as usize;
    if start < end { (start, end) } else { (0, 0) }
}

/// Solid grid without a safe zone, small chunks so chunk edges get exercised
#[cfg(test)]
pub(crate) fn small_params(cols: i32, rows: i32, tile: f32) -> MiasmaParams {
    MiasmaParams {
        cols,
        rows,
        tile,
        safe_radius_tiles: 0.0,
        spawn: Vec2::new(1.0e6, 1.0e6),
        chunk_tiles: 4,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(cols: i32, rows: i32, tile: f32) -> MiasmaParams {
        small_params(cols, rows, tile)
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let err = MiasmaGrid::new(small(0, 10, 10.0), 1).unwrap_err();
        assert_eq!(err, ConfigError::InvalidDimensions { cols: 0, rows: 10 });
        assert!(MiasmaGrid::new(small(10, -3, 10.0), 1).is_err());
        assert!(matches!(
            MiasmaGrid::new(small(10, 10, 0.0), 1),
            Err(ConfigError::InvalidTileSize(_))
        ));
        let negative_rate = MiasmaParams {
            regrow_delay: -1.0,
            ..small(10, 10, 10.0)
        };
        assert!(MiasmaGrid::new(negative_rate, 1).is_err());
    }

    #[test]
    fn test_index_mapping_is_centred() {
        let grid = MiasmaGrid::new(small(10, 10, 10.0), 1).unwrap();
        let origin = grid.world_to_tile(Vec2::new(0.5, 0.5)).unwrap();
        assert_eq!(grid.tile_coords(origin), IVec2::ZERO);
        assert_eq!(grid.tile_center(origin), Vec2::new(5.0, 5.0));

        let corner = grid.world_to_tile(Vec2::new(-50.0, -50.0)).unwrap();
        assert_eq!(corner.slot(), 0);
        assert!(grid.world_to_tile(Vec2::new(50.0, 0.0)).is_none());
        assert!(grid.world_to_tile(Vec2::new(-50.1, 0.0)).is_none());
        assert_eq!(grid.world_bounds(), (Vec2::splat(-50.0), Vec2::splat(50.0)));
    }

    #[test]
    fn test_every_tile_has_one_slot() {
        let grid = MiasmaGrid::new(small(7, 5, 3.0), 1).unwrap();
        let mut seen = vec![false; grid.len()];
        for gy in -2..3 {
            for gx in -3..4 {
                let i = grid.tile_at(gx, gy).unwrap().slot();
                assert!(!seen[i]);
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_out_of_bounds_is_fog() {
        let mut grid = MiasmaGrid::new(small(4, 4, 10.0), 1).unwrap();
        for gy in -2..2 {
            for gx in -2..2 {
                grid.set_tile(gx, gy, false, 0.0);
            }
        }
        assert_eq!(grid.fog_count(), 0);
        assert!(!grid.is_fog_at(Vec2::new(1.0, 1.0)));
        assert!(grid.is_fog(None));
        assert!(grid.is_fog_at(Vec2::new(100.0, 0.0)));
        assert!(grid.is_fog_at(Vec2::new(0.0, -20.01)));
        assert!(grid.is_fog_at(Vec2::new(f32::NAN, 0.0)));
        assert!(grid.disc_touches_fog(Vec2::new(15.0, 0.0), 8.0));
        assert!(!grid.disc_touches_fog(Vec2::ZERO, 8.0));
    }

    #[test]
    fn test_safe_zone_carved_at_spawn() {
        let params = MiasmaParams {
            safe_radius_tiles: 3.0,
            spawn: Vec2::ZERO,
            ..small(20, 20, 10.0)
        };
        let grid = MiasmaGrid::new(params, 7).unwrap();
        assert!(!grid.is_fog_at(Vec2::new(5.0, 5.0)));
        assert!(!grid.disc_touches_fog(Vec2::ZERO, 15.0));
        assert!(grid.is_fog_at(Vec2::new(95.0, 95.0)));
        let spawn_tile = grid.world_to_tile(Vec2::ZERO).unwrap();
        assert_eq!(grid.last_cleared_at(spawn_tile), 0.0);
        grid.assert_counts_consistent();
    }

    #[test]
    fn test_random_fill_is_seeded() {
        let params = MiasmaParams {
            fill: FillPolicy::Random { fog_chance: 0.5 },
            ..small(32, 32, 4.0)
        };
        let a = MiasmaGrid::new(params.clone(), 11).unwrap();
        let b = MiasmaGrid::new(params, 11).unwrap();
        assert_eq!(a.fog, b.fog);
        assert!(a.coverage() > 0.35 && a.coverage() < 0.65);
        a.assert_counts_consistent();
    }

    #[test]
    fn test_band_fill_has_stripes() {
        let params = MiasmaParams {
            fill: FillPolicy::Bands {
                period_tiles: 4.0,
                duty: 0.5,
                angle_deg: 0.0,
            },
            ..small(16, 4, 1.0)
        };
        let grid = MiasmaGrid::new(params, 1).unwrap();
        // Columns alternate two fog, two clear along x
        for gx in -8..8i64 {
            let fog = grid.is_fog(grid.tile_at(gx, 0));
            assert_eq!(fog, gx.rem_euclid(4) < 2, "column {gx}");
        }
    }

    #[test]
    fn test_view_iteration_matches_brute_force() {
        let params = MiasmaParams {
            fill: FillPolicy::Random { fog_chance: 0.3 },
            ..small(24, 18, 2.0)
        };
        let grid = MiasmaGrid::new(params, 3).unwrap();
        let (min, max) = (Vec2::new(-9.0, -5.0), Vec2::new(13.0, 7.0));

        let mut got: Vec<(i32, i32)> = grid
            .fog_tiles_in_view(min, max)
            .map(|c| (c.x as i32, c.y as i32))
            .collect();
        got.sort();

        let mut expected = vec![];
        for slot in 0..grid.len() {
            let c = grid.tile_center(TileIndex(slot));
            let half = grid.tile() * 0.5;
            let overlaps = c.x + half > min.x
                && c.x - half <= max.x
                && c.y + half > min.y
                && c.y - half <= max.y;
            if overlaps && grid.fog[slot] == 1 {
                expected.push((c.x as i32, c.y as i32));
            }
        }
        expected.sort();
        assert_eq!(got, expected);

        // A viewport entirely off the grid yields nothing
        assert_eq!(
            grid.fog_tiles_in_view(Vec2::splat(500.0), Vec2::splat(600.0)).count(),
            0
        );
    }
}

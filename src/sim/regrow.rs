//! Fixed-rate fog regrowth
//!
//! Regrowth runs at `tick_hz` regardless of frame rate ("accumulate dt, drain
//! in fixed steps"), so the regrowth rate per second of game time is the same on
//! every machine. A single call never runs more than `MAX_REGROW_TICKS`.
//!
//! A clear tile whose cooldown has elapsed is re-infected by its fogged
//! 4-neighbours, each an independent trial at `chance`:
//! `p = 1 - (1 - chance)^adjacent`. Tiles with no fogged neighbour never regrow,
//! so fog only creeps outward from existing fog.

use rand::Rng;

use super::grid::MiasmaGrid;
use super::weather::modulated_chance;
use crate::consts::MAX_REGROW_TICKS;

impl MiasmaGrid {
    /// Accumulate `dt` and run every regrowth tick now due. `target_coverage`
    /// (from the weather) scales the per-neighbour chance toward that coverage.
    /// Returns the number of ticks run.
    pub fn regrow(&mut self, now: f32, dt: f32, target_coverage: Option<f32>) -> u32 {
        if !self.params.regrow_enabled {
            self.regrow_accum = 0.0;
            return 0;
        }
        let step = 1.0 / self.params.tick_hz;
        self.regrow_accum += dt.max(0.0);

        let due = (self.regrow_accum / step).floor();
        self.regrow_accum = if self.regrow_accum.is_finite() {
            self.regrow_accum.rem_euclid(step)
        } else {
            0.0
        };

        let due = due as u32;
        let ticks = due.min(MAX_REGROW_TICKS);
        if due > ticks {
            log::debug!("Regrowth backlog of {} ticks capped to {}", due, ticks);
        }
        for _ in 0..ticks {
            self.regrow_step(now, target_coverage);
        }
        ticks
    }

    /// Per-neighbour infection chance for the next tick
    pub fn effective_chance(&self, target_coverage: Option<f32>) -> f32 {
        let base = self.params.base_chance;
        match target_coverage {
            Some(target) => modulated_chance(base, target, self.coverage()),
            None => base,
        }
    }

    /// One regrowth tick. Reads only the front buffer and writes only the back
    /// buffer, then swaps them. Returns the number of tiles that regrew.
    pub(crate) fn regrow_step(&mut self, now: f32, target_coverage: Option<f32>) -> usize {
        let chance = self.effective_chance(target_coverage);

        // Probability of regrowth for 0..=4 fogged neighbours
        let miss = 1.0 - chance;
        let mut p_adj = [0.0f32; 5];
        for (adj, p) in p_adj.iter_mut().enumerate().skip(1) {
            *p = 1.0 - miss.powi(adj as i32);
        }

        self.fog_next.copy_from_slice(&self.fog);

        let (cols, rows) = (self.cols, self.rows);
        let delay = self.params.regrow_delay;
        let mut grown = 0;
        for y in 0..rows {
            for x in 0..cols {
                let i = y * cols + x;
                if self.fog[i] == 1 || now - self.last_cleared[i] < delay {
                    continue;
                }

                // Grid edges contribute nothing; no wraparound
                let mut adj = 0;
                if x > 0 && self.fog[i - 1] == 1 {
                    adj += 1;
                }
                if x + 1 < cols && self.fog[i + 1] == 1 {
                    adj += 1;
                }
                if y > 0 && self.fog[i - cols] == 1 {
                    adj += 1;
                }
                if y + 1 < rows && self.fog[i + cols] == 1 {
                    adj += 1;
                }
                if adj == 0 {
                    continue;
                }

                if self.rng.random::<f32>() < p_adj[adj] {
                    self.fog_next[i] = 1;
                    let c = self.chunk_of(i);
                    self.chunk_fog[c] += 1;
                    self.fog_count += 1;
                    grown += 1;
                }
            }
        }

        std::mem::swap(&mut self.fog, &mut self.fog_next);
        grown
    }
}

//! Miasma Sweep headless runner
//!
//! Runs a scripted session against the simulation core and logs fog coverage
//! once per simulated second. Useful for tuning settings files without a
//! renderer attached.
//!
//! Usage: `miasma-sweep [settings.json] [seed] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;

    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match runner::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is embedded by the web host; there is no wasm entry point here
}

#[cfg(not(target_arch = "wasm32"))]
mod runner {
    use glam::Vec2;

    use miasma_sweep::ConfigError;
    use miasma_sweep::consts::FRAME_DT;
    use miasma_sweep::settings::Settings;
    use miasma_sweep::sim::{FrameInput, World, tick};

    const DEFAULT_SEED: u64 = 12345;
    const DEFAULT_SECONDS: u32 = 60;

    pub fn run(args: &[String]) -> Result<(), ConfigError> {
        let settings = match args.first() {
            Some(path) if path != "-" => Settings::load(path)?,
            _ => Settings::default(),
        };
        let seed = parse_arg(args.get(1), DEFAULT_SEED, "seed")?;
        let seconds = parse_arg(args.get(2), DEFAULT_SECONDS, "seconds")?;

        let mut world = World::new(settings, seed)?;
        log::info!(
            "Running {}s headless: {}x{} tiles, start coverage {:.1}%",
            seconds,
            world.miasma().cols(),
            world.miasma().rows(),
            world.miasma().coverage() * 100.0
        );

        let frames_per_second = (1.0 / FRAME_DT).round() as u32;
        let mut health = 100.0f32;
        let mut cleared_total = 0usize;
        let mut shifts_total = 0u32;

        for frame in 0..seconds * frames_per_second {
            let input = scripted_input(frame, frames_per_second);
            let report = tick(&mut world, &input, FRAME_DT);
            cleared_total += report.tiles_cleared;
            shifts_total += report.drift_shifts;
            health = (health - report.damage).max(0.0);
            if report.laser_cut {
                log::info!("t={:.1}s laser energy depleted", world.time);
            }

            if (frame + 1) % frames_per_second == 0 {
                let wind = world.wind();
                log::info!(
                    "t={:>4.0}s coverage={:>5.1}% beam={:?} control={:.2} energy={:>3.0} wind={:>5.1}@{:>4.0}° hp={:.0}",
                    world.time,
                    world.miasma().coverage() * 100.0,
                    world.beam().state().mode(),
                    world.beam().control(),
                    world.beam().energy(),
                    wind.speed,
                    miasma_sweep::normalize_angle(wind.direction).to_degrees(),
                    health
                );
            }
        }

        println!(
            "seed {seed}: {seconds}s, final coverage {:.1}%, {cleared_total} tiles cleared, {shifts_total} drift shifts, hp {health:.0}",
            world.miasma().coverage() * 100.0
        );
        Ok(())
    }

    fn parse_arg<T: std::str::FromStr>(
        arg: Option<&String>,
        default: T,
        name: &str,
    ) -> Result<T, ConfigError> {
        match arg {
            None => Ok(default),
            Some(s) => s
                .parse()
                .map_err(|_| ConfigError::Parse(format!("invalid {name} argument: {s}"))),
        }
    }

    /// Player walks a slow circle while sweeping aim; the wheel climbs through
    /// every beam mode and back down over a 12 second cycle.
    fn scripted_input(frame: u32, fps: u32) -> FrameInput {
        let t = frame as f32 / fps as f32;
        let player = Vec2::new((t * 0.3).cos(), (t * 0.3).sin()) * 60.0;
        let aim = player + Vec2::new((t * 0.9).cos(), (t * 0.9).sin()) * 150.0;

        let notch_every = fps / 2;
        let scroll = if frame % notch_every == 0 {
            let cycle = (t as u32) % 12;
            if cycle < 6 { 1.0 } else { -1.0 }
        } else {
            0.0
        };

        FrameInput {
            player_pos: player,
            aim_target: aim,
            scroll,
            ..Default::default()
        }
    }
}

use std::process::ExitCode;
use std::time::Duration;

use engine::{FrameDriver, Simulation};
use tracing::{info, warn};

use super::bootstrap::AppWiring;

/// Headless frame length. Not a multiple of the tick length, so the
/// accumulator carries a remainder between frames.
const HEADLESS_FRAME: Duration = Duration::from_millis(17);

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring { config, encounters } = app;
    let mut undecided = 0_u32;

    for mut encounter in encounters {
        let boss = encounter.arena().boss().name();
        let mut driver = FrameDriver::new(&config);
        while !encounter.is_finished() && driver.metrics().simulated < config.run_for {
            driver.advance(&mut encounter, HEADLESS_FRAME);
        }

        let arena = encounter.arena();
        let tally = encounter.tally();
        let metrics = driver.metrics();
        info!(
            boss,
            outcome = arena.outcome().as_token(),
            simulated_ms = metrics.simulated.as_millis() as u64,
            ticks = metrics.ticks,
            skipped_ticks = metrics.skipped_ticks,
            player_health = arena.player().health().current(),
            player_energy = arena.player().energy().current(),
            boss_health_fraction = arena.boss().view().health_fraction,
            boss_damage = tally.boss_damage,
            knockbacks = tally.knockbacks,
            actions_started = tally.actions_started,
            interrupts = tally.interrupts,
            tiles_broken = tally.tiles_broken,
            projectiles_fired = tally.projectiles_fired,
            "encounter_finished"
        );
        if !encounter.is_finished() {
            undecided += 1;
            warn!(boss, run_for_ms = config.run_for.as_millis() as u64, "encounter_timed_out");
        }
    }

    info!(undecided, "=== Boss Rush Complete ===");
    ExitCode::SUCCESS
}

//! Brickfall headless runner
//!
//! Plays the bundled levels with a simple autopilot that keeps the bat under
//! the ball, feeding the session synthetic 60 Hz frame times. Useful for
//! soak-testing the simulation and watching events with `RUST_LOG=debug`.
//!
//! Usage: `brickfall [seed] [max-seconds]`

use std::error::Error;

use brickfall::sim::{GameEvent, LevelSet, UpgradeKey, UpgradeLevels};
use brickfall::{EventListener, GamePhase, Session, Tuning};

const LEVELS_JSON: &str = include_str!("../assets/levels.json");

/// Render rate the runner pretends to have
const FRAME_DT: f64 = 1.0 / 60.0;

/// Logs the events external collaborators would react to
struct EventLog {
    bricks_destroyed: u32,
}

impl EventListener for EventLog {
    fn on_event(&mut self, event: &GameEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        match event {
            GameEvent::BrickDestroyed { .. } => self.bricks_destroyed += 1,
            GameEvent::BossDefeated { brick_id } => log::info!("Boss {} defeated", brick_id),
            GameEvent::LevelCleared {
                level_id,
                elapsed_secs,
            } => log::info!(
                "Level {} cleared in {:.1}s ({} bricks so far)",
                level_id,
                elapsed_secs,
                self.bricks_destroyed
            ),
            GameEvent::BallLost { health } | GameEvent::PlayerHit { health } => {
                log::info!("Ouch, health {}", health)
            }
            _ => {}
        }
        Ok(())
    }
}

/// Upgrade the player picks after each level
fn pick_upgrade(levels: &UpgradeLevels, cleared: u32) -> UpgradeLevels {
    const ROTATION: [UpgradeKey; 4] = [
        UpgradeKey::Piercing,
        UpgradeKey::Explosion,
        UpgradeKey::BatShooter,
        UpgradeKey::Critical,
    ];
    let key = ROTATION[cleared as usize % ROTATION.len()];
    levels.clone().with(key, levels.level(key) + 1)
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1);
    let max_seconds: f64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(300.0);

    let levels = LevelSet::from_json(LEVELS_JSON)?;
    let first = levels
        .first_id()
        .ok_or("bundled level set is empty")?;

    log::info!("Brickfall (headless) starting, seed {}", seed);

    let mut session = Session::new(levels, Tuning::default(), seed)?;
    session.add_listener(Box::new(EventLog {
        bricks_destroyed: 0,
    }));
    session.start_game(first)?;

    let mut now = 0.0;
    let mut cleared = 0;
    while now < max_seconds {
        if let (Some(ball), Some(bat)) = (session.ball(), session.bat()) {
            let (x, y) = (ball.pos.x, bat.center().y);
            session.set_mouse_position(x, y);
        }
        session.frame(now);
        now += FRAME_DT;

        match session.phase() {
            GamePhase::LevelComplete => {
                cleared += 1;
                session.open_upgrade_screen();
                let upgrades = pick_upgrade(session.upgrades(), cleared);
                if !session.exit_upgrade_screen(upgrades)? {
                    log::info!("Campaign finished after {:.1}s", now);
                    break;
                }
            }
            GamePhase::GameOver => {
                log::info!("Game over after {:.1}s, {} levels cleared", now, cleared);
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by a host page; there is no native runner here
}

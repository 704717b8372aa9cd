//! Ring Reflex entry point
//!
//! Headless demo driver: auto-plays a seeded run on a virtual clock, logging
//! HUD state and events. Exercises the whole session core without a renderer;
//! the real front end drives the same `Orchestrator` API from its frame loop.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use ring_reflex::consts::TICK_HZ;
use ring_reflex::highscores::{HighScoreEntry, HighScores};
use ring_reflex::session::{Orchestrator, RingPosition, Scene};
use ring_reflex::settings::{GameMode, Settings};

/// Virtual play time cap (seconds)
const MAX_RUN_SEC: f64 = 180.0;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(0xC0FFEE);
    let mut cfg = Settings::default();
    if args.next().as_deref() == Some("timed") {
        cfg.mode = GameMode::Timed;
    }

    log::info!("demo run: seed {seed}, mode {:?}", cfg.mode);
    let mut orc = Orchestrator::new(cfg, seed);
    orc.start_game(0.0);

    // The demo player has its own RNG stream so its mistakes are reproducible
    // but independent of the session's rolls.
    let mut player = Pcg32::seed_from_u64(seed ^ 0x9E37_79B9);

    let dt = 1.0 / TICK_HZ;
    let mut now = 0.0;
    while now < MAX_RUN_SEC {
        now += dt;

        if orc.scene() == Scene::Instruction {
            log::info!("level {} intro", orc.session().level_index + 1);
            orc.confirm_instruction(now);
        }

        orc.update(now);
        for event in orc.drain_events() {
            log::info!("event: {event:?}");
        }
        if orc.scene() == Scene::Over {
            break;
        }

        // Simulated reflexes: roughly a 0.2s reaction, one press in ten wrong
        let view = orc.view(now);
        if let Some(target) = view.target {
            if player.random_range(0..12) == 0 {
                let press = if player.random_range(0..10) == 0 {
                    RingPosition::ALL[player.random_range(0..4)]
                } else {
                    let required = orc.session().rules.apply(target);
                    let pos = view.layout.position_of(required);
                    if orc.session().invert_controls {
                        pos.opposite()
                    } else {
                        pos
                    }
                };
                orc.handle_input(now, press);
            }
        }
    }

    let session = orc.session();
    let mut scores = HighScores::new();
    scores.add(HighScoreEntry {
        score: session.score,
        best_streak: session.best_streak,
        level: session.level_index as u32,
        timestamp: 0.0,
    });
    log::info!(
        "run finished at t={now:.1}s: score {}, best streak {}, level {}",
        session.score,
        session.best_streak,
        session.level_index + 1
    );
    match scores.to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("score serialization failed: {err}"),
    }
}

//! Sweep Pong headless runner
//!
//! Plays a bot-vs-bot match on the fixed timestep and prints a JSON summary.
//! Windowing and viewport animation belong to the host application; here
//! every viewport is reported idle, so intermissions end on the next tick.
//!
//! Example:
//!   sweep-pong --seed 7 --ticks 36000 --tuning tuning.json

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;
    use serde::Serialize;

    use sweep_pong::Tuning;
    use sweep_pong::consts::SIM_DT;
    use sweep_pong::sim::{Bot, GameEvent, MatchPhase, MatchState, PlayerId, TickInput, tick};

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Run a headless bot-vs-bot Pong match", long_about = None)]
    struct Args {
        /// Seed for the bots
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Stop after this many ticks if nobody has won
        #[arg(long, default_value_t = 60 * 60 * 10)]
        ticks: u64,
        /// JSON tuning file (defaults are used if absent or invalid)
        #[arg(long)]
        tuning: Option<PathBuf>,
    }

    #[derive(Serialize)]
    struct Summary {
        seed: u64,
        ticks: u64,
        phase: MatchPhase,
        winner: Option<PlayerId>,
        health: Vec<u32>,
        /// Goals let in per player, the scoreboard
        conceded: Vec<u32>,
        goals: u32,
        paddle_hits: u32,
    }

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        let tuning = match &args.tuning {
            Some(path) => Tuning::load_or_default(path),
            None => Tuning::default(),
        };

        let mut state = MatchState::new(tuning);
        let mut bots = [Bot::new(args.seed, 0), Bot::new(args.seed.wrapping_add(1), 1)];
        let mut goals = 0;
        let mut paddle_hits = 0;

        log::info!("Sweep Pong (headless) starting with seed {}", args.seed);

        while state.time_ticks < args.ticks && state.phase != MatchPhase::GameOver {
            let input = TickInput {
                players: bots.iter_mut().map(|bot| bot.input(&state)).collect(),
                ..Default::default()
            };
            tick(&mut state, &input, SIM_DT);

            for event in &state.events {
                match event {
                    GameEvent::Goal { .. } => goals += 1,
                    GameEvent::PaddleHit { .. } => paddle_hits += 1,
                    GameEvent::ViewportResize {
                        player,
                        width,
                        height,
                    } => {
                        log::info!("Viewport of player {} -> {}x{}", player, width, height);
                    }
                    _ => {}
                }
            }
        }

        if state.phase != MatchPhase::GameOver {
            log::warn!("No winner after {} ticks", state.time_ticks);
        }

        let summary = Summary {
            seed: args.seed,
            ticks: state.time_ticks,
            phase: state.phase,
            winner: state.winner,
            health: state.players.iter().map(|p| p.health).collect(),
            conceded: state.players.iter().map(|p| p.goals_conceded()).collect(),
            goals,
            paddle_hits,
        };
        let json = serde_json::to_string_pretty(&summary).context("serialize match summary")?;
        println!("{json}");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on wasm, this is just to satisfy the compiler
}

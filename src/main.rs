/// Entry point and game loop.

use std::time::{Duration, Instant};

use tracing_subscriber::EnvFilter;

use mazechase::config::GameConfig;
use mazechase::sim::event::GameEvent;
use mazechase::sim::level;
use mazechase::sim::step;
use mazechase::sim::world::WorldState;
use mazechase::ui::input::InputState;
use mazechase::ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    // Logs go to stderr so they never interleave with the alternate screen
    // unless redirected: `RUST_LOG=debug mazechase 2> chase.log`
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = GameConfig::load();

    let mut world = match level::load_map_source(&config.map_file)
        .and_then(|source| WorldState::from_source(&source, &config))
    {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Could not load maze: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let result = game_loop(&mut world, &mut renderer, &config, honor_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Maze Chase!");
    println!("Final Score: {}  (level {})", world.score.score, world.score.level);
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    loop {
        kb.drain_events();
        if kb.quit_requested() {
            break;
        }

        world.set_desired_heading(kb.desired_heading());

        if last_tick.elapsed() >= tick_rate {
            let events = step::step(world);
            log_events(world.tick, &events);
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn log_events(tick: u64, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::PelletEaten { .. } => tracing::trace!(tick, ?event),
            GameEvent::GameOver | GameEvent::LevelAdvanced { .. } => tracing::info!(tick, ?event),
            _ => tracing::debug!(tick, ?event),
        }
    }
}

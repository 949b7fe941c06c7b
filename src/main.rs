//! World Shift headless runner
//!
//! Plays a scripted run through the simulation and prints the run summary as
//! JSON. Usage: `world-shift [config.json] [seed]`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use glam::Vec2;
    use world_shift::render::render;
    use world_shift::sim::{Aabb, Control, Controls, GameState, TickInput, tick};
    use world_shift::{Config, RenderSink, VisualTag};

    /// Ticks to run when nothing ends the run earlier
    const MAX_TICKS: u64 = 60 * 60;

    /// Counts what would have been drawn
    #[derive(Default)]
    struct CountingSink {
        rects: usize,
        hazards: usize,
    }

    impl RenderSink for CountingSink {
        fn draw(&mut self, _rect: &Aabb, tag: VisualTag) {
            self.rects += 1;
            if tag == VisualTag::Enemy {
                self.hazards += 1;
            }
        }
    }

    /// Walk right, hop every second, lob a crate or bomb now and then
    fn scripted_input(tick: u64, player_center: Vec2) -> TickInput {
        let mut controls = Controls::with(&[Control::MoveRight]);
        if tick % 60 == 0 {
            controls.set(Control::Jump, true);
        }
        if tick % 90 == 10 {
            controls.set(Control::FirePrimary, true);
        }
        if tick % 150 == 20 {
            controls.set(Control::FireSecondary, true);
        }
        if tick == 300 || tick == 420 {
            controls.set(Control::TogglePredict, true);
        }
        if tick % 600 == 30 {
            controls.set(Control::Invulnerable, true);
        }
        TickInput::new(controls).with_aim(player_center + Vec2::new(240.0, -180.0))
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        env_logger::init();

        let mut args = std::env::args().skip(1);
        let config = match args.next() {
            Some(path) => Config::load(&PathBuf::from(path))?,
            None => Config::default(),
        };
        let seed = match args.next() {
            Some(seed) => seed.parse::<u64>()?,
            None => 0x5eed,
        };

        log::info!("World Shift starting (seed {seed})");
        let mut state = GameState::new(config, seed)?;

        let mut sink = CountingSink::default();
        while state.outcome().is_none() && state.time_ticks < MAX_TICKS {
            let input = scripted_input(state.time_ticks, state.player.rect.center());
            tick(&mut state, &input);

            sink = CountingSink::default();
            render(&state, &mut sink);
        }

        match state.outcome() {
            Some(reason) => log::info!("Run over after {} ticks: {reason:?}", state.time_ticks),
            None => log::info!("Run survived {} ticks", state.time_ticks),
        }
        log::info!("Last frame: {} rects, {} hazards", sink.rects, sink.hazards);

        println!("{}", serde_json::to_string_pretty(&state.stats())?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("world-shift: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is driven by the host on wasm targets
}

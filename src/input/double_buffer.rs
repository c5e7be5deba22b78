use super::state::GameInput;
use crate::config::InputConfig;

/// Two input generations used in ping-pong fashion
///
/// Each frame: `begin_frame` seeds the current generation from the previous
/// one, the event source records edges into `current_mut`, the simulation
/// reads `current`, and `swap` flips which generation is current. Nothing is
/// copied wholesale; the swap is an index toggle.
#[derive(Debug, Clone)]
pub struct InputBuffers {
    generations: [GameInput; 2],
    current: usize,
}

impl InputBuffers {
    pub fn new(max_controllers: usize) -> Self {
        Self {
            generations: [GameInput::new(max_controllers), GameInput::new(max_controllers)],
            current: 0,
        }
    }

    /// Both generations share the configured slot count and stick dead zone
    pub fn from_config(config: &InputConfig) -> Self {
        Self {
            generations: [GameInput::from_config(config), GameInput::from_config(config)],
            current: 0,
        }
    }

    /// Seed the current generation from the previous one
    ///
    /// Held buttons stay held, transition counts restart at zero.
    pub fn begin_frame(&mut self) {
        let [first, second] = &mut self.generations;
        let (current, previous) = if self.current == 0 {
            (first, second)
        } else {
            (second, first)
        };
        current.seed_from(previous);
    }

    pub fn current(&self) -> &GameInput {
        &self.generations[self.current]
    }

    pub fn current_mut(&mut self) -> &mut GameInput {
        &mut self.generations[self.current]
    }

    pub fn previous(&self) -> &GameInput {
        &self.generations[self.current ^ 1]
    }

    /// Hand the current generation over to be next frame's seed
    pub fn swap(&mut self) {
        self.current ^= 1;
    }
}

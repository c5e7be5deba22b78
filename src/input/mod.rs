pub mod deadzone;
pub mod double_buffer;
pub mod state;

pub use deadzone::normalize_stick_value;
pub use double_buffer::InputBuffers;
pub use state::{Axis, Button, ButtonState, ControllerInput, ControllerSlot, GameInput};

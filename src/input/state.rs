use super::deadzone::normalize_stick_value;
use crate::config::InputConfig;
use crate::constants::STICK_MAX;

/// Digital buttons tracked for every controller slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ActionUp,
    ActionDown,
    ActionLeft,
    ActionRight,
    LeftShoulder,
    RightShoulder,
    Back,
    Start,
}

impl Button {
    pub const COUNT: usize = 12;

    pub const ALL: [Button; Button::COUNT] = [
        Button::MoveUp,
        Button::MoveDown,
        Button::MoveLeft,
        Button::MoveRight,
        Button::ActionUp,
        Button::ActionDown,
        Button::ActionLeft,
        Button::ActionRight,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::Back,
        Button::Start,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Analog stick axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    StickX,
    StickY,
}

/// Controller slot address
///
/// The keyboard always occupies the first slot; gamepads follow, numbered
/// from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerSlot {
    Keyboard,
    Gamepad(usize),
}

impl ControllerSlot {
    fn index(self) -> usize {
        match self {
            ControllerSlot::Keyboard => 0,
            ControllerSlot::Gamepad(n) => n + 1,
        }
    }
}

/// One button's state over a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    /// Whether the button was held when the frame ended
    pub ended_down: bool,
    /// Number of up/down flips during the frame
    pub half_transition_count: u32,
}

impl ButtonState {
    /// At least one press happened this frame, even if it was released again
    pub fn was_pressed(&self) -> bool {
        self.half_transition_count > 1 || (self.half_transition_count == 1 && self.ended_down)
    }

    pub fn is_down(&self) -> bool {
        self.ended_down
    }
}

/// State of a single keyboard or gamepad slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerInput {
    pub is_connected: bool,
    pub is_analog: bool,
    /// Normalized stick position in [-1, 1]
    pub stick_x: f32,
    pub stick_y: f32,
    buttons: [ButtonState; Button::COUNT],
}

impl ControllerInput {
    pub fn button(&self, button: Button) -> ButtonState {
        self.buttons[button.index()]
    }

    pub fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::StickX => self.stick_x,
            Axis::StickY => self.stick_y,
        }
    }

    /// Carry held state and connection flags over from the previous frame
    ///
    /// Transition counts start at zero and sticks recenter; anything that
    /// changes this frame is recorded on top.
    fn seed_from(&mut self, previous: &ControllerInput) {
        self.is_connected = previous.is_connected;
        self.is_analog = previous.is_analog;
        self.stick_x = 0.0;
        self.stick_y = 0.0;
        for (button, old) in self.buttons.iter_mut().zip(previous.buttons.iter()) {
            *button = ButtonState {
                ended_down: old.ended_down,
                half_transition_count: 0,
            };
        }
    }

    fn record_transition(&mut self, button: Button, is_down: bool) {
        let state = &mut self.buttons[button.index()];
        debug_assert_ne!(
            state.ended_down, is_down,
            "{:?} transition recorded without a state change",
            button
        );
        state.ended_down = is_down;
        state.half_transition_count += 1;
    }
}

/// Input snapshot for one frame: the keyboard slot plus every gamepad slot
#[derive(Debug, Clone, PartialEq)]
pub struct GameInput {
    controllers: Vec<ControllerInput>,
    stick_deadzone: i16,
}

impl GameInput {
    /// Create a snapshot with `max_controllers` gamepad slots
    ///
    /// The keyboard slot starts connected, gamepads start disconnected.
    /// Raw stick values map linearly; use `with_stick_deadzone` for a
    /// centered dead zone.
    pub fn new(max_controllers: usize) -> Self {
        let mut controllers = vec![ControllerInput::default(); max_controllers + 1];
        controllers[0].is_connected = true;
        Self {
            controllers,
            stick_deadzone: 0,
        }
    }

    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.max_controllers).with_stick_deadzone(config.stick_deadzone)
    }

    /// Raw stick magnitude `set_stick_raw` treats as centered
    pub fn with_stick_deadzone(mut self, threshold: i16) -> Self {
        self.stick_deadzone = threshold.clamp(0, STICK_MAX - 1);
        self
    }

    pub fn stick_deadzone(&self) -> i16 {
        self.stick_deadzone
    }

    pub fn controller(&self, slot: ControllerSlot) -> Option<&ControllerInput> {
        self.controllers.get(slot.index())
    }

    pub fn controller_mut(&mut self, slot: ControllerSlot) -> Option<&mut ControllerInput> {
        self.controllers.get_mut(slot.index())
    }

    pub fn controllers(&self) -> &[ControllerInput] {
        &self.controllers
    }

    pub fn keyboard(&self) -> &ControllerInput {
        &self.controllers[0]
    }

    /// Number of gamepad slots (excluding the keyboard)
    pub fn max_controllers(&self) -> usize {
        self.controllers.len() - 1
    }

    /// Record a button edge
    ///
    /// The edge must flip the button: recording `is_down` equal to the
    /// current state means an event was counted twice upstream, which is a
    /// debug assertion failure. Slots beyond the configured range are ignored.
    pub fn record_transition(&mut self, slot: ControllerSlot, button: Button, is_down: bool) {
        match self.controllers.get_mut(slot.index()) {
            Some(controller) => controller.record_transition(button, is_down),
            None => log::debug!("Ignoring {:?} on unconfigured slot {:?}", button, slot),
        }
    }

    /// Record a raw key event, dropping auto-repeats
    ///
    /// Returns `true` when the event changed the button state.
    pub fn process_key(&mut self, slot: ControllerSlot, button: Button, is_down: bool) -> bool {
        let Some(controller) = self.controllers.get_mut(slot.index()) else {
            return false;
        };
        if controller.button(button).ended_down == is_down {
            return false;
        }
        controller.record_transition(button, is_down);
        true
    }

    /// Set a normalized stick axis, marking the slot analog and connected
    pub fn set_axis(&mut self, slot: ControllerSlot, axis: Axis, value: f32) {
        let Some(controller) = self.controllers.get_mut(slot.index()) else {
            return;
        };
        let value = if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) };
        match axis {
            Axis::StickX => controller.stick_x = value,
            Axis::StickY => controller.stick_y = value,
        }
        controller.is_analog = true;
        controller.is_connected = true;
    }

    /// Set a stick axis from a raw gamepad reading, applying the dead zone
    pub fn set_stick_raw(&mut self, slot: ControllerSlot, axis: Axis, raw: i16) {
        let value = normalize_stick_value(raw, self.stick_deadzone);
        self.set_axis(slot, axis, value);
    }

    /// Mark a gamepad as plugged in or removed
    pub fn set_connected(&mut self, slot: ControllerSlot, connected: bool) {
        if let Some(controller) = self.controllers.get_mut(slot.index()) {
            controller.is_connected = connected;
            if !connected {
                controller.is_analog = false;
            }
        }
    }

    pub(super) fn seed_from(&mut self, previous: &GameInput) {
        debug_assert_eq!(self.controllers.len(), previous.controllers.len());
        for (current, old) in self.controllers.iter_mut().zip(previous.controllers.iter()) {
            current.seed_from(old);
        }
    }
}

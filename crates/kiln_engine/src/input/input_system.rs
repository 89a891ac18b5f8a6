//! Input system
//!
//! Device polling belongs to the host. The host sends [`InputEvent`]s through
//! the channel returned by [`InputSystem::sender`]; every update the system
//! first clears last frame's edge state (pressed/released, wheel) and then
//! applies everything queued since.

use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::{HashMap, HashSet};

use super::{ActionBindings, KeyCode, MouseButton};
use crate::core::config::EngineConfig;
use crate::ecs::{names, System, SystemError};
use crate::foundation::logging::debug;
use crate::foundation::math::Vec2;

/// One active touch point in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    /// Platform touch identifier
    pub id: u64,
    /// Surface-space position
    pub position: Vec2,
}

/// Raw input reported by the host
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A key went down
    KeyDown(KeyCode),
    /// A key went up
    KeyUp(KeyCode),
    /// The pointer moved to a surface-space position
    MouseMove {
        /// Horizontal position
        x: f32,
        /// Vertical position
        y: f32,
    },
    /// A mouse button went down
    MouseDown(MouseButton),
    /// A mouse button went up
    MouseUp(MouseButton),
    /// Wheel scrolled by a vertical amount
    Wheel(f32),
    /// The complete set of active touches changed
    Touches(Vec<Touch>),
    /// Pointer lock was acquired or released
    PointerLock(bool),
}

/// Keyboard, mouse and touch state, plus named actions over keys
pub struct InputSystem {
    events: Receiver<InputEvent>,
    sender: Sender<InputEvent>,

    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,

    mouse_position: Vec2,
    mouse_position_last: Vec2,
    mouse_delta: Vec2,
    mouse_buttons: HashSet<MouseButton>,
    mouse_buttons_pressed: HashSet<MouseButton>,
    wheel_delta: f32,

    touches: Vec<Touch>,
    pointer_locked: bool,
    actions: HashMap<String, Vec<KeyCode>>,
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSystem {
    /// Create a system with an empty event queue
    pub fn new() -> Self {
        let (sender, events) = unbounded();
        Self {
            events,
            sender,
            keys_down: HashSet::new(),
            keys_pressed: HashSet::new(),
            keys_released: HashSet::new(),
            mouse_position: Vec2::zeros(),
            mouse_position_last: Vec2::zeros(),
            mouse_delta: Vec2::zeros(),
            mouse_buttons: HashSet::new(),
            mouse_buttons_pressed: HashSet::new(),
            wheel_delta: 0.0,
            touches: Vec::new(),
            pointer_locked: false,
            actions: HashMap::new(),
        }
    }

    /// Handle the host uses to report events. Clones freely across threads.
    pub fn sender(&self) -> Sender<InputEvent> {
        self.sender.clone()
    }

    fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                if self.keys_down.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            InputEvent::KeyUp(key) => {
                self.keys_down.remove(&key);
                self.keys_released.insert(key);
            }
            InputEvent::MouseMove { x, y } => self.mouse_position = Vec2::new(x, y),
            InputEvent::MouseDown(button) => {
                self.mouse_buttons.insert(button);
                self.mouse_buttons_pressed.insert(button);
            }
            InputEvent::MouseUp(button) => {
                self.mouse_buttons.remove(&button);
            }
            InputEvent::Wheel(delta) => self.wheel_delta += delta,
            InputEvent::Touches(touches) => self.touches = touches,
            InputEvent::PointerLock(locked) => self.pointer_locked = locked,
        }
    }

    // Keyboard

    /// Key is held
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Key went down this frame
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Key went up this frame
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    // Mouse

    /// Pointer position in surface coordinates
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Pointer movement during the last frame
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Button is held
    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Button went down this frame
    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons_pressed.contains(&button)
    }

    /// Wheel movement during the last frame
    pub fn wheel_delta(&self) -> f32 {
        self.wheel_delta
    }

    /// Active touches
    pub fn touches(&self) -> &[Touch] {
        &self.touches
    }

    /// Whether the host reports the pointer as locked
    pub fn is_pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    // Actions

    /// Bind an action name to keys, replacing any previous binding
    pub fn map_action(&mut self, action: impl Into<String>, keys: &[KeyCode]) {
        self.actions.insert(action.into(), keys.to_vec());
    }

    /// Bind every action in `bindings`, keeping unrelated existing actions
    pub fn apply_bindings(&mut self, bindings: &ActionBindings) {
        for (action, keys) in &bindings.actions {
            self.map_action(action.clone(), keys);
        }
    }

    fn any_key(&self, action: &str, test: impl Fn(&Self, KeyCode) -> bool) -> bool {
        self.actions
            .get(action)
            .map_or(false, |keys| keys.iter().any(|&k| test(self, k)))
    }

    /// Any bound key is held; false for unmapped actions
    pub fn is_action_down(&self, action: &str) -> bool {
        self.any_key(action, Self::is_key_down)
    }

    /// Any bound key went down this frame
    pub fn is_action_pressed(&self, action: &str) -> bool {
        self.any_key(action, Self::is_key_pressed)
    }

    /// Any bound key went up this frame
    pub fn is_action_released(&self, action: &str) -> bool {
        self.any_key(action, Self::is_key_released)
    }
}

#[async_trait(?Send)]
impl System for InputSystem {
    fn name(&self) -> &str {
        names::INPUT
    }

    fn priority(&self) -> i32 {
        0
    }

    async fn initialize(&mut self, _config: &EngineConfig) -> Result<(), SystemError> {
        debug!("Input system ready");
        Ok(())
    }

    fn update(&mut self, _delta_time: f32) -> Result<(), SystemError> {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_buttons_pressed.clear();
        self.wheel_delta = 0.0;

        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }

        self.mouse_delta = self.mouse_position - self.mouse_position_last;
        self.mouse_position_last = self.mouse_position;
        Ok(())
    }

    fn dispose(&mut self) {
        while self.events.try_recv().is_ok() {}
        self.keys_down.clear();
        self.mouse_buttons.clear();
        self.touches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(input: &mut InputSystem, events: &[InputEvent]) {
        let sender = input.sender();
        for event in events {
            sender.send(event.clone()).unwrap();
        }
        input.update(0.016).unwrap();
    }

    #[test]
    fn test_key_edges_last_one_frame() {
        let mut input = InputSystem::new();
        frame(&mut input, &[InputEvent::KeyDown(KeyCode::W)]);
        assert!(input.is_key_down(KeyCode::W));
        assert!(input.is_key_pressed(KeyCode::W));

        frame(&mut input, &[InputEvent::KeyDown(KeyCode::W)]);
        assert!(input.is_key_down(KeyCode::W));
        assert!(!input.is_key_pressed(KeyCode::W));

        frame(&mut input, &[InputEvent::KeyUp(KeyCode::W)]);
        assert!(!input.is_key_down(KeyCode::W));
        assert!(input.is_key_released(KeyCode::W));

        frame(&mut input, &[]);
        assert!(!input.is_key_released(KeyCode::W));
    }

    #[test]
    fn test_mouse_delta_and_wheel() {
        let mut input = InputSystem::new();
        frame(
            &mut input,
            &[
                InputEvent::MouseMove { x: 10.0, y: 5.0 },
                InputEvent::Wheel(1.5),
                InputEvent::Wheel(0.5),
                InputEvent::MouseDown(MouseButton::Left),
            ],
        );
        assert_eq!(input.mouse_delta(), Vec2::new(10.0, 5.0));
        assert_relative_eq!(input.wheel_delta(), 2.0);
        assert!(input.is_mouse_button_pressed(MouseButton::Left));

        frame(&mut input, &[InputEvent::MouseMove { x: 12.0, y: 5.0 }]);
        assert_eq!(input.mouse_delta(), Vec2::new(2.0, 0.0));
        assert_relative_eq!(input.wheel_delta(), 0.0);
        assert!(input.is_mouse_button_down(MouseButton::Left));
        assert!(!input.is_mouse_button_pressed(MouseButton::Left));
    }

    #[test]
    fn test_actions() {
        let mut input = InputSystem::new();
        input.map_action("jump", &[KeyCode::Space, KeyCode::Up]);
        frame(&mut input, &[InputEvent::KeyDown(KeyCode::Up)]);
        assert!(input.is_action_down("jump"));
        assert!(input.is_action_pressed("jump"));
        assert!(!input.is_action_down("fire"));

        frame(&mut input, &[InputEvent::KeyUp(KeyCode::Up)]);
        assert!(input.is_action_released("jump"));
        assert!(!input.is_action_down("jump"));
    }

    #[test]
    fn test_apply_bindings_keeps_other_actions() {
        let mut input = InputSystem::new();
        input.map_action("fire", &[KeyCode::F]);
        input.apply_bindings(&ActionBindings::default().bind("jump", &[KeyCode::Space]));
        frame(
            &mut input,
            &[InputEvent::KeyDown(KeyCode::F), InputEvent::KeyDown(KeyCode::Space)],
        );
        assert!(input.is_action_down("fire"));
        assert!(input.is_action_pressed("jump"));
    }

    #[test]
    fn test_touches_replace_previous_set() {
        let mut input = InputSystem::new();
        let touch = Touch {
            id: 1,
            position: Vec2::new(3.0, 4.0),
        };
        frame(&mut input, &[InputEvent::Touches(vec![touch])]);
        assert_eq!(input.touches(), &[touch]);
        frame(&mut input, &[InputEvent::Touches(Vec::new())]);
        assert!(input.touches().is_empty());
    }
}

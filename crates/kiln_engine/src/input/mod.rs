//! Input handling
//!
//! The host pushes [`InputEvent`]s into the [`InputSystem`] through a channel.
//! Each frame the system folds the queued events into per-frame state that
//! gameplay systems and scripts query.
//!
//! Hosts that only know key names (`"w"`, `"ArrowUp"`, `" "`) convert them
//! with [`KeyCode::from_str`](std::str::FromStr); names are case-insensitive.

mod input_system;

pub use input_system::{InputEvent, InputSystem, Touch};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::Config;

macro_rules! key_codes {
    ($($(#[$meta:meta])* $variant:ident => $name:literal $(| $alias:literal)*),+ $(,)?) => {
        /// Key codes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum KeyCode {
            $($(#[$meta])* $variant,)+
        }

        impl KeyCode {
            /// Canonical lowercase key name
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            fn lookup(name: &str) -> Option<Self> {
                match name {
                    $($name $(| $alias)* => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

key_codes! {
    /// A key
    A => "a",
    /// B key
    B => "b",
    /// C key
    C => "c",
    /// D key
    D => "d",
    /// E key
    E => "e",
    /// F key
    F => "f",
    /// G key
    G => "g",
    /// H key
    H => "h",
    /// I key
    I => "i",
    /// J key
    J => "j",
    /// K key
    K => "k",
    /// L key
    L => "l",
    /// M key
    M => "m",
    /// N key
    N => "n",
    /// O key
    O => "o",
    /// P key
    P => "p",
    /// Q key
    Q => "q",
    /// R key
    R => "r",
    /// S key
    S => "s",
    /// T key
    T => "t",
    /// U key
    U => "u",
    /// V key
    V => "v",
    /// W key
    W => "w",
    /// X key
    X => "x",
    /// Y key
    Y => "y",
    /// Z key
    Z => "z",
    /// Space bar
    Space => "space" | " ",
    /// Enter or return
    Enter => "enter" | "return",
    /// Escape
    Escape => "escape" | "esc",
    /// Up arrow
    Up => "arrowup" | "up",
    /// Down arrow
    Down => "arrowdown" | "down",
    /// Left arrow
    Left => "arrowleft" | "left",
    /// Right arrow
    Right => "arrowright" | "right",
    /// Tab
    Tab => "tab",
    /// Backspace
    Backspace => "backspace",
    /// Either shift key
    Shift => "shift",
    /// Either control key
    Control => "control" | "ctrl",
    /// Either alt key
    Alt => "alt",
}

/// Key name that maps to no [`KeyCode`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown key '{0}'")]
pub struct UnknownKey(pub String);

impl FromStr for KeyCode {
    type Err = UnknownKey;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::lookup(&name.to_ascii_lowercase()).ok_or_else(|| UnknownKey(name.to_string()))
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
    /// Any further button, by platform index
    Other(u8),
}

impl MouseButton {
    /// Map a DOM-style button index (0 left, 1 middle, 2 right)
    pub const fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            other => Self::Other(other),
        }
    }
}

/// Named actions and the keys bound to them, loadable from a config file
///
/// ```toml
/// [actions]
/// jump = ["Space", "Up"]
/// fire = ["F"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBindings {
    /// Keys per action name
    #[serde(default)]
    pub actions: BTreeMap<String, Vec<KeyCode>>,
}

impl ActionBindings {
    /// Builder: bind `action` to `keys`
    pub fn bind(mut self, action: impl Into<String>, keys: &[KeyCode]) -> Self {
        self.actions.insert(action.into(), keys.to_vec());
        self
    }
}

impl Config for ActionBindings {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_key_names_parse_case_insensitively() {
        assert_eq!("W".parse::<KeyCode>(), Ok(KeyCode::W));
        assert_eq!("ArrowUp".parse::<KeyCode>(), Ok(KeyCode::Up));
        assert_eq!(" ".parse::<KeyCode>(), Ok(KeyCode::Space));
        assert_eq!(
            "F13".parse::<KeyCode>(),
            Err(UnknownKey("F13".to_string()))
        );
        assert_eq!(KeyCode::Escape.to_string(), "escape");
    }

    #[test]
    fn test_action_bindings_from_toml() {
        let text = "[actions]\njump = [\"Space\", \"Up\"]\n";
        let bindings = ActionBindings::from_format(ConfigFormat::Toml, text).unwrap();
        assert_eq!(
            bindings,
            ActionBindings::default().bind("jump", &[KeyCode::Space, KeyCode::Up])
        );
    }

    #[test]
    fn test_mouse_button_index() {
        assert_eq!(MouseButton::from_index(2), MouseButton::Right);
        assert_eq!(MouseButton::from_index(4), MouseButton::Other(4));
    }
}

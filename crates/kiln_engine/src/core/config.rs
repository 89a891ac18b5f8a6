//! # Engine Configuration
//!
//! Configuration handed to [`Engine::initialize`](crate::Engine::initialize) and
//! forwarded to every system. Every section is `#[serde(default)]`, so a config
//! file only needs the keys it wants to change.
//!
//! ## Defaults
//!
//! | key                 | default            |
//! |---------------------|--------------------|
//! | `surface`           | none               |
//! | `width` x `height`  | 1280 x 720         |
//! | `pixel_ratio`       | 1.0                |
//! | `physics.enabled`   | false              |
//! | `physics.gravity`   | `[0.0, -9.81, 0.0]` |
//! | `audio.enabled`     | true               |
//! | `debug`             | false              |
//! | `target_frame_rate` | 0 (unlimited)      |
//! | `time_scale`        | 1.0                |
//! | `fault_policy`      | `"propagate"`      |

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::math::{vec3_from_array, Vec3};

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Host surface the renderer draws into (canvas id, window title, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    /// Surface width in logical pixels
    pub width: u32,
    /// Surface height in logical pixels
    pub height: u32,
    /// Physical pixels per logical pixel
    pub pixel_ratio: f32,
    /// Physics backend settings
    pub physics: PhysicsConfig,
    /// Audio backend settings
    pub audio: AudioConfig,
    /// Enables debug behaviour in systems that support it
    pub debug: bool,
    /// Frames per second to aim for; 0 means unlimited
    pub target_frame_rate: u32,
    /// Simulation speed multiplier applied to real elapsed time
    pub time_scale: f32,
    /// What the loop does when a system update fails
    pub fault_policy: FaultPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface: None,
            width: 1280,
            height: 720,
            pixel_ratio: 1.0,
            physics: PhysicsConfig::default(),
            audio: AudioConfig::default(),
            debug: false,
            target_frame_rate: 0,
            time_scale: 1.0,
            fault_policy: FaultPolicy::default(),
        }
    }
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Set the host surface
    pub fn with_surface(mut self, surface: impl Into<String>) -> Self {
        self.surface = Some(surface.into());
        self
    }

    /// Set the surface size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable physics with the given gravity
    pub fn with_physics(mut self, gravity: [f32; 3]) -> Self {
        self.physics = PhysicsConfig {
            enabled: true,
            gravity,
        };
        self
    }

    /// Set the target frame rate (0 = unlimited)
    pub fn with_target_frame_rate(mut self, fps: u32) -> Self {
        self.target_frame_rate = fps;
        self
    }

    /// Set the fault policy
    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }
}

/// Physics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Whether a physics backend should simulate
    pub enabled: bool,
    /// Gravity in world units per second squared
    pub gravity: [f32; 3],
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gravity: [0.0, -9.81, 0.0],
        }
    }
}

impl PhysicsConfig {
    /// Gravity as a vector
    pub fn gravity(&self) -> Vec3 {
        vec3_from_array(self.gravity)
    }
}

/// Audio settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Whether an audio backend should produce sound
    pub enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Handling of a failing per-frame system update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// The failure ends the tick and is returned to the caller
    #[default]
    Propagate,
    /// The failure is logged and recorded; the rest of the tick still runs
    Isolate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(!config.physics.enabled);
        assert!(!config.debug);
        assert!(config.audio.enabled);
        assert_eq!(config.target_frame_rate, 0);
        assert_eq!(config.physics.gravity(), Vec3::new(0.0, -9.81, 0.0));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            debug = true
            width = 640

            [physics]
            enabled = true
        "#;
        let config = EngineConfig::from_format(ConfigFormat::Toml, text).unwrap();
        assert!(config.debug);
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 720);
        assert!(config.physics.enabled);
        assert_eq!(config.physics.gravity, [0.0, -9.81, 0.0]);
        assert_eq!(config.fault_policy, FaultPolicy::Propagate);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let text = r#"{ "height": 200, "vsync": true, "fault_policy": "isolate" }"#;
        let config = EngineConfig::from_format(ConfigFormat::Json, text).unwrap();
        assert_eq!(config.height, 200);
        assert_eq!(config.fault_policy, FaultPolicy::Isolate);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default()
            .with_surface("main-canvas")
            .with_physics([0.0, -1.0, 0.0])
            .with_target_frame_rate(30);
        let text = config.to_format(ConfigFormat::Toml).unwrap();
        let back = EngineConfig::from_format(ConfigFormat::Toml, &text).unwrap();
        assert_eq!(back, config);
    }
}

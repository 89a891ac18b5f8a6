//! System contract
//!
//! Every engine subsystem (renderer, input, physics, audio, assets) is a
//! [`System`]: a named, prioritised unit with an async initialize, a
//! synchronous per-frame update and a dispose.

use async_trait::async_trait;

use super::component::AsAny;
use crate::core::config::EngineConfig;
use crate::render::Renderer;

/// Registry names of the well-known subsystems
pub mod names {
    /// Renderer system; the engine renders through it every tick
    pub const RENDERER: &str = "Renderer";
    /// Input system
    pub const INPUT: &str = "Input";
    /// Physics system
    pub const PHYSICS: &str = "Physics";
    /// Audio system
    pub const AUDIO: &str = "Audio";
    /// Asset manager system
    pub const ASSET_MANAGER: &str = "AssetManager";
}

/// Failures reported by systems
#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    /// Free-form failure
    #[error("{0}")]
    Message(String),
}

impl SystemError {
    /// Build a [`SystemError::Message`]
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }
}

/// Lifecycle contract of an engine subsystem
#[async_trait(?Send)]
pub trait System: AsAny {
    /// Registry key, unique among the engine's systems
    fn name(&self) -> &str;

    /// Update order; lower runs first
    fn priority(&self) -> i32 {
        0
    }

    /// Acquire resources. Called once by `Engine::initialize`, awaited in
    /// priority order.
    async fn initialize(&mut self, config: &EngineConfig) -> Result<(), SystemError>;

    /// Per-frame work. Must not block; long work is started here and
    /// completed on a later tick.
    fn update(&mut self, delta_time: f32) -> Result<(), SystemError>;

    /// Release everything acquired since construction or initialize.
    /// Called at most once.
    fn dispose(&mut self) {}

    /// Renderer capability, when this system draws scenes
    fn as_renderer_mut(&mut self) -> Option<&mut dyn Renderer> {
        None
    }
}

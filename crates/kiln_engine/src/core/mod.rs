//! # Core Engine Module
//!
//! Shared configuration types used by the engine and by every system.
//!
//! ## Organization
//!
//! - **Config**: engine configuration handed to `Engine::initialize`
//! - **Foundation**: low-level utilities (math, ids, time, logging)
//! - **ECS**: component, entity and system contracts

pub mod config;

// Re-export foundation modules for convenience
pub use crate::ecs;
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{AudioConfig, EngineConfig, FaultPolicy, PhysicsConfig};
pub use crate::config::{Config, ConfigError};

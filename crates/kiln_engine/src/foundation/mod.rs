//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types
//! - Identifier generation
//! - Clocks, frame counting and frame pacing
//! - Logging utilities

pub mod ids;
pub mod logging;
pub mod math;
pub mod time;

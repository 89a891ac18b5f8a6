//! Rendering capability
//!
//! The engine does not draw by itself. Once per tick it hands the current
//! scene to the system registered as `"Renderer"`, reached through
//! [`System::as_renderer_mut`](crate::ecs::System::as_renderer_mut).
//! Concrete backends live outside this crate; [`HeadlessRenderer`] is the
//! built-in implementation for tests, tools and servers.

mod headless;

pub use headless::HeadlessRenderer;

use crate::ecs::SystemError;
use crate::scene::Scene;

/// Counters describing the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames rendered since initialize
    pub frames: u64,
    /// Visible mesh renderers drawn in the last frame
    pub draw_calls: usize,
    /// Lights in the last frame
    pub lights: usize,
    /// Whether the last frame had a main camera
    pub has_main_camera: bool,
}

/// Capability of drawing a scene to a surface
pub trait Renderer {
    /// Draw one frame of `scene`
    fn render(&mut self, scene: &Scene) -> Result<(), SystemError>;

    /// Resize the drawing surface, in logical pixels
    fn set_size(&mut self, width: u32, height: u32);

    /// Set physical pixels per logical pixel
    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Counters of the last frame
    fn stats(&self) -> RenderStats;
}

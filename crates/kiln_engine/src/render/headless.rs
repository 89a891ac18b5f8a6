//! Renderer that draws nothing and counts what it would have drawn

use async_trait::async_trait;

use super::{RenderStats, Renderer};
use crate::core::config::EngineConfig;
use crate::ecs::components::{Camera, Light, MeshRenderer};
use crate::ecs::{names, ComponentKind, System, SystemError};
use crate::foundation::logging::debug;
use crate::scene::Scene;

/// Off-screen renderer system, registered as `"Renderer"`
#[derive(Debug)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    pixel_ratio: f32,
    initialized: bool,
    stats: RenderStats,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    /// Update priority; after gameplay systems
    pub const PRIORITY: i32 = 100;

    /// Create an uninitialized renderer
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            pixel_ratio: 1.0,
            initialized: false,
            stats: RenderStats::default(),
        }
    }

    /// Surface size in logical pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Physical pixels per logical pixel
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }
}

#[async_trait(?Send)]
impl System for HeadlessRenderer {
    fn name(&self) -> &str {
        names::RENDERER
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    async fn initialize(&mut self, config: &EngineConfig) -> Result<(), SystemError> {
        self.set_size(config.width, config.height);
        self.set_pixel_ratio(config.pixel_ratio);
        self.initialized = true;
        debug!(
            "Headless renderer ready at {}x{} (x{})",
            self.width, self.height, self.pixel_ratio
        );
        Ok(())
    }

    fn update(&mut self, _delta_time: f32) -> Result<(), SystemError> {
        Ok(())
    }

    fn dispose(&mut self) {
        self.initialized = false;
    }

    fn as_renderer_mut(&mut self) -> Option<&mut dyn Renderer> {
        Some(self)
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, scene: &Scene) -> Result<(), SystemError> {
        if !self.initialized {
            return Err(SystemError::message("headless renderer is not initialized"));
        }

        let mut stats = RenderStats {
            frames: self.stats.frames + 1,
            ..RenderStats::default()
        };
        for id in scene.traverse() {
            let Some(entity) = scene.entity(id) else {
                continue;
            };
            if !entity.active {
                continue;
            }
            stats.draw_calls += entity
                .get_components(MeshRenderer::TYPE)
                .iter()
                .filter(|c| c.is_enabled())
                .filter_map(|c| crate::ecs::downcast_ref::<MeshRenderer>(c.component()))
                .filter(|m| m.is_visible())
                .count();
            stats.lights += entity.get_components(Light::TYPE).len();
            stats.has_main_camera |= entity.get::<Camera>().map_or(false, |c| c.is_main);
        }
        self.stats = stats;
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn stats(&self) -> RenderStats {
        self.stats
    }
}

//! Camera component

use crate::ecs::component::{Component, ComponentData, ComponentKind, ComponentType};

const DEFAULT_FOV: f32 = 75.0;
const DEFAULT_NEAR: f32 = 0.1;
const DEFAULT_FAR: f32 = 1000.0;

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Renderers draw from the main camera
    pub is_main: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DEFAULT_FOV, DEFAULT_NEAR, DEFAULT_FAR)
    }
}

impl Camera {
    /// Create a camera with explicit projection parameters
    pub fn new(fov: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            near,
            far,
            is_main: false,
        }
    }

    /// Builder: mark as the main camera
    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }
}

impl Component for Camera {
    fn component_type(&self) -> ComponentType {
        Self::TYPE
    }

    fn serialize(&self) -> ComponentData {
        ComponentData::new(Self::TYPE)
            .with("fov", self.fov)
            .with("near", self.near)
            .with("far", self.far)
            .with("isMain", self.is_main)
    }

    fn deserialize(&mut self, data: &ComponentData) {
        self.fov = data.f32_or("fov", DEFAULT_FOV);
        self.near = data.f32_or("near", DEFAULT_NEAR);
        self.far = data.f32_or("far", DEFAULT_FAR);
        self.is_main = data.bool_or("isMain", false);
    }
}

impl ComponentKind for Camera {
    const TYPE: ComponentType = ComponentType::new("Camera");
}

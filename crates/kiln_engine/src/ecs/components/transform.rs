//! Transform component
//!
//! Position, Euler rotation (radians, XYZ) and scale of an entity, all in the
//! entity's local space. Y is up.

use crate::ecs::component::{Component, ComponentData, ComponentKind, ComponentType};
use crate::foundation::math::Vec3;

/// Spatial transform of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Local position
    pub position: Vec3,
    /// Euler angles in radians
    pub rotation: Vec3,
    /// Per-axis scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from position, Euler rotation and scale
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Move by an offset
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Add to the Euler angles
    pub fn rotate(&mut self, angles: Vec3) {
        self.rotation += angles;
    }

    /// Point the forward (+Z) axis at `target` by setting yaw and pitch.
    /// Roll is left untouched.
    pub fn look_at(&mut self, target: Vec3) {
        let d = target - self.position;
        self.rotation.y = d.x.atan2(d.z);
        self.rotation.x = d.y.atan2((d.x * d.x + d.z * d.z).sqrt());
    }
}

impl Component for Transform {
    fn component_type(&self) -> ComponentType {
        Self::TYPE
    }

    fn serialize(&self) -> ComponentData {
        ComponentData::new(Self::TYPE)
            .with_vec3("position", self.position)
            .with_vec3("rotation", self.rotation)
            .with_vec3("scale", self.scale)
    }

    fn deserialize(&mut self, data: &ComponentData) {
        self.position = data.vec3_or("position", self.position);
        self.rotation = data.vec3_or("rotation", self.rotation);
        self.scale = data.vec3_or("scale", self.scale);
    }
}

impl ComponentKind for Transform {
    const TYPE: ComponentType = ComponentType::new("Transform");
}

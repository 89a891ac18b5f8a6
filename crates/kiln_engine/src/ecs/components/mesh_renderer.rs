//! Mesh renderer component

use crate::ecs::component::{Component, ComponentData, ComponentKind, ComponentType};

/// Draws a mesh with a material. Ids refer to assets owned by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRenderer {
    /// Mesh asset id
    pub mesh_id: String,
    /// Material asset id
    pub material_id: String,
    /// Whether the mesh casts shadows
    pub cast_shadows: bool,
    /// Whether the mesh receives shadows
    pub receive_shadows: bool,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl MeshRenderer {
    /// Create a renderer for a mesh/material pair
    pub fn new(mesh_id: impl Into<String>, material_id: impl Into<String>) -> Self {
        Self {
            mesh_id: mesh_id.into(),
            material_id: material_id.into(),
            cast_shadows: true,
            receive_shadows: true,
        }
    }

    /// A renderer without a mesh draws nothing
    pub fn is_visible(&self) -> bool {
        !self.mesh_id.is_empty()
    }
}

impl Component for MeshRenderer {
    fn component_type(&self) -> ComponentType {
        Self::TYPE
    }

    fn serialize(&self) -> ComponentData {
        ComponentData::new(Self::TYPE)
            .with("meshId", self.mesh_id.clone())
            .with("materialId", self.material_id.clone())
            .with("castShadows", self.cast_shadows)
            .with("receiveShadows", self.receive_shadows)
    }

    fn deserialize(&mut self, data: &ComponentData) {
        self.mesh_id = data.str_or("meshId", "");
        self.material_id = data.str_or("materialId", "");
        self.cast_shadows = data.bool_or("castShadows", true);
        self.receive_shadows = data.bool_or("receiveShadows", true);
    }
}

impl ComponentKind for MeshRenderer {
    const TYPE: ComponentType = ComponentType::new("MeshRenderer");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cast_and_receive_shadows() {
        let mut renderer = MeshRenderer::new("cube", "red");
        renderer.cast_shadows = false;
        renderer.deserialize(&ComponentData::new(MeshRenderer::TYPE).with("meshId", "sphere"));
        assert_eq!(renderer.mesh_id, "sphere");
        assert_eq!(renderer.material_id, "");
        assert!(renderer.cast_shadows);
        assert!(renderer.receive_shadows);
    }
}

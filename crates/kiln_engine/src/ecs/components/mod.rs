//! Built-in components

pub mod camera;
pub mod light;
pub mod mesh_renderer;
pub mod script;
pub mod transform;

pub use camera::Camera;
pub use light::{Light, LightType};
pub use mesh_renderer::MeshRenderer;
pub use script::{Script, ScriptBehavior};
pub use transform::Transform;

//! Light component
//!
//! Describes a light source for the renderer. Position and direction come
//! from the owning entity's [`Transform`](super::Transform).

use serde_json::{Map, Value};
use std::f32::consts::FRAC_PI_3;
use std::fmt;
use std::str::FromStr;

use crate::ecs::component::{Component, ComponentData, ComponentKind, ComponentType};
use crate::foundation::math::Vec3;

/// Kinds of light supported by renderers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LightType {
    /// Parallel rays, like sunlight
    Directional,
    /// Radiates in all directions from a position
    #[default]
    Point,
    /// Cone of light from a position
    Spot,
    /// Uniform light with no direction
    Ambient,
}

impl LightType {
    /// Serialized name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directional => "directional",
            Self::Point => "point",
            Self::Spot => "spot",
            Self::Ambient => "ambient",
        }
    }
}

impl fmt::Display for LightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "directional" => Ok(Self::Directional),
            "point" => Ok(Self::Point),
            "spot" => Ok(Self::Spot),
            "ambient" => Ok(Self::Ambient),
            other => Err(format!("unknown light type '{other}'")),
        }
    }
}

/// Light source parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Kind of light
    pub light_type: LightType,
    /// Linear RGB color, 0..1 per channel
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Whether the light casts shadows
    pub cast_shadows: bool,
    /// Cutoff distance for point and spot lights; 0 means no limit
    pub distance: f32,
    /// Attenuation exponent for point and spot lights
    pub decay: f32,
    /// Spot cone angle in radians
    pub angle: f32,
    /// Spot edge softness, 0..1
    pub penumbra: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self::new(LightType::Point)
    }
}

impl Light {
    /// White light of the given kind with default parameters
    pub fn new(light_type: LightType) -> Self {
        Self {
            light_type,
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            cast_shadows: false,
            distance: 0.0,
            decay: 1.0,
            angle: FRAC_PI_3,
            penumbra: 0.0,
        }
    }

    /// Builder: set color and intensity
    pub fn with_color(mut self, color: Vec3, intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    /// Builder: enable shadows
    pub fn with_shadows(mut self) -> Self {
        self.cast_shadows = true;
        self
    }
}

fn color_to_value(color: Vec3) -> Value {
    let mut map = Map::new();
    map.insert("r".into(), Value::from(color.x));
    map.insert("g".into(), Value::from(color.y));
    map.insert("b".into(), Value::from(color.z));
    Value::Object(map)
}

fn color_from_value(value: Option<&Value>, fallback: Vec3) -> Vec3 {
    let Some(Value::Object(map)) = value else {
        return fallback;
    };
    let channel = |key: &str, default: f32| {
        map.get(key)
            .and_then(Value::as_f64)
            .map_or(default, |v| v as f32)
    };
    Vec3::new(
        channel("r", fallback.x),
        channel("g", fallback.y),
        channel("b", fallback.z),
    )
}

impl Component for Light {
    fn component_type(&self) -> ComponentType {
        Self::TYPE
    }

    fn serialize(&self) -> ComponentData {
        ComponentData::new(Self::TYPE)
            .with("lightType", self.light_type.as_str())
            .with("color", color_to_value(self.color))
            .with("intensity", self.intensity)
            .with("castShadows", self.cast_shadows)
            .with("distance", self.distance)
            .with("decay", self.decay)
            .with("angle", self.angle)
            .with("penumbra", self.penumbra)
    }

    fn deserialize(&mut self, data: &ComponentData) {
        self.light_type = data.str_or("lightType", "point").parse().unwrap_or_default();
        self.color = color_from_value(data.get("color"), self.color);
        self.intensity = data.f32_or("intensity", 1.0);
        self.cast_shadows = data.bool_or("castShadows", false);
        self.distance = data.f32_or("distance", 0.0);
        self.decay = data.f32_or("decay", 1.0);
        self.angle = data.f32_or("angle", FRAC_PI_3);
        self.penumbra = data.f32_or("penumbra", 0.0);
    }
}

impl ComponentKind for Light {
    const TYPE: ComponentType = ComponentType::new("Light");
}

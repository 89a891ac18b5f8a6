//! Spinning cube demo
//!
//! Builds a small scene (camera, two lights and a scripted cube) and runs it
//! through the headless renderer for a few seconds.
//!
//! ```text
//! spin_demo [CONFIG] [--seconds <SECONDS>]
//! ```

use async_trait::async_trait;
use clap::Parser;
use kiln_engine::ecs::names;
use kiln_engine::foundation::logging::{self, debug, info};
use kiln_engine::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Parser, Debug)]
#[command(name = "spin_demo", about = "Spinning cube demo on the headless renderer")]
struct Args {
    /// Engine config file (.toml, .ron or .json)
    config: Option<PathBuf>,

    /// Seconds to run before stopping
    #[arg(long, default_value_t = 3.0)]
    seconds: f64,
}

impl Args {
    fn run_for(&self) -> Result<Duration, DemoError> {
        Duration::try_from_secs_f64(self.seconds)
            .map_err(|_| DemoError::InvalidArgument(format!("bad duration '{}'", self.seconds)))
    }
}

/// Rotates the owning transform about y and reports each full turn
struct SpinScript {
    speed: f32,
    turns: u32,
}

impl SpinScript {
    const fn new(speed: f32) -> Self {
        Self { speed, turns: 0 }
    }
}

impl ScriptBehavior for SpinScript {
    fn script_name(&self) -> &str {
        "Spin"
    }

    fn on_awake(&mut self, entity: EntityId) {
        debug!("Spin script attached to {entity}");
    }

    fn update(&mut self, delta_time: f32, entity: &mut Siblings<'_>) {
        let Some(transform) = entity.get_mut::<Transform>() else {
            return;
        };
        transform.rotate(Vec3::new(0.0, self.speed * delta_time, 0.0));
        if transform.rotation.y >= std::f32::consts::TAU {
            transform.rotation.y -= std::f32::consts::TAU;
            self.turns += 1;
            info!("Cube completed turn {}", self.turns);
        }
    }
}

struct DemoScene;

#[async_trait(?Send)]
impl SceneHooks for DemoScene {
    async fn on_load(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        let ids = scene.id_source().clone();

        let mut camera = Entity::new(&ids, "MainCamera");
        let mut view = Transform::from_position(Vec3::new(0.0, 2.0, 5.0));
        view.look_at(Vec3::zeros());
        camera.add_component(view);
        camera.add_component(Camera::default().main());
        scene.add_entity(camera);

        let mut sun = Entity::new(&ids, "DirectionalLight");
        sun.add_component(Transform::from_position(Vec3::new(5.0, 10.0, 5.0)));
        sun.add_component(Light::new(LightType::Directional).with_shadows());
        scene.add_entity(sun);

        let mut ambient = Entity::new(&ids, "AmbientLight");
        ambient.add_component(Light::new(LightType::Ambient).with_color(Vec3::new(1.0, 1.0, 1.0), 0.3));
        scene.add_entity(ambient);

        let mut cube = Entity::new(&ids, "Cube");
        cube.add_tag("interactable");
        cube.add_component(Transform::identity());
        cube.add_component(MeshRenderer::new("cube", "defaultMaterial"));
        cube.add_component(Script::new(SpinScript::new(std::f32::consts::PI)));
        scene.add_entity(cube);

        info!("Demo scene built with {} entities", scene.entity_count());
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), DemoError> {
    logging::init();
    let args = Args::parse();
    let run_for = args.run_for()?;

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_file(&path.to_string_lossy())?,
        None => EngineConfig::default()
            .with_size(1280, 720)
            .with_target_frame_rate(60),
    };

    let mut engine = Engine::new();
    engine.register_system(InputSystem::new());
    engine.register_system(HeadlessRenderer::new());
    engine.initialize(config).await?;
    engine
        .load_scene(Scene::new("Demo").with_hooks(DemoScene))
        .await?;

    let handle = engine.handle();
    let stopper = async {
        tokio::time::sleep(run_for).await;
        handle.stop();
    };
    let (result, ()) = tokio::join!(engine.run(), stopper);
    result?;

    if let Some(renderer) = engine.system::<HeadlessRenderer>(names::RENDERER) {
        let stats = renderer.stats();
        info!(
            "Rendered {} frames, {} draw calls and {} lights in the last frame (fps {})",
            stats.frames,
            stats.draw_calls,
            stats.lights,
            engine.fps()
        );
    }

    engine.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spinning_cube(speed: f32) -> Entity {
        let mut cube = Entity::new(&kiln_engine::foundation::ids::SequentialIds::shared(), "Cube");
        cube.add_component(Transform::identity());
        cube.add_component(Script::new(SpinScript::new(speed)));
        cube
    }

    fn yaw(cube: &Entity) -> f32 {
        cube.get::<Transform>().map_or(f32::NAN, |t| t.rotation.y)
    }

    #[test]
    fn test_spin_advances_rotation_by_speed_times_delta() {
        let mut cube = spinning_cube(1.5);
        cube.update(0.2);
        assert_relative_eq!(yaw(&cube), 0.3, epsilon = 1e-6);
        cube.update(0.1);
        assert_relative_eq!(yaw(&cube), 0.45, epsilon = 1e-6);
    }

    #[test]
    fn test_spin_wraps_after_full_turn() {
        let mut cube = spinning_cube(std::f32::consts::PI);
        for _ in 0..5 {
            cube.update(0.5);
        }
        assert_relative_eq!(yaw(&cube), std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn test_args_parse_seconds_and_config() {
        let args = Args::parse_from(["spin_demo", "engine.toml", "--seconds", "1.5"]);
        assert_eq!(args.config, Some(PathBuf::from("engine.toml")));
        assert_eq!(args.run_for().unwrap(), Duration::from_millis(1500));

        let defaults = Args::parse_from(["spin_demo"]);
        assert!(defaults.config.is_none());
        assert_eq!(defaults.run_for().unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn test_negative_seconds_rejected() {
        let args = Args::parse_from(["spin_demo", "--seconds=-1"]);
        assert!(matches!(args.run_for(), Err(DemoError::InvalidArgument(_))));
    }
}

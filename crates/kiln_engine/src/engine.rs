//! Core engine implementation
//!
//! The engine owns the system registry and the current scene and drives both
//! from a timed loop. Each tick:
//!
//! 1. queued [`EngineCommand`]s are applied,
//! 2. the raw delta is measured and scaled by the time scale,
//! 3. the fps counter advances with the raw delta,
//! 4. unless paused, systems update in priority order, then the scene,
//! 5. the renderer draws the current scene, paused or not,
//! 6. the delay until the next tick is derived from the frame budget.

use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::config::ConfigError;
use crate::core::config::{EngineConfig, FaultPolicy};
use crate::ecs::{names, System, SystemError, SystemFault, SystemScheduler};
use crate::foundation::logging::{debug, error, info, warn};
use crate::foundation::time::{frame_budget, Clock, FpsCounter, FramePacer, SystemClock, TokioPacer};
use crate::scene::{Scene, SceneError};

/// Lifecycle state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed; systems may be registered
    Uninitialized,
    /// Every system initialized; the loop has not started
    Initialized,
    /// Ticks dispatch updates and renders
    Running,
    /// Ticks render but do not update
    Paused,
    /// The loop was stopped; `start` resumes it
    Stopped,
}

/// Request delivered to a running engine through an [`EngineHandle`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    /// Stop the loop
    Stop,
    /// Pause updates
    Pause,
    /// Resume updates
    Resume,
    /// Change the time scale
    SetTimeScale(f32),
    /// Change the target frame rate (0 = unlimited)
    SetTargetFrameRate(u32),
}

/// Cloneable remote control for an engine.
///
/// Commands are applied at the start of the next tick. A running loop
/// finishes its frame wait first unless the command is a stop.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    /// Queue a command; false if the engine is gone
    pub fn send(&self, command: EngineCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Stop the loop
    pub fn stop(&self) -> bool {
        self.send(EngineCommand::Stop)
    }

    /// Pause updates
    pub fn pause(&self) -> bool {
        self.send(EngineCommand::Pause)
    }

    /// Resume updates
    pub fn resume(&self) -> bool {
        self.send(EngineCommand::Resume)
    }

    /// Change the time scale
    pub fn set_time_scale(&self, scale: f32) -> bool {
        self.send(EngineCommand::SetTimeScale(scale))
    }

    /// Change the target frame rate
    pub fn set_target_frame_rate(&self, fps: u32) -> bool {
        self.send(EngineCommand::SetTargetFrameRate(fps))
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Unscaled seconds since the previous tick
    pub raw_delta: f32,
    /// Scaled seconds handed to updates; 0 while paused
    pub delta_time: f32,
    /// Whether updates were skipped
    pub paused: bool,
    /// Whether the renderer drew the current scene
    pub rendered: bool,
    /// Faults isolated during this tick
    pub faults: usize,
    /// How long to wait before the next tick; `None` when unlimited
    pub next_delay: Option<Duration>,
}

/// Engine errors
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The engine has not been initialized
    #[error("Engine is not initialized")]
    NotInitialized,

    /// `initialize` was called on an initialized engine
    #[error("Engine is already initialized")]
    AlreadyInitialized,

    /// A system failed to initialize
    #[error("System '{system}' failed to initialize: {source}")]
    SystemInitialization {
        /// Failing system
        system: String,
        /// Underlying error
        source: SystemError,
    },

    /// A system failed during a tick
    #[error("System '{system}' failed to update: {source}")]
    SystemUpdate {
        /// Failing system
        system: String,
        /// Underlying error
        source: SystemError,
    },

    /// Scene lifecycle error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Main engine struct
///
/// The engine coordinates all systems, owns the current scene and runs the
/// game loop.
pub struct Engine {
    config: EngineConfig,
    state: EngineState,
    systems: SystemScheduler,
    scene: Option<Scene>,

    clock: Box<dyn Clock>,
    pacer: Box<dyn FramePacer>,
    command_tx: UnboundedSender<EngineCommand>,
    commands: UnboundedReceiver<EngineCommand>,

    time_scale: f32,
    target_frame_rate: u32,
    last_time: Duration,
    delta_time: f32,
    total_time: f64,
    fps: FpsCounter,
    frames: u64,
    faults: Vec<SystemFault>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine timed by the wall clock and paced by tokio timers
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }

    /// Create an engine reading time from `clock`
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        let (command_tx, commands) = unbounded_channel();
        let config = EngineConfig::default();
        Self {
            time_scale: config.time_scale,
            target_frame_rate: config.target_frame_rate,
            config,
            state: EngineState::Uninitialized,
            systems: SystemScheduler::new(),
            scene: None,
            clock: Box::new(clock),
            pacer: Box::new(TokioPacer),
            command_tx,
            commands,
            last_time: Duration::ZERO,
            delta_time: 0.0,
            total_time: 0.0,
            fps: FpsCounter::new(),
            frames: 0,
            faults: Vec::new(),
        }
    }

    /// Builder: wait between ticks with `pacer`
    pub fn with_pacer(mut self, pacer: impl FramePacer + 'static) -> Self {
        self.pacer = Box::new(pacer);
        self
    }

    /// Remote control for this engine
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            commands: self.command_tx.clone(),
        }
    }

    // Systems

    /// Register a system under its name. A system already registered under
    /// that name is replaced and returned.
    pub fn register_system(&mut self, system: impl System) -> Option<Box<dyn System>> {
        self.register_boxed_system(Box::new(system))
    }

    /// Register an already boxed system
    pub fn register_boxed_system(&mut self, system: Box<dyn System>) -> Option<Box<dyn System>> {
        if self.state != EngineState::Uninitialized {
            warn!(
                "System '{}' registered after initialize; it will not be initialized",
                system.name()
            );
        }
        self.systems.register(system)
    }

    /// Unregister a system, disposing it
    pub fn remove_system(&mut self, name: &str) -> Option<Box<dyn System>> {
        self.systems.remove(name)
    }

    /// Typed system lookup
    pub fn system<T: System>(&self, name: &str) -> Option<&T> {
        self.systems.get_as(name)
    }

    /// Typed mutable system lookup
    pub fn system_mut<T: System>(&mut self, name: &str) -> Option<&mut T> {
        self.systems.get_as_mut(name)
    }

    /// Whether a system is registered under `name`
    pub fn has_system(&self, name: &str) -> bool {
        self.systems.contains(name)
    }

    /// Toggle a system's per-frame updates; false if absent
    pub fn set_system_enabled(&mut self, name: &str, enabled: bool) -> bool {
        self.systems.set_enabled(name, enabled)
    }

    /// Registered system names in update order
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.names()
    }

    // Lifecycle

    /// Initialize every registered system in priority order.
    ///
    /// The first failure aborts the call and leaves the engine
    /// uninitialized. Systems that already succeeded are not initialized
    /// again by a retry.
    pub async fn initialize(&mut self, config: EngineConfig) -> Result<(), EngineError> {
        if self.state != EngineState::Uninitialized {
            return Err(EngineError::AlreadyInitialized);
        }
        info!("Initializing engine with {} systems", self.systems.len());

        self.time_scale = config.time_scale.max(0.0);
        self.target_frame_rate = config.target_frame_rate;
        self.config = config;

        if let Err(fault) = self.systems.initialize_all(&self.config).await {
            error!("System '{}' failed to initialize: {}", fault.system, fault.error);
            return Err(EngineError::SystemInitialization {
                system: fault.system,
                source: fault.error,
            });
        }

        self.state = EngineState::Initialized;
        info!("Engine initialized");
        Ok(())
    }

    /// Start the loop. No-op when already running.
    pub fn start(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Uninitialized => Err(EngineError::NotInitialized),
            EngineState::Running | EngineState::Paused => Ok(()),
            EngineState::Initialized | EngineState::Stopped => {
                self.last_time = self.clock.now();
                self.state = EngineState::Running;
                info!("Engine started");
                Ok(())
            }
        }
    }

    /// Stop the loop. No-op when not running.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.state = EngineState::Stopped;
            info!("Engine stopped after {} frames", self.frames);
        }
    }

    /// Suspend updates; rendering continues
    pub fn pause(&mut self) {
        if self.state == EngineState::Running {
            self.state = EngineState::Paused;
            debug!("Engine paused");
        }
    }

    /// Resume updates without a delta spike for the paused interval
    pub fn resume(&mut self) {
        if self.state == EngineState::Paused {
            self.last_time = self.clock.now();
            self.state = EngineState::Running;
            debug!("Engine resumed");
        }
    }

    /// Set the simulation speed multiplier; negative values clamp to 0
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Set the target frame rate; 0 means unlimited
    pub fn set_target_frame_rate(&mut self, fps: u32) {
        self.target_frame_rate = fps;
    }

    fn apply_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Stop => self.stop(),
            EngineCommand::Pause => self.pause(),
            EngineCommand::Resume => self.resume(),
            EngineCommand::SetTimeScale(scale) => self.set_time_scale(scale),
            EngineCommand::SetTargetFrameRate(fps) => self.set_target_frame_rate(fps),
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply_command(command);
        }
    }

    // Scenes

    /// Make `scene` current.
    ///
    /// The previous scene is deactivated and fully unloaded before the new
    /// one loads; the new scene becomes current only once its load has
    /// completed, and is then activated. Returns the previous scene.
    pub async fn load_scene(&mut self, scene: Scene) -> Result<Option<Scene>, EngineError> {
        let previous = self.unload_scene().await?;

        let mut scene = scene;
        scene.load().await?;
        scene.activate();
        info!("Scene '{}' is now current", scene.name);
        self.scene = Some(scene);
        Ok(previous)
    }

    /// Deactivate and unload the current scene, returning it
    pub async fn unload_scene(&mut self) -> Result<Option<Scene>, EngineError> {
        let Some(mut scene) = self.scene.take() else {
            return Ok(None);
        };
        scene.deactivate();
        if let Err(err) = scene.unload().await {
            self.scene = Some(scene);
            return Err(err.into());
        }
        debug!("Scene '{}' unloaded", scene.name);
        Ok(Some(scene))
    }

    /// The current scene
    pub fn current_scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// The current scene, mutably
    pub fn current_scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    // Loop

    fn record_fault(&mut self, fault: SystemFault) {
        error!("System '{}' failed: {}", fault.system, fault.error);
        self.faults.push(fault);
    }

    /// Run one tick. Returns `None` without doing anything when the engine
    /// is not running.
    pub fn tick(&mut self) -> Result<Option<TickReport>, EngineError> {
        self.drain_commands();
        if !self.is_running() {
            return Ok(None);
        }

        let started = self.clock.now();
        let raw_delta = started.saturating_sub(self.last_time).as_secs_f32();
        self.last_time = started;
        self.frames += 1;
        self.fps.record(raw_delta);

        let paused = self.state == EngineState::Paused;
        let policy = self.config.fault_policy;
        let mut faults = 0;

        if paused {
            self.delta_time = 0.0;
        } else {
            let delta_time = raw_delta * self.time_scale;
            self.delta_time = delta_time;
            self.total_time += f64::from(delta_time);

            match self.systems.update_all(delta_time, policy) {
                Ok(isolated) => {
                    faults += isolated.len();
                    for fault in isolated {
                        self.record_fault(fault);
                    }
                }
                Err(fault) => {
                    error!("System '{}' failed to update: {}", fault.system, fault.error);
                    return Err(EngineError::SystemUpdate {
                        system: fault.system,
                        source: fault.error,
                    });
                }
            }

            if let Some(scene) = self.scene.as_mut().filter(|s| s.is_loaded()) {
                scene.update(delta_time);
            }
        }

        let rendered = match (self.systems.renderer_mut(), self.scene.as_ref()) {
            (Some(renderer), Some(scene)) => Some(renderer.render(scene)),
            _ => None,
        };
        let rendered_frame = rendered.is_some();
        if let Some(Err(error)) = rendered {
            let fault = SystemFault {
                system: names::RENDERER.to_string(),
                error,
            };
            match policy {
                FaultPolicy::Propagate => {
                    error!("Renderer failed: {}", fault.error);
                    return Err(EngineError::SystemUpdate {
                        system: fault.system,
                        source: fault.error,
                    });
                }
                FaultPolicy::Isolate => {
                    faults += 1;
                    self.record_fault(fault);
                }
            }
        }

        let next_delay = frame_budget(self.target_frame_rate).map(|budget| {
            let worked = self.clock.now().saturating_sub(started);
            budget.saturating_sub(worked)
        });

        Ok(Some(TickReport {
            raw_delta,
            delta_time: self.delta_time,
            paused,
            rendered: rendered_frame,
            faults,
            next_delay,
        }))
    }

    /// Start the engine and tick until it is stopped.
    ///
    /// Between ticks the loop waits out the frame budget on the pacer.
    /// Commands received meanwhile are applied once the wait ends; only a
    /// stop cuts the wait short.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        self.start()?;
        while let Some(report) = self.tick()? {
            for command in self.wait_for_next_tick(report.next_delay).await {
                self.apply_command(command);
            }
        }
        Ok(())
    }

    async fn wait_for_next_tick(&mut self, delay: Option<Duration>) -> Vec<EngineCommand> {
        let mut received = Vec::new();
        let mut wait = self.pacer.wait(delay);
        loop {
            tokio::select! {
                () = &mut wait => break,
                command = self.commands.recv() => match command {
                    Some(EngineCommand::Stop) => {
                        received.push(EngineCommand::Stop);
                        break;
                    }
                    Some(command) => received.push(command),
                    None => {
                        (&mut wait).await;
                        break;
                    }
                },
            }
        }
        received
    }

    /// Stop, unload the current scene and dispose every system once, in
    /// reverse update order
    pub async fn shutdown(&mut self) -> Result<(), EngineError> {
        self.stop();
        let unloaded = self.unload_scene().await;
        self.systems.dispose_all();
        info!("Engine shutdown complete");
        unloaded.map(|_| ())
    }

    // Accessors

    /// Lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether the loop is running (paused counts as running)
    pub fn is_running(&self) -> bool {
        matches!(self.state, EngineState::Running | EngineState::Paused)
    }

    /// Whether updates are suspended
    pub fn is_paused(&self) -> bool {
        self.state == EngineState::Paused
    }

    /// Frames counted over the last full second of real time
    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    /// Scaled delta of the last tick, in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Scaled time accumulated over unpaused ticks, in seconds
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Current time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Current target frame rate
    pub fn target_frame_rate(&self) -> u32 {
        self.target_frame_rate
    }

    /// Ticks run since construction
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Configuration passed to `initialize`
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Faults isolated so far
    pub fn faults(&self) -> &[SystemFault] {
        &self.faults
    }

    /// Take and clear the isolated faults
    pub fn take_faults(&mut self) -> Vec<SystemFault> {
        std::mem::take(&mut self.faults)
    }
}

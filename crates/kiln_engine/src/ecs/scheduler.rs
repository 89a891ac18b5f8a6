//! System scheduling
//!
//! Keeps registered systems in deterministic execution order: ascending
//! priority, ties broken by registration order. Execution is sequential on
//! the calling thread.

use super::system::{names, System, SystemError};
use crate::core::config::{EngineConfig, FaultPolicy};
use crate::foundation::logging::{debug, warn};
use crate::render::Renderer;

/// A failure raised by one system
#[derive(Debug)]
pub struct SystemFault {
    /// Name of the failing system
    pub system: String,
    /// What went wrong
    pub error: SystemError,
}

struct SystemEntry {
    system: Box<dyn System>,
    priority: i32,
    seq: u64,
    enabled: bool,
    initialized: bool,
    disposed: bool,
}

impl SystemEntry {
    fn dispose(&mut self) {
        if !self.disposed {
            debug!("Disposing system '{}'", self.system.name());
            self.system.dispose();
            self.disposed = true;
        }
    }
}

/// Ordered registry of systems keyed by name
#[derive(Default)]
pub struct SystemScheduler {
    entries: Vec<SystemEntry>,
    next_seq: u64,
}

impl SystemScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.system.name() == name)
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| (e.priority, e.seq));
    }

    /// Register a system under its name.
    ///
    /// A system already registered under that name is replaced and handed
    /// back without being disposed. The replacement keeps the earlier
    /// registration slot for tie-breaking.
    pub fn register(&mut self, system: Box<dyn System>) -> Option<Box<dyn System>> {
        let priority = system.priority();
        let replaced = match self.position(system.name()) {
            Some(index) => {
                warn!(
                    "System '{}' registered twice; replacing the earlier registration",
                    system.name()
                );
                let entry = &mut self.entries[index];
                entry.priority = priority;
                entry.enabled = true;
                entry.initialized = false;
                entry.disposed = false;
                Some(std::mem::replace(&mut entry.system, system))
            }
            None => {
                debug!(
                    "Registering system '{}' with priority {priority}",
                    system.name()
                );
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.push(SystemEntry {
                    system,
                    priority,
                    seq,
                    enabled: true,
                    initialized: false,
                    disposed: false,
                });
                None
            }
        };
        self.sort();
        replaced
    }

    /// Unregister a system, disposing it first
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn System>> {
        let index = self.position(name)?;
        let mut entry = self.entries.remove(index);
        entry.dispose();
        debug!("Removed system '{name}'");
        Some(entry.system)
    }

    /// Look up a system by name
    pub fn get(&self, name: &str) -> Option<&(dyn System + 'static)> {
        self.entries
            .iter()
            .find(|e| e.system.name() == name)
            .map(|e| &*e.system)
    }

    /// Mutable lookup by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn System + 'static)> {
        self.entries
            .iter_mut()
            .find(|e| e.system.name() == name)
            .map(|e| &mut *e.system)
    }

    /// Typed lookup; `None` if absent or of another type
    pub fn get_as<T: System>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(|s| s.as_any().downcast_ref::<T>())
    }

    /// Typed mutable lookup
    pub fn get_as_mut<T: System>(&mut self, name: &str) -> Option<&mut T> {
        self.get_mut(name)
            .and_then(|s| s.as_any_mut().downcast_mut::<T>())
    }

    /// Whether a system is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Toggle per-frame updates; false if no such system
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.position(name) {
            Some(index) => {
                self.entries[index].enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Whether a system receives per-frame updates
    pub fn is_enabled(&self, name: &str) -> bool {
        self.position(name)
            .map_or(false, |index| self.entries[index].enabled)
    }

    /// System names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.system.name()).collect()
    }

    /// Number of registered systems
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no system is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renderer capability of the system registered as
    /// [`names::RENDERER`], if any
    pub fn renderer_mut(&mut self) -> Option<&mut dyn Renderer> {
        self.get_mut(names::RENDERER)
            .and_then(|s| s.as_renderer_mut())
    }

    /// Initialize every system not yet initialized, one at a time in
    /// execution order.
    ///
    /// Stops at the first failure. Systems initialized before it stay
    /// initialized and are skipped by a later call.
    pub async fn initialize_all(&mut self, config: &EngineConfig) -> Result<(), SystemFault> {
        for entry in self.entries.iter_mut().filter(|e| !e.initialized) {
            debug!("Initializing system '{}'", entry.system.name());
            let result = entry.system.initialize(config).await;
            if let Err(error) = result {
                return Err(SystemFault {
                    system: entry.system.name().to_string(),
                    error,
                });
            }
            entry.initialized = true;
        }
        Ok(())
    }

    /// Run one update on every enabled system in execution order.
    ///
    /// With [`FaultPolicy::Propagate`] the first failure ends the pass and is
    /// returned as `Err`. With [`FaultPolicy::Isolate`] every failure is
    /// collected and the remaining systems still run.
    pub fn update_all(
        &mut self,
        delta_time: f32,
        policy: FaultPolicy,
    ) -> Result<Vec<SystemFault>, SystemFault> {
        let mut faults = Vec::new();
        for entry in self.entries.iter_mut().filter(|e| e.enabled) {
            if let Err(error) = entry.system.update(delta_time) {
                let fault = SystemFault {
                    system: entry.system.name().to_string(),
                    error,
                };
                match policy {
                    FaultPolicy::Propagate => return Err(fault),
                    FaultPolicy::Isolate => faults.push(fault),
                }
            }
        }
        Ok(faults)
    }

    /// Dispose every system in reverse execution order. Each system is
    /// disposed at most once; systems stay registered.
    pub fn dispose_all(&mut self) {
        for entry in self.entries.iter_mut().rev() {
            entry.dispose();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) type CallLog = Rc<RefCell<Vec<String>>>;

    /// Configurable system recording every lifecycle call
    pub(crate) struct TestSystem {
        pub name: String,
        pub priority: i32,
        pub log: CallLog,
        pub fail_initialize: bool,
        pub fail_update: bool,
        pub updates: u32,
    }

    impl TestSystem {
        pub(crate) fn new(name: &str, priority: i32, log: &CallLog) -> Self {
            Self {
                name: name.to_string(),
                priority,
                log: Rc::clone(log),
                fail_initialize: false,
                fail_update: false,
                updates: 0,
            }
        }

        pub(crate) fn failing_initialize(mut self) -> Self {
            self.fail_initialize = true;
            self
        }

        pub(crate) fn failing_update(mut self) -> Self {
            self.fail_update = true;
            self
        }

        pub(crate) fn boxed(self) -> Box<dyn System> {
            Box::new(self)
        }
    }

    #[async_trait(?Send)]
    impl System for TestSystem {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn initialize(&mut self, _config: &EngineConfig) -> Result<(), SystemError> {
            self.log.borrow_mut().push(format!("init:{}", self.name));
            if self.fail_initialize {
                return Err(SystemError::message("device unavailable"));
            }
            Ok(())
        }

        fn update(&mut self, _delta_time: f32) -> Result<(), SystemError> {
            self.updates += 1;
            self.log.borrow_mut().push(format!("update:{}", self.name));
            if self.fail_update {
                return Err(SystemError::message("update failed"));
            }
            Ok(())
        }

        fn dispose(&mut self) {
            self.log.borrow_mut().push(format!("dispose:{}", self.name));
        }
    }

    pub(crate) fn new_log() -> CallLog {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn calls(log: &CallLog, prefix: &str) -> Vec<String> {
        log.borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn scheduler_with(priorities: &[(&str, i32)], log: &CallLog) -> SystemScheduler {
        let mut scheduler = SystemScheduler::new();
        for &(name, priority) in priorities {
            scheduler.register(TestSystem::new(name, priority, log).boxed());
        }
        scheduler
    }

    #[tokio::test]
    async fn test_priority_order_for_initialize_and_update() {
        let log = new_log();
        let mut scheduler =
            scheduler_with(&[("p50", 50), ("m10", -10), ("p100", 100), ("zero", 0)], &log);

        scheduler.initialize_all(&EngineConfig::default()).await.unwrap();
        scheduler.update_all(0.016, FaultPolicy::Propagate).unwrap();

        assert_eq!(calls(&log, "init"), vec!["init:m10", "init:zero", "init:p50", "init:p100"]);
        assert_eq!(
            calls(&log, "update"),
            vec!["update:m10", "update:zero", "update:p50", "update:p100"]
        );
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let log = new_log();
        let scheduler = scheduler_with(&[("first", 5), ("second", 5), ("early", 1)], &log);
        assert_eq!(scheduler.names(), vec!["early", "first", "second"]);
    }

    #[test]
    fn test_reregistration_replaces_in_place() {
        let log = new_log();
        let mut scheduler = scheduler_with(&[("a", 0), ("b", 0), ("c", 0)], &log);

        let old = scheduler.register(TestSystem::new("a", 0, &log).boxed());
        assert!(old.is_some());
        assert_eq!(scheduler.len(), 3);
        assert_eq!(scheduler.names(), vec!["a", "b", "c"]);
        assert!(calls(&log, "dispose").is_empty());
    }

    #[test]
    fn test_last_registration_wins() {
        let log = new_log();
        let mut scheduler = SystemScheduler::new();
        let mut first = TestSystem::new("Physics", 0, &log);
        first.updates = 100;
        scheduler.register(first.boxed());
        scheduler.register(TestSystem::new("Physics", 0, &log).boxed());

        assert_eq!(scheduler.get_as::<TestSystem>("Physics").map(|s| s.updates), Some(0));
    }

    #[tokio::test]
    async fn test_initialize_failure_stops_and_retry_skips_done() {
        let log = new_log();
        let mut scheduler = SystemScheduler::new();
        scheduler.register(TestSystem::new("ok", 0, &log).boxed());
        scheduler.register(TestSystem::new("bad", 1, &log).failing_initialize().boxed());
        scheduler.register(TestSystem::new("later", 2, &log).boxed());

        let fault = scheduler
            .initialize_all(&EngineConfig::default())
            .await
            .unwrap_err();
        assert_eq!(fault.system, "bad");
        assert_eq!(calls(&log, "init"), vec!["init:ok", "init:bad"]);

        scheduler.register(TestSystem::new("bad", 1, &log).boxed());
        scheduler.initialize_all(&EngineConfig::default()).await.unwrap();
        assert_eq!(
            calls(&log, "init"),
            vec!["init:ok", "init:bad", "init:bad", "init:later"]
        );
    }

    #[test]
    fn test_update_fault_policies() {
        crate::foundation::logging::init_for_tests();
        let log = new_log();
        let mut scheduler = SystemScheduler::new();
        scheduler.register(TestSystem::new("a", 0, &log).failing_update().boxed());
        scheduler.register(TestSystem::new("b", 1, &log).boxed());

        let fault = scheduler.update_all(0.1, FaultPolicy::Propagate).unwrap_err();
        assert_eq!(fault.system, "a");
        assert_eq!(calls(&log, "update"), vec!["update:a"]);

        let faults = scheduler.update_all(0.1, FaultPolicy::Isolate).unwrap();
        assert_eq!(faults.len(), 1);
        assert_eq!(calls(&log, "update"), vec!["update:a", "update:a", "update:b"]);
    }

    #[test]
    fn test_disabled_systems_are_skipped() {
        let log = new_log();
        let mut scheduler = scheduler_with(&[("a", 0), ("b", 1)], &log);
        assert!(scheduler.set_enabled("a", false));
        assert!(!scheduler.set_enabled("missing", false));
        scheduler.update_all(0.1, FaultPolicy::Propagate).unwrap();
        assert_eq!(calls(&log, "update"), vec!["update:b"]);
        assert!(!scheduler.is_enabled("a"));
    }

    #[test]
    fn test_dispose_all_reverse_order_once() {
        let log = new_log();
        let mut scheduler = scheduler_with(&[("a", 0), ("b", 1), ("c", 2)], &log);
        scheduler.dispose_all();
        scheduler.dispose_all();
        assert_eq!(calls(&log, "dispose"), vec!["dispose:c", "dispose:b", "dispose:a"]);
    }

    #[test]
    fn test_remove_disposes_and_returns() {
        let log = new_log();
        let mut scheduler = scheduler_with(&[("a", 0)], &log);
        let removed = scheduler.remove("a");
        assert_eq!(removed.as_ref().map(|s| s.name().to_string()), Some("a".to_string()));
        assert!(scheduler.remove("a").is_none());
        assert_eq!(calls(&log, "dispose"), vec!["dispose:a"]);

        scheduler.dispose_all();
        assert_eq!(calls(&log, "dispose").len(), 1);
    }

    #[test]
    fn test_missing_lookups() {
        let scheduler = SystemScheduler::new();
        assert!(scheduler.get("Renderer").is_none());
        assert!(scheduler.get_as::<TestSystem>("Renderer").is_none());
        assert!(scheduler.is_empty());
    }
}

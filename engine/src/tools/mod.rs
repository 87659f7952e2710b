//! Tool Registry
//!
//! Maps action names to capabilities. Capabilities are either registered as
//! ready instances or as factories that are constructed on first use.
//! Unknown names resolve to `None`; invocation always yields an
//! [`Observation`], never an error.

pub mod calculator;
pub mod noop;
pub mod text;

pub use calculator::CalculatorTool;
pub use noop::NoopTool;
pub use text::TextTool;

use futures::FutureExt;
use sdk::errors::EngineError;
use sdk::{Capability, CapabilityInfo, Observation, ToolError, ToolInput};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// Constructor for a lazily loaded capability
pub type CapabilityFactory =
    Box<dyn Fn() -> Result<Arc<dyn Capability>, ToolError> + Send + Sync>;

/// Registry of capabilities available to execution loops.
///
/// Shared between loops behind an `Arc`; all methods take `&self`.
#[derive(Default)]
pub struct ToolRegistry {
    loaded: RwLock<HashMap<String, Arc<dyn Capability>>>,
    factories: RwLock<HashMap<String, CapabilityFactory>>,
}

impl ToolRegistry {
    /// Create an empty registry with no capabilities.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry with factories for the built-in capabilities.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        registry.register_factory(calculator::NAME, || {
            Ok(Arc::new(CalculatorTool) as Arc<dyn Capability>)
        });
        registry.register_factory(text::NAME, || Ok(Arc::new(TextTool) as Arc<dyn Capability>));
        registry.register_factory(noop::NAME, || Ok(Arc::new(NoopTool) as Arc<dyn Capability>));
        registry
    }

    /// Register a ready capability instance under its own name.
    pub fn register(&self, capability: Arc<dyn Capability>) {
        let name = capability.name().to_string();
        info!("Registered tool: {}", name);
        write_lock(&self.loaded).insert(name, capability);
    }

    /// Register a factory that builds the capability on first resolution.
    pub fn register_factory<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn Capability>, ToolError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!("Registered tool factory: {}", name);
        write_lock(&self.factories).insert(name, Box::new(factory));
    }

    /// Resolve a capability by name, constructing it from its factory if needed.
    ///
    /// A factory failure is logged and reported as absence.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Capability>> {
        if let Some(capability) = read_lock(&self.loaded).get(name) {
            return Some(Arc::clone(capability));
        }

        let built = {
            let factories = read_lock(&self.factories);
            let factory = factories.get(name)?;
            factory()
        };

        match built {
            Ok(capability) => {
                let mut loaded = write_lock(&self.loaded);
                let entry = loaded
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::clone(&capability));
                info!("Loaded tool: {}", name);
                Some(Arc::clone(entry))
            }
            Err(e) => {
                error!("Error instantiating tool {}: {}", name, e);
                None
            }
        }
    }

    /// Whether a name is known, either loaded or as a factory.
    pub fn contains(&self, name: &str) -> bool {
        read_lock(&self.loaded).contains_key(name) || read_lock(&self.factories).contains_key(name)
    }

    /// Run a capability and capture the outcome as an observation.
    ///
    /// Unknown names, capability errors and capability panics all become
    /// error observations. No retries are attempted.
    pub async fn invoke(&self, name: &str, input: Value) -> Observation {
        let Some(capability) = self.resolve(name) else {
            let err = EngineError::ToolNotFound(name.to_string());
            warn!("{}", err);
            return Observation::error(name, err.to_string());
        };

        debug!("Invoking tool '{}' with input: {}", name, input);

        let outcome = AssertUnwindSafe(capability.execute(ToolInput::from_value(input)))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => Observation::success(name, result),
            Ok(Err(e)) => {
                let message = format!("Error executing tool {}: {}", name, e);
                warn!("{}", message);
                Observation::error(name, message)
            }
            Err(_) => {
                let message = format!("Error executing tool {}: capability panicked", name);
                error!("{}", message);
                Observation::error(name, message)
            }
        }
    }

    /// Describe every available capability, sorted by name.
    ///
    /// Factories are instantiated for introspection but not cached.
    pub fn list_available_tools(&self) -> Vec<CapabilityInfo> {
        let mut infos: HashMap<String, CapabilityInfo> = read_lock(&self.loaded)
            .values()
            .map(|capability| CapabilityInfo::of(capability.as_ref()))
            .map(|info| (info.name.clone(), info))
            .collect();

        for (name, factory) in read_lock(&self.factories).iter() {
            if infos.contains_key(name) {
                continue;
            }
            match factory() {
                Ok(capability) => {
                    infos.insert(name.clone(), CapabilityInfo::of(capability.as_ref()));
                }
                Err(e) => warn!("Skipping tool {} in listing: {}", name, e),
            }
        }

        let mut infos: Vec<CapabilityInfo> = infos.into_values().collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Return the names of all known capabilities, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = read_lock(&self.loaded).keys().cloned().collect();
        for name in read_lock(&self.factories).keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

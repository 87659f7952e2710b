//! Foreman SDK
//!
//! Shared library providing traits and types for Foreman components.
//! This crate is used by the engine and by any out-of-tree capability.

/// Capability trait and introspection record
pub mod capability;

/// Error types and handling
pub mod errors;

/// Capability input and observation types
pub mod types;

// Re-export commonly used types
pub use capability::{Capability, CapabilityInfo};
pub use errors::{EngineError, EngineErrorExt};
pub use types::{Observation, ToolError, ToolInput};

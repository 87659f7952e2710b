//! Conductor
//!
//! Dependency-aware planning: plans, steps, and the manager that hands out
//! executable steps and merges replans.

pub mod planner;
pub mod types;

pub use planner::{
    parse_steps, split_clauses, PlanManager, PlanningError, SequentialStepGenerator, StepGenerator,
};
pub use types::{CompletedStep, Plan, PlanStatus, Step};

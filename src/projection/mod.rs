//! Projection engine for monthly compounding savings projections

mod state;
mod engine;
mod schedule;
pub mod rounding;

pub use state::ProjectionState;
pub use engine::{
    monthly_rate, project, EngineConfig, ProjectionEngine, ProjectionInput,
    DEFAULT_MAX_HORIZON_MONTHS, DEFAULT_PLAN_CANDIDATES,
};
pub use schedule::{MonthlyEntry, ProjectionResult, ProjectionSummary};

pub(crate) use engine::{simulate, validate_rate};

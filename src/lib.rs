//! Savings Projection - compound-interest projections and goal planning for investment comparison
//!
//! This library provides:
//! - Month-by-month projections with nominal monthly compounding
//! - Goal planning: required monthly contribution per candidate option
//! - Investment catalog with risk-tolerance filtering
//! - Savings goal tracking per user
//! - Referral click tracking for affiliate commissions
//! - JSON request handling for the calculator endpoints
//! - Parallel batch projections

pub mod error;
pub mod catalog;
pub mod projection;
pub mod planning;
pub mod goals;
pub mod conversions;
pub mod api;
pub mod batch;

// Re-export commonly used types
pub use error::{CatalogError, ConversionError, GoalError, ProjectionError};
pub use catalog::{InvestmentOption, OptionRepository, RiskLevel, RiskTolerance};
pub use projection::{project, EngineConfig, MonthlyEntry, ProjectionEngine, ProjectionInput, ProjectionResult};
pub use planning::{plan_for_goal, GoalPlan, GoalPlanResult, GoalPlanner};
pub use batch::BatchRunner;

//! Core projection engine for monthly compounding savings projections

use log::debug;
use serde::{Deserialize, Serialize};

use super::rounding::{finite_cents, round_percent};
use super::schedule::{MonthlyEntry, ProjectionResult};
use super::state::ProjectionState;
use crate::error::ProjectionError;

/// Longest horizon accepted by default (100 years)
pub const DEFAULT_MAX_HORIZON_MONTHS: u32 = 1200;

/// Number of catalog options a goal plan is evaluated against by default
pub const DEFAULT_PLAN_CANDIDATES: usize = 3;

fn default_max_horizon_months() -> u32 {
    DEFAULT_MAX_HORIZON_MONTHS
}

fn default_plan_candidates() -> usize {
    DEFAULT_PLAN_CANDIDATES
}

/// Configuration for the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Horizons above this are rejected as invalid input
    #[serde(default = "default_max_horizon_months")]
    pub max_horizon_months: u32,

    /// How many top-rated options a goal plan considers
    #[serde(default = "default_plan_candidates")]
    pub plan_candidates: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_horizon_months: DEFAULT_MAX_HORIZON_MONTHS,
            plan_candidates: DEFAULT_PLAN_CANDIDATES,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file; absent fields take their defaults
    pub fn from_json_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Inputs of a forward projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub initial_amount: f64,

    #[serde(default)]
    pub monthly_contribution: f64,

    /// Nominal annual rate in percent (12 means 12%)
    pub annual_rate_percent: f64,

    pub horizon_months: u32,
}

impl ProjectionInput {
    pub fn new(
        initial_amount: f64,
        monthly_contribution: f64,
        annual_rate_percent: f64,
        horizon_months: u32,
    ) -> Self {
        Self {
            initial_amount,
            monthly_contribution,
            annual_rate_percent,
            horizon_months,
        }
    }
}

/// Convert a nominal annual percentage to the monthly rate.
///
/// Simple division by 12, not the geometric conversion. Every displayed
/// projection depends on this exact approximation.
pub fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

/// Main projection engine
#[derive(Debug, Clone, Default)]
pub struct ProjectionEngine {
    config: EngineConfig,
}

impl ProjectionEngine {
    /// Create a new projection engine with given config
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a forward projection
    pub fn project(&self, input: &ProjectionInput) -> Result<ProjectionResult, ProjectionError> {
        if !input.initial_amount.is_finite() || input.initial_amount <= 0.0 {
            return Err(ProjectionError::invalid(
                "initial_amount",
                format!("must be a positive number, got {}", input.initial_amount),
            ));
        }
        validate_contribution(input.monthly_contribution)?;
        validate_rate(input.annual_rate_percent)?;
        self.validate_horizon(input.horizon_months)?;

        let (state, schedule) = simulate(
            input.initial_amount,
            input.monthly_contribution,
            monthly_rate(input.annual_rate_percent),
            input.horizon_months,
            true,
        )?;

        let total_return_percent = round_percent(state.total_interest / state.total_contributed);
        if !total_return_percent.is_finite() {
            return Err(ProjectionError::ComputationOverflow(
                "total return is not a finite number".to_string(),
            ));
        }

        debug!(
            "projected {} months at {}%: final balance {:.2}",
            input.horizon_months, input.annual_rate_percent, state.balance
        );

        Ok(ProjectionResult {
            final_balance: finite_cents(state.balance, "final balance")?,
            total_contributed: finite_cents(state.total_contributed, "total contributed")?,
            total_interest: finite_cents(state.total_interest, "total interest")?,
            total_return_percent,
            schedule,
        })
    }

    /// Check a horizon against `1..=max_horizon_months`
    pub fn validate_horizon(&self, horizon_months: u32) -> Result<(), ProjectionError> {
        if horizon_months < 1 {
            return Err(ProjectionError::invalid("horizon_months", "must be at least 1"));
        }
        if horizon_months > self.config.max_horizon_months {
            return Err(ProjectionError::invalid(
                "horizon_months",
                format!(
                    "must not exceed {} months, got {}",
                    self.config.max_horizon_months, horizon_months
                ),
            ));
        }
        Ok(())
    }
}

/// Project with the default engine config
pub fn project(
    initial_amount: f64,
    monthly_contribution: f64,
    annual_rate_percent: f64,
    horizon_months: u32,
) -> Result<ProjectionResult, ProjectionError> {
    ProjectionEngine::default().project(&ProjectionInput::new(
        initial_amount,
        monthly_contribution,
        annual_rate_percent,
        horizon_months,
    ))
}

pub(crate) fn validate_contribution(contribution: f64) -> Result<(), ProjectionError> {
    if !contribution.is_finite() || contribution < 0.0 {
        return Err(ProjectionError::invalid(
            "monthly_contribution",
            format!("must be zero or positive, got {}", contribution),
        ));
    }
    Ok(())
}

pub(crate) fn validate_rate(annual_rate_percent: f64) -> Result<(), ProjectionError> {
    if !annual_rate_percent.is_finite() {
        return Err(ProjectionError::invalid(
            "annual_rate_percent",
            "must be a finite number",
        ));
    }
    Ok(())
}

/// Month-by-month simulation shared by projections and goal plans.
///
/// Inputs are assumed validated; `initial_amount` may be zero here.
/// The schedule is only recorded when `detailed_output` is set.
pub(crate) fn simulate(
    initial_amount: f64,
    monthly_contribution: f64,
    monthly_rate: f64,
    horizon_months: u32,
    detailed_output: bool,
) -> Result<(ProjectionState, Vec<MonthlyEntry>), ProjectionError> {
    let mut state = ProjectionState::new(initial_amount);
    let mut schedule = if detailed_output {
        Vec::with_capacity(horizon_months as usize)
    } else {
        Vec::new()
    };

    for _month in 1..=horizon_months {
        let interest = state.advance_month(monthly_rate, monthly_contribution);

        if !state.is_finite() {
            return Err(ProjectionError::ComputationOverflow(format!(
                "balance is no longer finite at month {}",
                state.projection_month
            )));
        }

        if detailed_output {
            schedule.push(MonthlyEntry {
                month: state.projection_month,
                balance: finite_cents(state.balance, "balance")?,
                interest_this_month: finite_cents(interest, "monthly interest")?,
                contribution_this_month: monthly_contribution,
            });
        }
    }

    Ok((state, schedule))
}

//! Goal planning: solve for the monthly contribution that reaches a target
//!
//! Each candidate option is evaluated independently: the annuity equation is
//! inverted for the contribution, the result is rounded up to a whole currency
//! unit, and a forward simulation confirms the balance actually reached.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::{select_candidates, InvestmentOption, OptionRepository, RiskTolerance};
use crate::error::ProjectionError;
use crate::projection::rounding::{ceil_units, finite_cents};
use crate::projection::{monthly_rate, simulate, validate_rate, ProjectionEngine};

/// A savings goal to plan for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalPlan {
    pub current_amount: f64,
    pub target_amount: f64,
    pub horizon_months: u32,
    pub risk_tolerance: RiskTolerance,
}

/// Outcome of a goal plan against one candidate option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalPlanResult {
    pub option_id: u32,

    /// Whole currency units, rounded up
    pub required_monthly_contribution: f64,

    /// Balance reached contributing `required_monthly_contribution`, rounded to cents
    pub projected_final_balance: f64,

    pub reaches_target: bool,

    /// Projected balance minus target, rounded to cents
    pub surplus: f64,
}

/// Unrounded contribution that grows `current_amount` to `target_amount`
/// over `horizon_months` at `monthly_rate`.
///
/// Contributions are made at month end, after interest is credited
/// (ordinary annuity), matching the forward simulation.
pub fn required_contribution(
    current_amount: f64,
    target_amount: f64,
    horizon_months: u32,
    monthly_rate: f64,
) -> f64 {
    if current_amount >= target_amount {
        return 0.0;
    }

    let periods = horizon_months as f64;
    let growth = (1.0 + monthly_rate).powf(periods);
    let principal_future_value = current_amount * growth;

    if principal_future_value >= target_amount {
        return 0.0;
    }

    // A tiny non-zero rate can still leave growth at exactly 1.0
    if monthly_rate == 0.0 || growth == 1.0 {
        return (target_amount - current_amount) / periods;
    }

    (target_amount - principal_future_value) * monthly_rate / (growth - 1.0)
}

/// Plan a goal against each candidate, in candidate order
pub fn plan_for_goal(
    engine: &ProjectionEngine,
    current_amount: f64,
    target_amount: f64,
    horizon_months: u32,
    candidates: &[InvestmentOption],
) -> Result<Vec<GoalPlanResult>, ProjectionError> {
    if !current_amount.is_finite() || current_amount < 0.0 {
        return Err(ProjectionError::InvalidArgument {
            field: "current_amount",
            reason: format!("must be zero or positive, got {}", current_amount),
        });
    }
    if !target_amount.is_finite() || target_amount <= 0.0 {
        return Err(ProjectionError::InvalidArgument {
            field: "target_amount",
            reason: format!("must be a positive number, got {}", target_amount),
        });
    }
    engine.validate_horizon(horizon_months)?;

    candidates
        .iter()
        .map(|option| plan_option(current_amount, target_amount, horizon_months, option))
        .collect()
}

fn plan_option(
    current_amount: f64,
    target_amount: f64,
    horizon_months: u32,
    option: &InvestmentOption,
) -> Result<GoalPlanResult, ProjectionError> {
    validate_rate(option.annual_rate_percent)?;
    let rate = monthly_rate(option.annual_rate_percent);

    let contribution = ceil_units(required_contribution(
        current_amount,
        target_amount,
        horizon_months,
        rate,
    ));
    if !contribution.is_finite() {
        return Err(ProjectionError::ComputationOverflow(format!(
            "required contribution for option {} is not a finite number",
            option.id
        )));
    }

    let (state, _) = simulate(current_amount, contribution, rate, horizon_months, false)?;
    let projected_final_balance = finite_cents(state.balance, "projected final balance")?;
    let surplus = finite_cents(state.balance - target_amount, "surplus")?;

    debug!(
        "option {}: contribution {} reaches {:.2} of {:.2}",
        option.id, contribution, state.balance, target_amount
    );

    Ok(GoalPlanResult {
        option_id: option.id,
        required_monthly_contribution: contribution,
        projected_final_balance,
        reaches_target: state.balance >= target_amount,
        surplus,
    })
}

/// Goal planner bound to an engine config
#[derive(Debug, Clone, Default)]
pub struct GoalPlanner {
    engine: ProjectionEngine,
}

impl GoalPlanner {
    pub fn new(engine: ProjectionEngine) -> Self {
        Self { engine }
    }

    /// Filter the catalog by risk tolerance, keep the top-rated options and plan against them.
    /// Each result is returned alongside the option it was computed for.
    pub fn plan(
        &self,
        goal: &GoalPlan,
        repository: &dyn OptionRepository,
    ) -> Result<Vec<(InvestmentOption, GoalPlanResult)>, ProjectionError> {
        let candidates = select_candidates(
            &repository.list_active(),
            goal.risk_tolerance,
            self.engine.config().plan_candidates,
        );

        let results = plan_for_goal(
            &self.engine,
            goal.current_amount,
            goal.target_amount,
            goal.horizon_months,
            &candidates,
        )?;

        Ok(candidates.into_iter().zip(results).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, RiskLevel};
    use approx::assert_relative_eq;

    fn option(id: u32, rate: f64) -> InvestmentOption {
        InvestmentOption::new(id, "Test", "Bank", rate, RiskLevel::Low)
    }

    fn plan(current: f64, target: f64, months: u32, options: &[InvestmentOption]) -> Vec<GoalPlanResult> {
        plan_for_goal(&ProjectionEngine::default(), current, target, months, options).unwrap()
    }

    #[test]
    fn test_goal_already_met() {
        let results = plan(5_000.0, 5_000.0, 12, &[option(1, 9.0), option(2, 0.0)]);
        for result in &results {
            assert_eq!(result.required_monthly_contribution, 0.0);
            assert!(result.reaches_target);
            assert!(result.surplus >= 0.0);
        }
        // With zero contribution the balance only grows by interest
        assert_eq!(results[1].projected_final_balance, 5_000.0);
        assert!(results[0].projected_final_balance > 5_000.0);
    }

    #[test]
    fn test_zero_rate_uses_linear_division() {
        let results = plan(0.0, 1_200.0, 12, &[option(7, 0.0)]);
        let result = &results[0];
        assert_eq!(result.option_id, 7);
        assert_eq!(result.required_monthly_contribution, 100.0);
        assert_eq!(result.projected_final_balance, 1_200.0);
        assert!(result.reaches_target);
        assert_eq!(result.surplus, 0.0);
    }

    #[test]
    fn test_principal_growth_alone_reaches_target() {
        // 10000 at 1% monthly for 12 months is ~11268.25
        let results = plan(10_000.0, 11_000.0, 12, &[option(1, 12.0)]);
        assert_eq!(results[0].required_monthly_contribution, 0.0);
        assert!(results[0].reaches_target);
        assert_eq!(results[0].surplus, 268.25);
    }

    #[test]
    fn test_contribution_rounded_up_and_reaches_target() {
        let results = plan(1_000.0, 50_000.0, 36, &[option(1, 15.0), option(2, 11.25), option(3, 0.0)]);
        assert_eq!(results.len(), 3);

        for result in &results {
            let c = result.required_monthly_contribution;
            assert_eq!(c, c.ceil());
            assert!(result.reaches_target, "option {}", result.option_id);
            assert!(result.surplus >= 0.0);
        }

        // Higher rate needs a smaller contribution
        assert!(results[0].required_monthly_contribution < results[1].required_monthly_contribution);
        assert!(results[1].required_monthly_contribution < results[2].required_monthly_contribution);
        // Zero rate: (50000 - 1000) / 36 = 1361.11 -> 1362
        assert_eq!(results[2].required_monthly_contribution, 1_362.0);
    }

    #[test]
    fn test_one_unit_less_undershoots() {
        let rate = monthly_rate(12.0);
        let exact = required_contribution(2_000.0, 20_000.0, 24, rate);
        let rounded = exact.ceil();

        let (state, _) = simulate(2_000.0, rounded - 1.0, rate, 24, false).unwrap();
        assert!(state.balance < 20_000.0);
        let (state, _) = simulate(2_000.0, rounded, rate, 24, false).unwrap();
        assert!(state.balance >= 20_000.0);
    }

    #[test]
    fn test_annuity_inversion_matches_closed_form() {
        let rate = monthly_rate(6.0);
        let c = required_contribution(0.0, 10_000.0, 60, rate);
        let future_value = c * ((1.0 + rate).powi(60) - 1.0) / rate;
        assert_relative_eq!(future_value, 10_000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_tiny_rate_does_not_divide_by_zero() {
        let c = required_contribution(0.0, 1_200.0, 12, 1e-18);
        assert!(c.is_finite());
        assert_relative_eq!(c, 100.0);
    }

    #[test]
    fn test_results_follow_candidate_order() {
        let results = plan(100.0, 5_000.0, 24, &[option(3, 5.0), option(1, 20.0), option(2, 10.0)]);
        let ids: Vec<u32> = results.iter().map(|r| r.option_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_invalid_goal_rejected() {
        let engine = ProjectionEngine::default();
        let options = [option(1, 10.0)];
        assert!(matches!(
            plan_for_goal(&engine, 100.0, 1_000.0, 0, &options),
            Err(ProjectionError::InvalidArgument { field: "horizon_months", .. })
        ));
        assert!(matches!(
            plan_for_goal(&engine, 100.0, 0.0, 12, &options),
            Err(ProjectionError::InvalidArgument { field: "target_amount", .. })
        ));
        assert!(matches!(
            plan_for_goal(&engine, -1.0, 1_000.0, 12, &options),
            Err(ProjectionError::InvalidArgument { field: "current_amount", .. })
        ));
    }

    #[test]
    fn test_non_finite_contribution_is_overflow() {
        // Growth factor overflows, so the solve yields NaN
        let result = plan_for_goal(&ProjectionEngine::default(), 0.0, 1e300, 1200, &[option(1, 1e6)]);
        assert!(matches!(result, Err(ProjectionError::ComputationOverflow(msg)) if msg.contains("option 1")));
    }

    #[test]
    fn test_balance_too_large_for_cents_is_overflow() {
        // Contribution and balance stay finite but cannot be reported in cents
        let result = plan_for_goal(&ProjectionEngine::default(), 1e307, 1.5e307, 12, &[option(1, 0.0)]);
        assert!(matches!(result, Err(ProjectionError::ComputationOverflow(_))));
    }

    #[test]
    fn test_empty_candidates() {
        assert!(plan(100.0, 1_000.0, 12, &[]).is_empty());
    }

    #[test]
    fn test_planner_uses_risk_filtered_top_three() {
        let planner = GoalPlanner::default();
        let goal = GoalPlan {
            current_amount: 5_000.0,
            target_amount: 100_000.0,
            horizon_months: 60,
            risk_tolerance: RiskTolerance::Low,
        };

        let plans = planner.plan(&goal, &InMemoryCatalog::with_defaults()).unwrap();
        let ids: Vec<u32> = plans.iter().map(|(o, _)| o.id).collect();
        assert_eq!(ids, vec![2, 5, 3]);
        for (option, result) in &plans {
            assert_eq!(option.id, result.option_id);
            assert!(result.reaches_target);
        }
    }
}

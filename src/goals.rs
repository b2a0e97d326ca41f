//! User-owned savings goals and the store that keeps them

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::RiskTolerance;
use crate::error::GoalError;
use crate::planning::GoalPlan;
use crate::projection::rounding::round_cents;

/// A savings goal owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub monthly_contribution: f64,
    /// Catalog option the user is saving with
    pub option_id: Option<u32>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SavingsGoal {
    /// Share of the target already saved, in percent (two decimals, capped at 100)
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        round_cents((self.current_amount / self.target_amount * 100.0).min(100.0))
    }

    /// Whole months from `today` until the target date; a partial month counts as one.
    /// `None` when there is no target date or it is not in the future.
    pub fn months_until_target(&self, today: NaiveDate) -> Option<u32> {
        let target = self.target_date?;
        if target <= today {
            return None;
        }

        let mut months = (target.year() - today.year()) * 12 + target.month() as i32
            - today.month() as i32;
        if target.day() > today.day() {
            months += 1;
        }
        Some(months.max(1) as u32)
    }

    /// Goal plan for the time remaining until the target date
    pub fn to_goal_plan(&self, today: NaiveDate, risk_tolerance: RiskTolerance) -> Option<GoalPlan> {
        Some(GoalPlan {
            current_amount: self.current_amount,
            target_amount: self.target_amount,
            horizon_months: self.months_until_target(today)?,
            risk_tolerance,
        })
    }
}

/// Fields supplied when creating a goal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewGoal {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target_amount: f64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub monthly_contribution: Option<f64>,
    #[serde(default)]
    pub option_id: Option<u32>,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub target_date: Option<NaiveDate>,
    pub monthly_contribution: Option<f64>,
    pub completed: Option<bool>,
}

/// Storage of savings goals keyed by id and scoped to their owner.
///
/// A goal owned by another user is reported as `NotFound`.
pub trait GoalStore {
    /// Goals of a user, newest first
    fn list(&self, user_id: u64) -> Result<Vec<SavingsGoal>, GoalError>;

    fn get(&self, user_id: u64, goal_id: u64) -> Result<SavingsGoal, GoalError>;

    fn create(&self, user_id: u64, goal: NewGoal) -> Result<SavingsGoal, GoalError>;

    fn update(&self, user_id: u64, goal_id: u64, update: GoalUpdate) -> Result<SavingsGoal, GoalError>;

    fn delete(&self, user_id: u64, goal_id: u64) -> Result<(), GoalError>;
}

#[derive(Debug, Default)]
struct GoalTable {
    next_id: u64,
    goals: BTreeMap<u64, SavingsGoal>,
}

/// Goal store held in memory, shareable across request handlers
#[derive(Debug, Default)]
pub struct InMemoryGoalStore {
    table: RwLock<GoalTable>,
}

impl InMemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_amount(field: &str, value: f64, allow_zero: bool) -> Result<(), GoalError> {
    let valid = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0));
    if !valid {
        let expected = if allow_zero { "zero or positive" } else { "positive" };
        return Err(GoalError::Invalid(format!("{} must be {}, got {}", field, expected, value)));
    }
    Ok(())
}

impl GoalStore for InMemoryGoalStore {
    fn list(&self, user_id: u64) -> Result<Vec<SavingsGoal>, GoalError> {
        let table = self.table.read().map_err(|_| GoalError::Poisoned)?;
        Ok(table
            .goals
            .values()
            .rev()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    fn get(&self, user_id: u64, goal_id: u64) -> Result<SavingsGoal, GoalError> {
        let table = self.table.read().map_err(|_| GoalError::Poisoned)?;
        table
            .goals
            .get(&goal_id)
            .filter(|g| g.user_id == user_id)
            .cloned()
            .ok_or(GoalError::NotFound(goal_id))
    }

    fn create(&self, user_id: u64, goal: NewGoal) -> Result<SavingsGoal, GoalError> {
        if goal.name.trim().is_empty() {
            return Err(GoalError::Invalid("name is required".to_string()));
        }
        check_amount("target_amount", goal.target_amount, false)?;
        let monthly_contribution = goal.monthly_contribution.unwrap_or(0.0);
        check_amount("monthly_contribution", monthly_contribution, true)?;

        let mut table = self.table.write().map_err(|_| GoalError::Poisoned)?;
        table.next_id += 1;
        let id = table.next_id;

        let created = SavingsGoal {
            id,
            user_id,
            name: goal.name,
            description: goal.description,
            target_amount: goal.target_amount,
            current_amount: 0.0,
            target_date: goal.target_date,
            monthly_contribution,
            option_id: goal.option_id,
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
        };
        table.goals.insert(id, created.clone());

        log::debug!("user {} created goal {}", user_id, id);
        Ok(created)
    }

    fn update(&self, user_id: u64, goal_id: u64, update: GoalUpdate) -> Result<SavingsGoal, GoalError> {
        if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(GoalError::Invalid("name is required".to_string()));
        }
        if let Some(target) = update.target_amount {
            check_amount("target_amount", target, false)?;
        }
        if let Some(current) = update.current_amount {
            check_amount("current_amount", current, true)?;
        }
        if let Some(contribution) = update.monthly_contribution {
            check_amount("monthly_contribution", contribution, true)?;
        }

        let mut table = self.table.write().map_err(|_| GoalError::Poisoned)?;
        let goal = table
            .goals
            .get_mut(&goal_id)
            .filter(|g| g.user_id == user_id)
            .ok_or(GoalError::NotFound(goal_id))?;

        if let Some(name) = update.name {
            goal.name = name;
        }
        if let Some(description) = update.description {
            goal.description = Some(description);
        }
        if let Some(target) = update.target_amount {
            goal.target_amount = target;
        }
        if let Some(current) = update.current_amount {
            goal.current_amount = current;
        }
        if let Some(date) = update.target_date {
            goal.target_date = Some(date);
        }
        if let Some(contribution) = update.monthly_contribution {
            goal.monthly_contribution = contribution;
        }
        if let Some(completed) = update.completed {
            // Only the transition to completed is stamped
            if completed && !goal.completed {
                goal.completed_at = Some(Utc::now());
            }
            goal.completed = completed;
        }

        Ok(goal.clone())
    }

    fn delete(&self, user_id: u64, goal_id: u64) -> Result<(), GoalError> {
        let mut table = self.table.write().map_err(|_| GoalError::Poisoned)?;
        match table.goals.get(&goal_id) {
            Some(goal) if goal.user_id == user_id => {
                table.goals.remove(&goal_id);
                Ok(())
            }
            _ => Err(GoalError::NotFound(goal_id)),
        }
    }
}

//! Projection output structures

use serde::{Deserialize, Serialize};

/// A single row of projection output for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEntry {
    /// Projection month (1-indexed)
    pub month: u32,

    /// End-of-month balance, rounded to cents
    pub balance: f64,

    /// Interest credited this month, rounded to cents
    pub interest_this_month: f64,

    /// Contribution made this month, echoed from the input
    pub contribution_this_month: f64,
}

/// Complete projection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub final_balance: f64,
    pub total_contributed: f64,
    pub total_interest: f64,

    /// Total interest over total contributed, as a percentage with two decimals
    pub total_return_percent: f64,

    /// Month-by-month balances in month order
    pub schedule: Vec<MonthlyEntry>,
}

impl ProjectionResult {
    /// Entry for a given month (1-indexed)
    pub fn entry(&self, month: u32) -> Option<&MonthlyEntry> {
        month
            .checked_sub(1)
            .and_then(|idx| self.schedule.get(idx as usize))
    }

    /// Number of months projected
    pub fn months(&self) -> u32 {
        self.schedule.len() as u32
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let best_month = self
            .schedule
            .iter()
            .max_by(|a, b| a.interest_this_month.total_cmp(&b.interest_this_month))
            .map(|e| e.month);

        ProjectionSummary {
            total_months: self.months(),
            final_balance: self.final_balance,
            total_contributed: self.total_contributed,
            total_interest: self.total_interest,
            total_return_percent: self.total_return_percent,
            last_month_interest: self
                .schedule
                .last()
                .map(|e| e.interest_this_month)
                .unwrap_or(0.0),
            best_interest_month: best_month,
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_months: u32,
    pub final_balance: f64,
    pub total_contributed: f64,
    pub total_interest: f64,
    pub total_return_percent: f64,
    pub last_month_interest: f64,
    pub best_interest_month: Option<u32>,
}

//! Running balance state for a single projection

/// State of the savings balance at a point in time during projection
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionState {
    /// Current projection month (1-indexed, 0 before the first advance)
    pub projection_month: u32,

    /// Unrounded balance at end of the current month
    pub balance: f64,

    /// Initial amount plus every contribution made so far
    pub total_contributed: f64,

    /// Interest credited so far
    pub total_interest: f64,
}

impl ProjectionState {
    /// Initialize state at projection start
    pub fn new(initial_amount: f64) -> Self {
        Self {
            projection_month: 0,
            balance: initial_amount,
            total_contributed: initial_amount,
            total_interest: 0.0,
        }
    }

    /// Advance one month: credit interest on the opening balance, then add the contribution.
    /// Returns the interest credited this month.
    pub fn advance_month(&mut self, monthly_rate: f64, contribution: f64) -> f64 {
        self.projection_month += 1;

        let interest = self.balance * monthly_rate;
        self.balance += interest + contribution;
        self.total_contributed += contribution;
        self.total_interest += interest;

        interest
    }

    /// Whether every accumulator is still a finite number
    pub fn is_finite(&self) -> bool {
        self.balance.is_finite() && self.total_contributed.is_finite() && self.total_interest.is_finite()
    }
}

//! Batch runner for many projections at once
//!
//! Loads projection inputs from CSV and runs them in parallel with a shared
//! engine config.

use std::path::Path;

use rayon::prelude::*;

use crate::error::ProjectionError;
use crate::projection::{EngineConfig, ProjectionEngine, ProjectionInput, ProjectionResult};

/// Runs projections in parallel with one engine config
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    engine: ProjectionEngine,
}

impl BatchRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: ProjectionEngine::new(config),
        }
    }

    /// Run a single projection
    pub fn run(&self, input: &ProjectionInput) -> Result<ProjectionResult, ProjectionError> {
        self.engine.project(input)
    }

    /// Run every input in parallel; results keep input order
    pub fn project_batch(
        &self,
        inputs: &[ProjectionInput],
    ) -> Vec<Result<ProjectionResult, ProjectionError>> {
        inputs.par_iter().map(|input| self.engine.project(input)).collect()
    }

    /// Same inputs at each of several annual rates, one result set per rate
    pub fn run_rate_scenarios(
        &self,
        input: &ProjectionInput,
        annual_rates_percent: &[f64],
    ) -> Vec<Result<ProjectionResult, ProjectionError>> {
        annual_rates_percent
            .par_iter()
            .map(|&rate| {
                let scenario = ProjectionInput {
                    annual_rate_percent: rate,
                    ..input.clone()
                };
                self.engine.project(&scenario)
            })
            .collect()
    }
}

/// Load projection inputs from a CSV file with columns
/// `initial_amount,monthly_contribution,annual_rate_percent,horizon_months`
pub fn load_projection_inputs<P: AsRef<Path>>(path: P) -> Result<Vec<ProjectionInput>, csv::Error> {
    load_projection_inputs_from_reader(std::fs::File::open(path)?)
}

/// Load projection inputs from any reader
pub fn load_projection_inputs_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<ProjectionInput>, csv::Error> {
    csv::Reader::from_reader(reader).deserialize().collect()
}

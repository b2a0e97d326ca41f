//! Savings Projection CLI
//!
//! Command-line interface for running projections and goal plans

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use savings_projection::{
    batch::{load_projection_inputs, BatchRunner},
    catalog::{InMemoryCatalog, OptionRepository, RiskTolerance},
    EngineConfig, GoalPlan, GoalPlanner, ProjectionEngine, ProjectionInput, ProjectionResult,
};

#[derive(Debug, Parser)]
#[command(name = "savings-projection", version, about = "Compound-interest projections and savings goal plans")]
struct Cli {
    /// JSON engine config (max_horizon_months, plan_candidates)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Project a balance month by month
    Project {
        /// Starting amount
        initial: f64,
        /// Nominal annual rate in percent
        rate: f64,
        /// Horizon in months
        months: u32,
        /// Monthly contribution
        #[arg(long, default_value_t = 0.0)]
        contribution: f64,
        /// Write the full schedule to this CSV file
        #[arg(long)]
        schedule_csv: Option<PathBuf>,
        /// Months printed to the console
        #[arg(long, default_value_t = 24)]
        show: usize,
    },
    /// Required monthly contribution to reach a target, per catalog option
    Plan {
        current: f64,
        target: f64,
        months: u32,
        /// Risk tolerance tag: bajo, medio (anything else: no filter)
        #[arg(long)]
        tolerance: Option<String>,
        /// Catalog CSV (built-in catalog when omitted)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// List the active investment options
    Options {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Run every projection in an input CSV
    Batch {
        input: PathBuf,
        /// Summary CSV output
        #[arg(long, default_value = "batch_output.csv")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Project { initial, rate, months, contribution, schedule_csv, show } => {
            let engine = ProjectionEngine::new(config);
            let result = engine.project(&ProjectionInput::new(initial, contribution, rate, months))?;
            print_projection(&result, show);
            if let Some(path) = schedule_csv {
                write_schedule(&path, &result)?;
                println!("\nFull schedule written to: {}", path.display());
            }
        }
        Command::Plan { current, target, months, tolerance, catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let planner = GoalPlanner::new(ProjectionEngine::new(config));
            let goal = GoalPlan {
                current_amount: current,
                target_amount: target,
                horizon_months: months,
                risk_tolerance: RiskTolerance::parse(tolerance.as_deref()),
            };

            println!("Goal: {:.2} -> {:.2} in {} months ({:?})\n",
                current, target, months, goal.risk_tolerance);
            println!("{:>4} {:<24} {:>7} {:>12} {:>14} {:>12} {:>6}",
                "ID", "Option", "Rate%", "Monthly", "Final", "Surplus", "Meets");
            println!("{}", "-".repeat(86));
            for (option, plan) in planner.plan(&goal, &catalog)? {
                println!("{:>4} {:<24} {:>7.2} {:>12.0} {:>14.2} {:>12.2} {:>6}",
                    option.id,
                    option.name,
                    option.annual_rate_percent,
                    plan.required_monthly_contribution,
                    plan.projected_final_balance,
                    plan.surplus,
                    if plan.reaches_target { "yes" } else { "no" },
                );
            }
        }
        Command::Options { catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;
            println!("{:>4} {:<24} {:<16} {:>7} {:>10} {:<9}",
                "ID", "Name", "Institution", "Rate%", "Minimum", "Risk");
            println!("{}", "-".repeat(76));
            for option in catalog.list_active() {
                println!("{:>4} {:<24} {:<16} {:>7.2} {:>10.2} {:<9}{}",
                    option.id,
                    option.name,
                    option.institution,
                    option.annual_rate_percent,
                    option.minimum_amount,
                    option.risk_level.as_str(),
                    if option.featured { " *" } else { "" },
                );
            }
        }
        Command::Batch { input, output } => {
            let inputs = load_projection_inputs(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            println!("Loaded {} projection inputs", inputs.len());

            let runner = BatchRunner::new(config);
            let results = runner.project_batch(&inputs);
            write_batch_summary(&output, &inputs, &results)?;

            let failed = results.iter().filter(|r| r.is_err()).count();
            println!("{} succeeded, {} failed; summary written to: {}",
                results.len() - failed, failed, output.display());
        }
    }

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<InMemoryCatalog> {
    match path {
        Some(path) => InMemoryCatalog::from_csv_path(path)
            .with_context(|| format!("loading catalog {}", path.display())),
        None => Ok(InMemoryCatalog::with_defaults()),
    }
}

fn print_projection(result: &ProjectionResult, show: usize) {
    println!("Projection Results ({} months):", result.months());
    println!("{:>5} {:>14} {:>12} {:>12}", "Month", "Balance", "Interest", "Contrib");
    println!("{}", "-".repeat(46));

    for entry in result.schedule.iter().take(show) {
        println!("{:>5} {:>14.2} {:>12.2} {:>12.2}",
            entry.month, entry.balance, entry.interest_this_month, entry.contribution_this_month);
    }
    if result.schedule.len() > show {
        println!("... ({} more months)", result.schedule.len() - show);
    }

    let summary = result.summary();
    println!("\nSummary:");
    println!("  Final Balance: ${:.2}", summary.final_balance);
    println!("  Total Contributed: ${:.2}", summary.total_contributed);
    println!("  Total Interest: ${:.2}", summary.total_interest);
    println!("  Total Return: {:.2}%", summary.total_return_percent);
}

fn write_schedule(path: &Path, result: &ProjectionResult) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in &result.schedule {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_batch_summary(
    path: &Path,
    inputs: &[ProjectionInput],
    results: &[Result<ProjectionResult, savings_projection::ProjectionError>],
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "initial_amount", "monthly_contribution", "annual_rate_percent", "horizon_months",
        "final_balance", "total_contributed", "total_interest", "total_return_percent", "error",
    ])?;

    for (input, result) in inputs.iter().zip(results) {
        let mut record = vec![
            input.initial_amount.to_string(),
            input.monthly_contribution.to_string(),
            input.annual_rate_percent.to_string(),
            input.horizon_months.to_string(),
        ];
        match result {
            Ok(r) => record.extend([
                format!("{:.2}", r.final_balance),
                format!("{:.2}", r.total_contributed),
                format!("{:.2}", r.total_interest),
                format!("{:.2}", r.total_return_percent),
                String::new(),
            ]),
            Err(e) => record.extend([String::new(), String::new(), String::new(), String::new(), e.to_string()]),
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

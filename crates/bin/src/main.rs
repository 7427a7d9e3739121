//! condreg CLI binary.
//!
//! Reads numeric CSV matrices and writes JSON results to stdout.

mod input;

use clap::{ArgAction, Parser, Subcommand};
use condreg::{
    CondregConfig, CondregEstimator, CrossValidationConfig, CrossValidator, PathDirection,
    RegularizedCovariance, min_variance_weights, penalty_grid,
};
use input::{CliError, read_matrix};
use ndarray::Array2;
use serde::Serialize;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "condreg")]
#[command(about = "Condition-number-regularized covariance estimation", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regularized covariance for a fixed condition-number bound
    Estimate {
        /// CSV data matrix (rows are observations)
        #[arg(long)]
        input: PathBuf,

        /// Upper bound on the condition number
        #[arg(long)]
        kmax: f64,

        /// Path direction (forward or backward)
        #[arg(long, default_value = "forward")]
        direction: PathDirection,

        /// Center columns before computing the covariance
        #[arg(long)]
        center: bool,
    },

    /// Select the bound by cross-validation, then estimate
    Select {
        /// CSV data matrix (rows are observations)
        #[arg(long)]
        input: PathBuf,

        /// Largest penalty in the grid
        #[arg(long, default_value = "100")]
        gridmax: f64,

        /// Number of grid points
        #[arg(long, default_value = "50")]
        numpts: usize,

        /// Number of folds (default: min(rows, 10))
        #[arg(long)]
        folds: Option<usize>,

        /// Path direction (forward or backward)
        #[arg(long, default_value = "forward")]
        direction: PathDirection,

        /// Center columns with the training mean of each fold
        #[arg(long)]
        center: bool,
    },

    /// Print a penalty grid
    Grid {
        /// Largest penalty in the grid
        #[arg(long)]
        gridmax: f64,

        /// Number of grid points
        #[arg(long)]
        numpts: usize,
    },

    /// Minimum-variance weights of a covariance matrix
    Weights {
        /// CSV covariance matrix
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Serialize)]
struct EstimateOutput {
    max_condition: f64,
    direction: PathDirection,
    condition_number: f64,
    eigenvalues: Vec<f64>,
    covariance: Vec<Vec<f64>>,
    precision: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct SelectOutput {
    selected_penalty: f64,
    selected_index: usize,
    max_condition: f64,
    penalties: Vec<f64>,
    aggregate: Vec<f64>,
    eigenvalues: Vec<f64>,
    covariance: Vec<Vec<f64>>,
    precision: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct GridOutput {
    penalties: Vec<f64>,
}

#[derive(Serialize)]
struct WeightsOutput {
    weights: Vec<f64>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let json = match cli.command {
        Commands::Estimate {
            input,
            kmax,
            direction,
            center,
        } => {
            let data = read_matrix(&input)?;
            let estimator = CondregEstimator::new(CondregConfig {
                max_condition: kmax,
                direction,
                center,
            })?;
            let fitted = estimator.fit(&data)?;
            render(
                &EstimateOutput {
                    max_condition: kmax,
                    direction,
                    condition_number: fitted.condition_number(),
                    eigenvalues: fitted.eigenvalues.to_vec(),
                    covariance: rows(&fitted.covariance),
                    precision: rows(&fitted.precision),
                },
                cli.pretty,
            )?
        }
        Commands::Select {
            input,
            gridmax,
            numpts,
            folds,
            direction,
            center,
        } => {
            let data = read_matrix(&input)?;
            let grid = penalty_grid(gridmax, numpts)?;
            let validator = CrossValidator::new(CrossValidationConfig {
                folds,
                direction,
                center,
                ..Default::default()
            });
            let result = validator.fit(&data, &grid)?;
            let RegularizedCovariance {
                covariance,
                precision,
                eigenvalues,
            } = result.estimate;
            render(
                &SelectOutput {
                    selected_penalty: result.selected_penalty,
                    selected_index: result.cv.selected_index,
                    max_condition: result.cv.max_condition,
                    penalties: result.cv.penalties,
                    aggregate: result.cv.aggregate,
                    eigenvalues: eigenvalues.to_vec(),
                    covariance: rows(&covariance),
                    precision: rows(&precision),
                },
                cli.pretty,
            )?
        }
        Commands::Grid { gridmax, numpts } => render(
            &GridOutput {
                penalties: penalty_grid(gridmax, numpts)?,
            },
            cli.pretty,
        )?,
        Commands::Weights { input } => {
            let sigma = read_matrix(&input)?;
            let weights = min_variance_weights(&sigma)?;
            render(
                &WeightsOutput {
                    weights: weights.to_vec(),
                },
                cli.pretty,
            )?
        }
    };

    println!("{}", json);
    Ok(())
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Nested row vectors for JSON output
fn rows(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}

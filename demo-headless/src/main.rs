mod advisor;

use advisor::{CommandGenerator, Unconfigured};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use watertwin_core::advisory::Advisor;
use watertwin_core::config::DEFAULT_CONFIG_PATH;
use watertwin_core::forecast::{CalibrationTable, DEFAULT_ARTIFACT_PATH, REFERENCE_CALIBRATION};
use watertwin_core::simulation::DEFAULT_ENGINE_PATH;
use watertwin_core::{
    global_engine, EngineAvailability, EngineError, ForecastArtifact, SimulationInput,
    SimulationResult, TankStatus, WaterTwinEngine,
};

/// Rainwater harvesting digital twin, headless host
#[derive(Parser, Debug)]
#[command(name = "watertwin-headless")]
#[command(about = "Rooftop rainwater tank water-balance projection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build an engine from configuration files and run one cycle
    Simulate {
        /// Configuration document
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Forecasting artifact (optional; 300 L/day fallback when absent)
        #[arg(long, default_value = DEFAULT_ARTIFACT_PATH)]
        artifact: PathBuf,

        /// Roof area override in m²
        #[arg(long)]
        roof_area: Option<f64>,

        /// Tank capacity override in L
        #[arg(long)]
        tank_capacity: Option<f64>,

        #[command(flatten)]
        cycle: CycleArgs,
    },

    /// Fit the reference consumption model and write it as an artifact
    Train {
        /// Output artifact path
        #[arg(short, long, default_value = DEFAULT_ARTIFACT_PATH)]
        output: PathBuf,

        /// Write the interpolated calibration table instead of the regression line
        #[arg(long)]
        table: bool,
    },

    /// Persist a fully constructed engine
    Snapshot {
        /// Configuration document
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Forecasting artifact
        #[arg(long, default_value = DEFAULT_ARTIFACT_PATH)]
        artifact: PathBuf,

        /// Roof area override in m²
        #[arg(long)]
        roof_area: Option<f64>,

        /// Tank capacity override in L
        #[arg(long)]
        tank_capacity: Option<f64>,

        /// Output snapshot path
        #[arg(short, long, default_value = DEFAULT_ENGINE_PATH)]
        output: PathBuf,
    },

    /// Run one cycle on a persisted engine
    RunSnapshot {
        /// Persisted engine
        #[arg(long, default_value = DEFAULT_ENGINE_PATH)]
        engine: PathBuf,

        #[command(flatten)]
        cycle: CycleArgs,
    },
}

/// Environmental inputs shared by the simulation commands
#[derive(Args, Debug)]
struct CycleArgs {
    /// Forecast rainfall in mm
    #[arg(short, long, default_value_t = 25.0)]
    rainfall: f64,

    /// Ambient temperature in °C
    #[arg(short, long, default_value_t = 25.0)]
    temperature: f64,

    /// Current tank storage in %
    #[arg(short, long, default_value_t = 40.0)]
    fill: f64,

    /// Print the result record as JSON
    #[arg(long)]
    json: bool,

    /// Shell command that turns prompts on stdin into a recommendation on stdout
    #[arg(long)]
    advisor_command: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            artifact,
            roof_area,
            tank_capacity,
            cycle,
        } => {
            let engine = match build_engine(&config, &artifact, roof_area, tank_capacity) {
                Ok(engine) => engine,
                Err(message) => {
                    eprintln!("{message}");
                    return ExitCode::FAILURE;
                }
            };
            run_cycle(&engine, &cycle)
        }

        Commands::Train { output, table } => {
            let artifact = if table {
                ForecastArtifact::CalibrationTable(CalibrationTable::reference())
            } else {
                match ForecastArtifact::reference() {
                    Ok(artifact) => artifact,
                    Err(e) => {
                        eprintln!("Training failed: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            };

            if let Err(e) = artifact.save(&output) {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
            if let ForecastArtifact::LinearRegression(model) = &artifact {
                println!(
                    "Fitted usage = {:.4} * T + {:.4} on {} calibration points",
                    model.coefficient,
                    model.intercept,
                    REFERENCE_CALIBRATION.len()
                );
            }
            println!("Consumption model saved to {}", output.display());
            ExitCode::SUCCESS
        }

        Commands::Snapshot {
            config,
            artifact,
            roof_area,
            tank_capacity,
            output,
        } => {
            let engine = match build_engine(&config, &artifact, roof_area, tank_capacity) {
                Ok(engine) => engine,
                Err(message) => {
                    eprintln!("{message}");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = engine.save(&output) {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
            println!("Engine saved to {}", output.display());
            ExitCode::SUCCESS
        }

        Commands::RunSnapshot { engine, cycle } => match global_engine(&engine) {
            EngineAvailability::Ready(lock) => match lock.read() {
                Ok(engine) => run_cycle(&engine, &cycle),
                Err(_) => {
                    eprintln!("Engine Offline: engine lock poisoned");
                    ExitCode::FAILURE
                }
            },
            EngineAvailability::Offline { reason } => {
                eprintln!(
                    "Engine Offline: {} could not be loaded ({reason})",
                    engine.display()
                );
                ExitCode::FAILURE
            }
        },
    }
}

/// Construct an engine and apply sidebar-style overrides
fn build_engine(
    config: &Path,
    artifact: &Path,
    roof_area: Option<f64>,
    tank_capacity: Option<f64>,
) -> Result<WaterTwinEngine, String> {
    WaterTwinEngine::from_paths_with_overrides(config, artifact, roof_area, tank_capacity)
        .map_err(|e| match e {
            EngineError::Config(e) => format!("Engine construction failed: {e}"),
            EngineError::Parameter(e) => format!("Rejected override: {e}"),
        })
}

fn run_cycle(engine: &WaterTwinEngine, cycle: &CycleArgs) -> ExitCode {
    let input = match SimulationInput::new(cycle.rainfall, cycle.fill, cycle.temperature) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Invalid input: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = engine.run(&input);
    let threshold = engine.config().critical_threshold_pct;

    if cycle.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize result: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(engine, &input, &result);
    }

    if let Some(alert) = TankStatus::alert(&result, threshold) {
        eprintln!("{alert}");
    }

    if let Some(command) = &cycle.advisor_command {
        let advice = Advisor::new(CommandGenerator::new(command.as_str())).strategic_advice(&result);
        println!("\n=== Strategic Analysis ===\n{advice}");
    } else if !cycle.json {
        // Mirrors the dashboard's message when the advisory layer isn't set up
        println!("\n{}", Advisor::new(Unconfigured).strategic_advice(&result));
    }

    ExitCode::SUCCESS
}

fn print_report(engine: &WaterTwinEngine, input: &SimulationInput, result: &SimulationResult) {
    let params = engine.parameters();

    println!("=== WaterTwin Simulation ===\n");
    println!(
        "Roof: {}, Tank: {}, Forecast: {}",
        params.roof_area(),
        params.tank_capacity(),
        engine.forecast_backend()
    );
    println!(
        "Rainfall: {}, Temperature: {}, Current storage: {}\n",
        input.rainfall, input.temperature, input.initial_fill
    );
    println!("Predicted Inflow:    {:>10.2} L", *result.inflow_l);
    println!("Predicted Usage:     {:>10.2} L", *result.predicted_usage_l);
    println!("Overflow Prediction: {:>10.2} L", *result.overflow_l);
    println!("Storage Level:       {:>10.1} %", *result.final_fill_pct);
    println!("Storage Status:      {:>10}", result.status.label());
}

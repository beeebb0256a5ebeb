use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Result, WrapErr};
use log::info;

use rvbench::report::divergence_report;
use rvbench::{
    parallel_multiplier_sweep, run_exercise, Exercise, Fault, SimulationConfig, StallPolicy,
};

/// Cycle-accurate ready/valid verification harness
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file with simulation parameters
    #[arg(short, long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenario families (all of them when none are named)
    Run {
        exercises: Vec<Exercise>,

        /// Inject a fault into the software stand-ins
        #[arg(short, long)]
        fault: Vec<Fault>,

        #[arg(short, long, value_enum, default_value_t = Backend::Software)]
        backend: Backend,

        /// Fail the run at the first stall instead of waiting on
        #[arg(long)]
        abort_on_stall: bool,
    },

    /// Exhaustive multiplier sweep on parallel workers
    Sweep {
        /// Worker count (defaults to the config's sweep_workers)
        #[arg(short, long)]
        workers: Option<usize>,

        #[arg(short, long)]
        fault: Vec<Fault>,
    },

    /// List exercises and their scenarios
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Software,
    Verilator,
}

fn load_config(path: Option<&Utf8PathBuf>) -> Result<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::from_file(path)
            .wrap_err_with(|| format!("loading config from {path}")),
        None => Ok(SimulationConfig::default()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[cfg(feature = "verilator")]
fn run_verilated(exercise: Exercise, config: &SimulationConfig) -> Result<rvbench::Checker> {
    Ok(rvbench::simulator::run_verilated(exercise, config)?)
}

#[cfg(not(feature = "verilator"))]
fn run_verilated(_exercise: Exercise, _config: &SimulationConfig) -> Result<rvbench::Checker> {
    eyre::bail!("rvbench was built without the `verilator` feature")
}

fn run(
    exercises: Vec<Exercise>,
    faults: &[Fault],
    backend: Backend,
    config: &SimulationConfig,
) -> Result<usize> {
    let exercises = if exercises.is_empty() {
        Exercise::ALL.to_vec()
    } else {
        exercises
    };

    let mut divergences = 0;
    for exercise in exercises {
        info!("running {exercise} on {backend:?}");
        let checker = match backend {
            Backend::Software => {
                run_exercise(exercise, exercise.software_dut(config, faults), config)?
            }
            Backend::Verilator => run_verilated(exercise, config)?,
        };
        print!("{}", divergence_report(exercise.name(), checker.records()));
        divergences += checker.records().len();
    }
    Ok(divergences)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_ref())?;

    let divergences = match cli.command {
        Commands::Run {
            exercises,
            fault,
            backend,
            abort_on_stall,
        } => {
            let config = if abort_on_stall {
                config.with_stall_policy(StallPolicy::Abort)
            } else {
                config
            };
            run(exercises, &fault, backend, &config)?
        }
        Commands::Sweep { workers, fault } => {
            let mut config = config;
            if let Some(workers) = workers {
                config.sweep_workers = workers;
            }
            let report = parallel_multiplier_sweep(&config, &fault).await?;
            print!("{}", divergence_report("sweep", &report.records));
            println!(
                "{} transactions on {} worker(s)",
                report.transactions, report.workers
            );
            report.records.len()
        }
        Commands::List => {
            for exercise in Exercise::ALL {
                println!("{exercise}");
                for scenario in exercise.scenarios(&config) {
                    println!("  {}", scenario.name());
                }
            }
            0
        }
    };

    if divergences == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

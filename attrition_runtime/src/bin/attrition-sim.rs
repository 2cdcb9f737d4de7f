//! Attrition simulator CLI
//!
//! Runs the monthly attrition model, sweeps recruiting lead times and
//! verifies that runs and stored reports replay deterministically.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use attrition_engine::config::SimulationConfig;
use attrition_engine::domain::Branch;
use attrition_runtime::drift::{compare_histories, verify_determinism};
use attrition_runtime::error::RuntimeError;
use attrition_runtime::export::{read_report, RunReport};
use attrition_runtime::logging;
use attrition_runtime::replay::replay_report;
use attrition_runtime::run::{load_config, RunParams, DEFAULT_EMPLOYEE_COUNT, DEFAULT_MONTHS, DEFAULT_SEED};
use attrition_runtime::scenario::{lead_time_sensitivity, SensitivityReport, DEFAULT_LEAD_DELTAS};
use attrition_runtime::session::Session;

#[derive(Parser)]
#[command(name = "attrition-sim")]
#[command(about = "Monthly attrition, backfill and workload spillover simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Number of employees to generate
    #[arg(short = 'n', long, default_value_t = DEFAULT_EMPLOYEE_COUNT)]
    employees: u32,

    /// Number of months to simulate
    #[arg(short, long, default_value_t = DEFAULT_MONTHS)]
    months: u32,

    /// Random seed
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// JSON configuration bundle; missing fields take defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn params(&self) -> Result<RunParams, RuntimeError> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => SimulationConfig::default(),
        };
        Ok(RunParams::new(config, self.employees, self.months, self.seed))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print the monthly records
    Run {
        #[command(flatten)]
        args: RunArgs,

        /// Persist the record log and report under this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Session name inside the output directory
        #[arg(long, default_value = "default")]
        session: String,
    },

    /// Sweep each branch's recruiting lead time around its configured value
    Sensitivity {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Check that a run is deterministic, or that a stored report replays
    Verify {
        #[command(flatten)]
        args: RunArgs,

        /// Replay this report instead of the parameters above
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<(), RuntimeError> {
    match command {
        Commands::Run {
            args,
            output_dir,
            session,
        } => {
            let params = args.params()?;
            let report = match output_dir {
                Some(dir) => Session::start(&dir, &session, params)?.run_to_end()?,
                None => {
                    let run = params.simulate()?;
                    RunReport::from_run(&params, &run)
                }
            };
            if args.json {
                print_json(&report)?;
            } else {
                print_run(&report);
            }
        }

        Commands::Sensitivity { args } => {
            let params = args.params()?;
            let report = lead_time_sensitivity(&params, &DEFAULT_LEAD_DELTAS)?;
            if args.json {
                print_json(&report)?;
            } else {
                print_sensitivity(&params, &report);
            }
        }

        Commands::Verify { args, report } => match report {
            Some(path) => {
                let stored = read_report(&path)?;
                let run = replay_report(&stored)?;
                let drift = compare_histories(&stored.records, &run.records);
                if args.json {
                    print_json(&drift)?;
                } else {
                    println!("{}: replay matches ({})", path.display(), stored.history_hash);
                }
            }
            None => {
                let hash = verify_determinism(&args.params()?)?;
                if args.json {
                    print_json(&serde_json::json!({ "history_hash": hash }))?;
                } else {
                    println!("deterministic: {}", hash);
                }
            }
        },
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), RuntimeError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| RuntimeError::Io(std::io::Error::other(e)))?;
    println!("{}", text);
    Ok(())
}

fn print_run(report: &RunReport) {
    println!(
        "{:>5} {:>7} {:>7} {:>9} {:>6} {:>6} {:>7} {:>12}",
        "month", "urban", "rural", "hp_ot_h", "quit", "hired", "open", "loss"
    );
    for r in &report.records {
        println!(
            "{:>5} {:>7} {:>7} {:>9.1} {:>6} {:>6} {:>7} {:>12.2}",
            r.month,
            r.urban_count,
            r.rural_count,
            r.hp_overtime_avg,
            r.resigned,
            r.hired,
            r.open_vacancies,
            r.cumulative_loss
        );
    }

    let s = &report.summary;
    println!();
    println!("final loss        {:.2} (cash out {:.2})", s.final_cumulative_loss, s.final_cash_out);
    println!(
        "retention         urban {:.1}%  rural {:.1}%",
        s.urban_retention_pct, s.rural_retention_pct
    );
    if let Some(month) = s.peak_hp_month {
        println!("peak HP overtime  {:.1} h at month {}", s.peak_hp_overtime, month);
    }
    println!("months over 80 h  {}", s.months_over_overwork_line);
    println!("history hash      {}", report.history_hash);
}

fn print_sensitivity(params: &RunParams, report: &SensitivityReport) {
    println!("base final loss {:.2}", report.base_final_loss);
    for branch in Branch::ALL {
        println!();
        println!("{} (configured lead time {} months)", branch, params.config.lead_time(branch));
        println!("{:>6} {:>5} {:>12} {:>10}", "delta", "lead", "loss", "vs base");
        for p in report.points_for(branch) {
            println!(
                "{:>+6} {:>5} {:>12.2} {:>+10.2}",
                p.delta_months, p.lead_time, p.final_loss, p.loss_delta
            );
        }
    }
}

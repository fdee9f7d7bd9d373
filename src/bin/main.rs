//! The CLI entry point: parses a config file, builds a `SimulationContext`, and runs it.
//! Grounded in the teacher's `runner.rs` clap-derive pattern, trimmed to this crate's surface —
//! there is no REPL/debugger/web API to wire up, so `clap::Parser` replaces
//! `Command::augment_args`/`FromArgMatches` entirely.
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use masim::config::Config;
use masim::context::SimulationContext;
use masim::log::LevelFilter;

/// An individual-based malaria transmission simulation.
#[derive(Parser, Debug)]
#[command(name = "masim", version, about)]
struct CliArgs {
    /// Path to the run's YAML configuration.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output directory for reporter CSVs. If omitted, the run still executes but nothing is
    /// written to disk.
    #[arg(short = 'o', long = "output")]
    output_dir: Option<PathBuf>,

    /// Job number, used to namespace output file names (`job{N}_*.csv`).
    #[arg(short = 'j', long = "job", default_value_t = 1)]
    job_number: u32,

    /// Reporter to use. `csv` is the only implementation this crate carries.
    #[arg(short = 'r', long = "reporter", default_value = "csv")]
    reporter: String,

    /// Load the configured genotype space and drug/therapy/strategy tables, print a summary,
    /// and exit without running the simulation.
    #[arg(short = 'l', long = "load")]
    load_only: bool,

    /// Print the run's movement/travel-weight matrix and exit without running the simulation.
    #[arg(short = 'm', long = "mvmt")]
    dump_movement: bool,

    /// Log verbosity: 0 = off, 1 = error, 2 = warn, 3 = info, 4 = debug, 5 = trace.
    #[arg(long = "v", default_value_t = 0)]
    verbosity: u8,
}

fn verbosity_to_level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    masim::log::set_log_level(verbosity_to_level_filter(args.verbosity));

    if args.reporter != "csv" {
        eprintln!("unknown reporter '{}': only 'csv' is implemented", args.reporter);
        return ExitCode::FAILURE;
    }

    let config = match Config::from_path(&args.input) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load config from {:?}: {error}", args.input);
            return ExitCode::FAILURE;
        }
    };

    let mut context = SimulationContext::from_config(config);

    if args.load_only {
        println!(
            "loaded {} drug type(s), {} therapy/therapies, {} strategy/strategies; genotype db is empty at startup and grows as infections are interned",
            context.population().drug_types().len(),
            context.therapy_db().len(),
            context.strategies().active_strategy_id().0,
        );
        return ExitCode::SUCCESS;
    }

    if args.dump_movement {
        let number_of_locations = context.spatial().number_of_locations().max(context.config().number_of_locations);
        for from in 0..number_of_locations as u32 {
            let weights: Vec<String> = (0..number_of_locations as u32).map(|to| format!("{:.4}", context.spatial().travel_weight(from, to))).collect();
            println!("{from}: [{}]", weights.join(", "));
        }
        return ExitCode::SUCCESS;
    }

    if let Some(output_dir) = args.output_dir.as_ref() {
        if let Err(error) = context.enable_reporting(output_dir, args.job_number) {
            eprintln!("failed to open reporter output in {output_dir:?}: {error}");
            return ExitCode::FAILURE;
        }
    }

    context.run();
    ExitCode::SUCCESS
}

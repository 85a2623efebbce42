//! decoy-run: headless scenario runner for the false-target pipeline.
//!
//! Usage:
//!   decoy-run run --scenario engagement.json --steps 120 --log-format json
//!   decoy-run template > engagement.json

use std::path::PathBuf;
use std::process;

use decoy_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use decoy_sim::scenario::Scenario;
use tracing::info;

const DEFAULT_STEPS: usize = 60;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "template" => cmd_template(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "decoy-run: false-target scenario runner\n\
         \n\
         Commands:\n\
         \n\
         run       Load a scenario and print one JSON frame report per step\n\
         \n\
           --scenario <path>   Scenario JSON file\n\
           --steps <N>         Steps to run (default: 60)\n\
           --dt <S>            Step length in seconds (default: from scenario)\n\
           --seed <N>          Override the scenario seed\n\
           --log-format <F>    pretty | compact | json (default: pretty)\n\
           --log-level <L>     trace | debug | info | warn | error (default: info)\n\
         \n\
         template  Print a sample two-site scenario\n\
         \n\
         Examples:\n\
         \n\
           decoy-run template > engagement.json\n\
           decoy-run run --scenario engagement.json --steps 120 --log-format json\n"
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
    }
    None
}

// A flag that is present but unparsable exits.
fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    let raw = flag_value(args, flag)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            eprintln!("Error: invalid value for {flag}: {raw}");
            process::exit(1);
        }
    }
}

fn parse_log_config(args: &[String]) -> LogConfig {
    let mut config = LogConfig::default();
    if let Some(format) = parse_flag::<LogFormat>(args, "--log-format") {
        config.format = format;
    }
    if let Some(level) = parse_flag::<LogLevel>(args, "--log-level") {
        config.level = level;
    }
    config
}

// --- Run command ---

fn cmd_run(args: &[String]) {
    init_logging(&parse_log_config(args));

    let path = match flag_value(args, "--scenario") {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("Error: --scenario <path> is required");
            process::exit(1);
        }
    };

    let mut scenario = match Scenario::from_file(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading {}: {e}", path.display());
            process::exit(1);
        }
    };
    if let Some(dt) = parse_flag::<f64>(args, "--dt") {
        if !(dt > 0.0 && dt.is_finite()) {
            eprintln!("Error: --dt must be positive");
            process::exit(1);
        }
        scenario.dt = dt;
    }
    if let Some(seed) = parse_flag::<u64>(args, "--seed") {
        scenario.seed = seed;
    }
    let steps = parse_flag::<usize>(args, "--steps").unwrap_or(DEFAULT_STEPS);

    let mut engine = match scenario.build() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error building scenario: {e}");
            process::exit(1);
        }
    };
    info!(
        scenario = %path.display(),
        steps,
        dt = engine.dt(),
        seed = scenario.seed,
        "run started"
    );

    for _ in 0..steps {
        let report = engine.step();
        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(e) => {
                eprintln!("Error encoding report: {e}");
                process::exit(1);
            }
        }
    }

    info!(elapsed = engine.time().elapsed_secs, "run finished");
}

// --- Template command ---

fn cmd_template() {
    match Scenario::template().to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error encoding template: {e}");
            process::exit(1);
        }
    }
}

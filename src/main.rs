//! Microgrid simulator entry point: CLI wiring and one constant-action episode.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use tcl_microgrid_sim::config::ScenarioConfig;
use tcl_microgrid_sim::data::MarketData;
use tcl_microgrid_sim::io::export::export_csv;
use tcl_microgrid_sim::runner::run_episode;
use tcl_microgrid_sim::sim::action::{ACTION_COUNT, Action};
use tcl_microgrid_sim::sim::controller::ConstantPolicy;
use tcl_microgrid_sim::sim::engine::MicrogridSimulator;
use tcl_microgrid_sim::sim::recorder::EpisodeRecorder;
use tcl_microgrid_sim::sim::types::DaySelection;

/// Index of `[1,2,0,0]`: one third of the fleet budget at the neutral tier.
const DEFAULT_ACTION_INDEX: usize = 28;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    day: Option<usize>,
    action_index: usize,
    telemetry_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("tcl-microgrid-sim: hourly microgrid simulator with a TCL fleet");
    eprintln!();
    eprintln!("Usage: tcl-microgrid-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --day <n>                Run on this day instead of a random one");
    eprintln!("  --action <index>         Constant action index 0..{ACTION_COUNT} (default: {DEFAULT_ACTION_INDEX})");
    eprintln!("  --telemetry-out <path>   Export step records to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after the episode");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following flag `name`, or exits with an error.
fn value_for<'a>(args: &'a [String], i: usize, name: &str, kind: &str) -> &'a str {
    match args.get(i) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("error: {name} requires a {kind} argument");
            process::exit(1);
        }
    }
}

/// Parses the value following flag `name`, or exits with an error.
fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, name: &str, kind: &str) -> T {
    let raw = value_for(args, i, name, kind);
    raw.parse::<T>().unwrap_or_else(|_| {
        eprintln!("error: {name} value \"{raw}\" is not a valid {kind}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        day: None,
        action_index: DEFAULT_ACTION_INDEX,
        telemetry_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(value_for(&args, i, "--scenario", "path").to_string());
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(value_for(&args, i, "--preset", "name").to_string());
            }
            "--seed" => {
                i += 1;
                cli.seed_override = Some(parse_value(&args, i, "--seed", "u64"));
            }
            "--day" => {
                i += 1;
                cli.day = Some(parse_value(&args, i, "--day", "usize"));
            }
            "--action" => {
                i += 1;
                cli.action_index = parse_value(&args, i, "--action", "usize");
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out = Some(value_for(&args, i, "--telemetry-out", "path").to_string());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                cli.port = parse_value(&args, i, "--port", "u16");
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = parse_args();
    init_tracing();

    // Load config: --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let action = match Action::from_index(cli.action_index) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let data = match MarketData::load(&scenario.data, scenario.simulation.seed) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: failed to load data: {e}");
            process::exit(1);
        }
    };

    let mut sim = match MicrogridSimulator::from_seed(scenario.clone(), data) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let selection = cli.day.map_or(DaySelection::Configured, DaySelection::Fixed);
    let mut recorder = EpisodeRecorder::new();
    let summary = match run_episode(&mut sim, selection, &mut ConstantPolicy(action), &mut recorder)
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    println!("Day {} with constant action {action}", sim.day());
    for r in recorder.records() {
        println!("{r}");
    }
    println!("\n{summary}");

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(recorder.records(), Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(tcl_microgrid_sim::api::AppState {
            config: scenario,
            summary,
            records: recorder.into_records(),
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(tcl_microgrid_sim::api::serve(state, addr)) {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

// Agora Simulation Runner — kinetic Monte Carlo over a social-interaction graph
//
// Usage:
//   cargo run --release --bin agora                      # Default configuration
//   cargo run --release --bin agora -- --config sim.json # Load a config file
//   cargo run --release --bin agora -- --seed 42         # Custom seed
//   cargo run --release --bin agora -- --max-time 5000   # Override the time bound
//   cargo run --release --bin agora -- --quiet           # No stdout summaries

use std::fs::File;
use std::io::{self, BufWriter};
use std::time::Instant;

use tracing::{error, info};

use agora_engine::{AgoraSimulation, SimConfig, SummaryRouter};

/// The summary file every run produces next to the process.
const DATA_FILE: &str = "DATA_vs_TIME";

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    config_path: Option<String>,
    seed: u64,
    max_time: Option<f64>,
    quiet: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        config_path: None,
        seed: 1,
        max_time: None,
        quiet: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i < args.len() {
                    cli.config_path = Some(args[i].clone());
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(1);
                }
            }
            "--max-time" => {
                i += 1;
                if i < args.len() {
                    cli.max_time = args[i].parse().ok();
                }
            }
            "--quiet" => {
                cli.quiet = true;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

fn load_config(cli: &CliArgs) -> Result<SimConfig, String> {
    let mut config = match &cli.config_path {
        Some(path) => {
            let file = File::open(path).map_err(|e| format!("open {}: {}", path, e))?;
            serde_json::from_reader(file).map_err(|e| format!("parse {}: {}", path, e))?
        }
        None => SimConfig::default(),
    };
    if let Some(max_time) = cli.max_time {
        config.max_time = max_time;
    }
    if cli.quiet {
        config.output_stdout_summary = false;
    }
    Ok(config)
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = parse_args();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!("configuration error: {}", err);
            std::process::exit(1);
        }
    };

    let stdout_sink: Option<Box<dyn io::Write>> = if config.output_stdout_summary {
        Some(Box::new(io::stdout()))
    } else {
        None
    };
    let file_sink: Option<Box<dyn io::Write>> = match File::create(DATA_FILE) {
        Ok(file) => Some(Box::new(BufWriter::new(file))),
        Err(err) => {
            error!("cannot create {}: {}", DATA_FILE, err);
            std::process::exit(1);
        }
    };

    let mut sim = match AgoraSimulation::new(config, cli.seed) {
        Ok(sim) => sim.with_summary(SummaryRouter::new(stdout_sink, file_sink)),
        Err(err) => {
            error!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    info!(
        "Agora v{} | PRNG: ChaCha8Rng | seed: {} | max_entities: {} | max_time: {}",
        env!("CARGO_PKG_VERSION"),
        cli.seed,
        sim.config().max_entities,
        sim.config().max_time,
    );

    let start = Instant::now();
    let end_time = sim.run();
    let elapsed = start.elapsed();

    let stats = sim.stats();
    println!();
    println!("  Simulated time:  {:.2}", end_time);
    println!("  Entities:        {}", sim.n_entities());
    println!("  Steps:           {}", stats.n_steps);
    println!("  Follows:         {}", stats.n_follows);
    println!("  Tweets:          {}", stats.n_tweets);
    println!("  Retweets:        {}", stats.n_retweets);
    println!("  Tweets observable: {}", sim.tweet_bank().n_observable());
    println!("  Wall time:       {:.2}s", elapsed.as_secs_f64());
    println!("  Summary file:    {}", DATA_FILE);
}

//! UltraSentry - two-node ultrasonic presence detection
//!
//! One binary, two roles selected by configuration: the sensing node
//! samples an ultrasonic rangefinder and transmits a compact detection
//! record every cycle; the receiving node aggregates inbound records,
//! pulses an alert actuator, and answers status queries.

use std::env;
use ultrasentry::app::App;
use ultrasentry::{Config, Result};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `ultrasentry <path>` (positional)
/// - `ultrasentry --config <path>` (flag-based)
/// - `ultrasentry -c <path>` (short flag)
///
/// Defaults to `/etc/ultrasentry.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/ultrasentry.toml".to_string()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("UltraSentry v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = parse_config_path();
    log::info!("Using config: {}", config_path);
    let config = Config::load(&config_path)?;

    let mut app = App::new(config);
    app.run()?;

    log::info!("UltraSentry stopped");
    Ok(())
}

//! statrt - Statistics over f64 arrays
//!
//! CLI entry point: reads numbers, runs them through a context and prints
//! the requested statistics.

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Number, Value};
use statrt::{Context, Statistic, StatrtConfig};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "statrt")]
#[command(version)]
#[command(about = "Statistics over f64 arrays on the statrt runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute statistics over numbers from a file or stdin
    Compute {
        /// Input file (whitespace or comma separated); stdin if omitted
        input: Option<PathBuf>,

        /// Statistic to compute (repeatable; all if omitted)
        #[arg(short, long = "stat", value_name = "NAME")]
        stats: Vec<String>,

        /// Trace allocations and print the debugging report
        #[arg(short, long)]
        debug: bool,

        /// Emit a JSON object instead of text
        #[arg(long)]
        json: bool,

        /// Digits after the decimal point (overrides statrt.toml)
        #[arg(short, long)]
        precision: Option<usize>,
    },

    /// Print the resolved statrt.toml configuration
    Config {
        /// Directory to search from (default: current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compute {
            input,
            stats,
            debug,
            json,
            precision,
        } => cmd_compute(input, &stats, debug, json, precision),
        Commands::Config { dir } => cmd_config(dir),
    }
}

fn cmd_compute(
    input: Option<PathBuf>,
    stat_names: &[String],
    debug: bool,
    json: bool,
    precision: Option<usize>,
) -> Result<()> {
    let project = StatrtConfig::load_from_cwd().context("Failed to load statrt.toml")?;
    let mut config = project.context;
    if debug {
        config.set_debugging(true);
    }
    let precision = precision.unwrap_or(project.report.precision);

    let stats = if stat_names.is_empty() {
        Statistic::ALL.to_vec()
    } else {
        stat_names
            .iter()
            .map(|name| name.parse::<Statistic>())
            .collect::<Result<Vec<_>, _>>()?
    };

    let text = match &input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    let values = parse_values(&text)?;

    let ctx = Context::new(&config);
    let array = ctx.new_array(&values)?;
    let mut results = Vec::with_capacity(stats.len());
    for stat in stats {
        results.push((stat, ctx.entry(stat, &array)?));
    }
    ctx.free_array(array)?;

    if json {
        let mut object = Map::new();
        for (stat, value) in &results {
            // JSON has no NaN or infinities
            let value = Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null);
            object.insert(stat.name().to_string(), value);
        }
        println!("{}", serde_json::to_string_pretty(&Value::Object(object))?);
    } else {
        for (stat, value) in &results {
            println!("{}: {:.*}", stat, precision, value);
        }
    }

    ctx.debugging_report();
    Ok(())
}

fn cmd_config(dir: Option<PathBuf>) -> Result<()> {
    let config = match dir {
        Some(dir) => StatrtConfig::find_and_load(&dir),
        None => StatrtConfig::load_from_cwd(),
    }
    .context("Failed to load statrt.toml")?;
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Parse whitespace- or comma-separated numbers.
fn parse_values(text: &str) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for token in text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let value: f64 = token
            .parse()
            .with_context(|| format!("Invalid number '{}'", token))?;
        values.push(value);
    }
    if values.is_empty() {
        bail!("No input values");
    }
    Ok(values)
}

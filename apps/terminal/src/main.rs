//! # tienda-quote
//!
//! Prices a cart from the command line.
//!
//! ## Usage
//! ```bash
//! # Price a request against the configured catalog
//! tienda-quote request.json
//!
//! # Explicit catalog and config
//! tienda-quote --catalog ./catalog.json --config ./tienda.toml request.json
//!
//! # Read the request from stdin
//! cat request.json | tienda-quote -
//! ```
//!
//! Prints the priced cart (items and totals) as JSON on stdout. Logs go to
//! stderr. Exits non-zero with the API error on stdout when the request
//! cannot be applied.

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use tienda_terminal::commands::quote::{replay_quote, QuoteRequest};
use tienda_terminal::state::ConfigState;
use tienda_terminal::{init_tracing, Session};

/// Parsed command line.
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    config_path: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    request_path: Option<String>,
    help: bool,
}

/// Parses the arguments after the program name.
fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            flag @ ("--config" | "-c" | "--catalog" | "-k") => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("missing value for {}", flag))?;
                let path = Some(PathBuf::from(value));
                if flag == "--config" || flag == "-c" {
                    cli.config_path = path;
                } else {
                    cli.catalog_path = path;
                }
                i += 1;
            }
            "--help" | "-h" => cli.help = true,
            other => cli.request_path = Some(other.to_string()),
        }
        i += 1;
    }

    Ok(cli)
}

fn print_help() {
    println!("Tienda quote pricer");
    println!();
    println!("Usage: tienda-quote [OPTIONS] <REQUEST.json | ->");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>    Config file (default: platform config dir)");
    println!("  -k, --catalog <PATH>   Catalog snapshot (overrides config)");
    println!("  -h, --help             Show this help message");
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let cli = parse_args(&args)?;
    if cli.help {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }

    let request_path = cli
        .request_path
        .ok_or("missing request file (use - for stdin)")?;

    let mut config = ConfigState::load(cli.config_path)?;
    if cli.catalog_path.is_some() {
        config.catalog_path = cli.catalog_path;
    }

    let request_json = if request_path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&request_path)?
    };
    let request: QuoteRequest = serde_json::from_str(&request_json)?;

    let session = Session::open(config)?;

    match replay_quote(&session.catalog, &session.cart, &request) {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

mod config;
mod error;
mod logging;
mod mixer;
mod order_queue;
mod ship_buffer;
mod shop;
mod shutdown;
mod sim;
mod tints;
mod types;

use std::str::FromStr;

use error::CliError;
use sim::{BenchParams, StressParams};

fn parse_value<T: FromStr>(
    command: &'static str,
    field: &'static str,
    arg: &str,
) -> Result<T, CliError> {
    arg.trim().parse::<T>().map_err(|_| CliError::InvalidValue {
        command,
        field,
        value: arg.to_string(),
    })
}

fn parse_positive(command: &'static str, field: &'static str, arg: &str) -> Result<usize, CliError> {
    match parse_value::<usize>(command, field, arg)? {
        0 => Err(CliError::Zero { command, field }),
        value => Ok(value),
    }
}

/// Comma-separated list of positive values; `-` means "keep defaults".
fn parse_usize_list(
    command: &'static str,
    field: &'static str,
    arg: &str,
) -> Result<Option<Vec<usize>>, CliError> {
    if arg == "-" {
        return Ok(None);
    }
    arg.split(',')
        .map(|part| parse_positive(command, field, part))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn parse_bench(args: impl Iterator<Item = String>) -> Result<BenchParams, CliError> {
    const COMMAND: &str = "bench";
    let mut params = BenchParams::default();
    let mut position = 0;
    for arg in args {
        if arg == "validate" {
            params.validate = true;
            continue;
        }
        match position {
            0 => params.customers = Some(parse_positive(COMMAND, "customers", &arg)?),
            1 => params.orders_per_customer = Some(parse_positive(COMMAND, "orders_per_customer", &arg)?),
            2 => params.staff = Some(parse_positive(COMMAND, "staff", &arg)?),
            3 => params.tints = Some(parse_positive(COMMAND, "tints", &arg)?),
            4 => params.work_ms = Some(parse_value(COMMAND, "work_ms", &arg)?),
            _ => {
                return Err(CliError::Unexpected {
                    command: COMMAND,
                    value: arg,
                });
            }
        }
        position += 1;
    }
    Ok(params)
}

fn parse_stress(args: impl Iterator<Item = String>) -> Result<StressParams, CliError> {
    const COMMAND: &str = "stress";
    let mut params = StressParams::default();
    let mut position = 0;
    for arg in args {
        if arg == "validate" {
            params.validate = true;
            continue;
        }
        match position {
            0 => params.customer_sets = parse_usize_list(COMMAND, "customer_sets", &arg)?,
            1 => params.staff_sets = parse_usize_list(COMMAND, "staff_sets", &arg)?,
            2 => params.tint_sets = parse_usize_list(COMMAND, "tint_sets", &arg)?,
            3 => params.work_ms = Some(parse_value(COMMAND, "work_ms", &arg)?),
            _ => {
                return Err(CliError::Unexpected {
                    command: COMMAND,
                    value: arg,
                });
            }
        }
        position += 1;
    }
    Ok(params)
}

fn print_usage(program: &str) {
    println!("Paint Shop CLI");
    println!("Usage:");
    println!("  {program} (run demo)");
    println!("  {program} bench [customers] [orders_per_customer] [staff] [tints] [work_ms] [validate]");
    println!("  {program} stress [customer_sets] [staff_sets] [tint_sets] [work_ms] [validate]");
    println!("  {program} --help");
    println!();
    println!("Sets are comma-separated lists (e.g., 1,2,4). Use \"-\" to keep defaults for a set.");
    println!("Defaults:");
    println!("  bench  customers=8 orders_per_customer=25 staff=4 tints=10 work_ms=2");
    println!("  stress customers=1,4,16 staff=1,2,4,8 tints=3,10 work_ms=1");
    println!("Flags:");
    println!("  validate  report tint exclusivity and mismatched-return violations");
    println!("Logging: RUST_LOG=debug|trace overrides the default level.");
}

fn exit_with_usage(program: &str, err: CliError) -> ! {
    eprintln!("{err}");
    print_usage(program);
    std::process::exit(2);
}

fn main() {
    logging::init();
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "paintshop".to_string());
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("bench") => match parse_bench(args) {
            Ok(params) => sim::run_benchmark(params),
            Err(err) => exit_with_usage(&program, err),
        },
        Some("stress") => match parse_stress(args) {
            Ok(params) => sim::run_stress(params),
            Err(err) => exit_with_usage(&program, err),
        },
        Some("--help") | Some("-h") | Some("help") => print_usage(&program),
        Some(other) => exit_with_usage(&program, CliError::UnknownCommand(other.to_string())),
        None => sim::run_demo(),
    }
}

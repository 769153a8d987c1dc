use std::env;
use std::path::PathBuf;

use crate::sim::calendar::ReportPeriod;

/// Preset used when neither `--config` nor `--preset` is given.
pub const DEFAULT_PRESET: &str = "baseline";

#[derive(Debug)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub ledger_out: Option<PathBuf>,
    pub report_out: Option<PathBuf>,
    pub period: Option<ReportPeriod>,
}

/// What the binary should do after parsing.
#[derive(Debug)]
pub enum Command {
    Run(CliOptions),
    Help,
}

pub fn parse_args() -> Result<Command, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<Command, String> {
    if args.iter().any(|a| a == "--help" || a == "-h") {
        return Ok(Command::Help);
    }
    parse_options(&args).map(Command::Run)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut ledger_out = None;
    let mut report_out = None;
    let mut period = None;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --config (expected a TOML or JSON file path)",
                )?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--ledger-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --ledger-out (expected a file path)")?;
                if ledger_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--ledger-out provided more than once".to_string());
                }
            }
            "--report-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --report-out (expected a file path)")?;
                if report_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--report-out provided more than once".to_string());
                }
            }
            "--period" => {
                i += 1;
                let value =
                    args.next_or_err(i, "missing value for --period (expected month or year)")?;
                let parsed = value.parse::<ReportPeriod>()?;
                if period.replace(parsed).is_some() {
                    return Err("--period provided more than once".to_string());
                }
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if config.is_none() && preset.is_none() {
        preset = Some(DEFAULT_PRESET.to_string());
    }

    Ok(CliOptions {
        config,
        preset,
        ledger_out,
        report_out,
        period,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("hot-sun: hourly PV, storage and grid dispatch simulator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  hot-sun [--config <path> | --preset <name>] [--ledger-out <path>] \
         [--report-out <path>] [--period month|year]"
    );
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>       Load a scenario from a TOML or JSON file");
    eprintln!("  --preset <name>       Use a built-in preset (baseline, home_battery, time_of_use)");
    eprintln!("  --ledger-out <path>   Write the hourly energy ledger as CSV");
    eprintln!("  --report-out <path>   Write the period report as CSV");
    eprintln!("  --period <p>          Override the report period (month or year)");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the {DEFAULT_PRESET} preset is used.");
}

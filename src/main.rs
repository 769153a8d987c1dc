//! hot-sun entry point: CLI wiring and config-driven run.

use std::error::Error;
use std::path::Path;
use std::process;

use tracing::info;

use hot_sun::cli::{self, CliOptions, Command};
use hot_sun::config::{RunConfig, ScenarioConfig};
use hot_sun::io::export::{export_ledger_csv, export_report_csv};
use hot_sun::reporting::print_report;
use hot_sun::sim::{RunControl, run_post_processing, run_simulation};
use hot_sun::sources::{demand_series, generation_series};
use hot_sun::telemetry::init_tracing;

/// Loads the scenario: `--config` takes priority, then `--preset`.
fn load_scenario(opts: &CliOptions) -> Result<ScenarioConfig, String> {
    if let Some(ref path) = opts.config {
        return ScenarioConfig::from_file(path).map_err(|e| e.to_string());
    }
    let name = opts.preset.as_deref().unwrap_or(cli::DEFAULT_PRESET);
    ScenarioConfig::from_preset(name).map_err(|e| e.to_string())
}

/// Progress sink printing a percentage line to stderr whenever it changes.
fn stderr_progress() -> impl FnMut(usize, usize, &str) {
    let mut last_pct = None;
    move |current: usize, total: usize, label: &str| {
        let pct = (current * 100).checked_div(total).unwrap_or(100);
        if last_pct != Some(pct) {
            last_pct = Some(pct);
            eprint!("\r{label:<12} {pct:>3}%");
            if current >= total {
                eprintln!();
            }
        }
    }
}

fn run(opts: &CliOptions, scenario: &ScenarioConfig) -> Result<(), Box<dyn Error>> {
    let mut config = RunConfig::try_from(scenario)?;
    if let Some(period) = opts.period {
        config.period = period;
    }

    let hours = config.horizon_hours;
    let demand = demand_series(scenario, hours)?;
    let generation = generation_series(scenario, hours)?;

    let strategy = config.strategy.build();
    let mut sink = stderr_progress();
    let mut control = RunControl::new(&mut sink);
    let ledger = run_simulation(&demand, &generation, strategy.as_ref(), &config, &mut control)?;
    let report = run_post_processing(&ledger, &config, &mut control)?;

    print_report(&report);

    if let Some(ref path) = opts.ledger_out {
        export_ledger_csv(&ledger, Path::new(path))?;
        info!(path = %path.display(), rows = ledger.len(), "ledger written");
    }
    if let Some(ref path) = opts.report_out {
        export_report_csv(&report, Path::new(path))?;
        info!(path = %path.display(), rows = report.len(), "report written");
    }
    Ok(())
}

fn main() {
    init_tracing();

    let opts = match cli::parse_args() {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            cli::print_usage();
            return;
        }
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    let scenario = match load_scenario(&opts) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    // Report every problem at once before any simulation work
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if let Err(e) = run(&opts, &scenario) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

//! ACCD Sim - Entry point
//!
//! CLI Usage:
//!   accd-sim simulate --mode endophytic              # Run and print the response JSON
//!   accd-sim simulate --request run.json --csv out.csv
//!   accd-sim simulate --set k_exp=0.2 --set t_end=48 # Ad hoc overrides
//!   accd-sim defaults                                # Parameter defaults and mode presets
//!   accd-sim diagnose --mode feedback -n 6           # Solver statistics and flux breakdown

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use accd_sim::{
    config::{EngineConfig, Mode, ModelParameters},
    error::SimulationError,
    export::{
        downsample_indices, export_parameters_csv, export_results_csv, export_results_json,
        DefaultsCatalog, ErrorResponse, SimulationResponse,
    },
    model::Scenario,
    simulation::{SimulationEngine, SimulationOutcome, SimulationRequest},
    SimResult, StressProfile,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "accd-sim")]
#[command(about = "ACC / ethylene / ACC deaminase simulation engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config JSON (solver tolerances, timeout, threading)
    #[arg(long, default_value = "data/parameters/engine.json", global = true)]
    engine_config: PathBuf,

    /// Base parameter JSON that requests are resolved against
    #[arg(long, default_value = "data/parameters/model.json", global = true)]
    params: PathBuf,
}

/// Request inputs shared by `simulate` and `diagnose`
#[derive(clap::Args)]
struct RequestArgs {
    /// Request JSON file ('-' for stdin)
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Mode preset, overrides the request's mode
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Parameter override as KEY=VALUE, may be repeated
    #[arg(short = 's', long = "set", value_parser = parse_override)]
    overrides: Vec<(String, f64)>,

    /// Stress onset for a step profile (h)
    #[arg(long)]
    stress_onset: Option<f64>,

    /// Wall-clock budget for the run (ms)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run control and treatment and print the response JSON
    Simulate {
        #[command(flatten)]
        request: RequestArgs,

        /// Most samples per series in the response (0 keeps all)
        #[arg(long, default_value = "500")]
        max_points: usize,

        /// Write the response JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Results CSV path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Parameter CSV path
        #[arg(long)]
        params_csv: Option<PathBuf>,

        /// Directory for a timestamped JSON export
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },

    /// Print default parameters, modes and mode presets
    Defaults,

    /// Run a request and report solver statistics and fluxes
    Diagnose {
        #[command(flatten)]
        request: RequestArgs,

        /// Number of samples in the flux table
        #[arg(short = 'n', long, default_value = "5")]
        samples: usize,
    },
}

fn parse_override(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for `{}`: {e}", key.trim()))?;
    Ok((key.trim().to_string(), value))
}

/// Process exit code for an engine error
fn exit_code(error: &SimulationError) -> i32 {
    match error.status_code() {
        504 => 4,
        500 => 3,
        _ => 2,
    }
}

fn read_request(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        Ok(body)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

impl RequestArgs {
    fn build(&self) -> Result<SimResult<SimulationRequest>> {
        let mut request = match &self.request {
            Some(path) => match SimulationRequest::from_json(&read_request(path)?) {
                Ok(request) => request,
                Err(e) => return Ok(Err(e)),
            },
            None => SimulationRequest::default(),
        };
        if let Some(mode) = self.mode {
            request.mode = mode;
        }
        if let Some(onset_h) = self.stress_onset {
            request.stress_profile = StressProfile::Step { onset_h };
        }
        for (key, value) in &self.overrides {
            request.overrides.insert(key.as_str(), *value);
        }
        Ok(Ok(request))
    }

    fn engine(&self, cli: &Cli) -> SimulationEngine {
        let mut config = EngineConfig::load_or_default(&cli.engine_config);
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = Some(timeout_ms);
        }
        SimulationEngine::new(config)
            .with_base_parameters(ModelParameters::load_or_default(&cli.params))
    }

    fn run(&self, cli: &Cli) -> Result<SimResult<SimulationOutcome>> {
        let request = match self.build()? {
            Ok(request) => request,
            Err(e) => return Ok(Err(e)),
        };
        Ok(self.engine(cli).run(&request))
    }
}

/// Print the error body and leave with a non-zero status
fn fail(error: &SimulationError) -> ! {
    let (status, body) = ErrorResponse::from_error(error);
    log::error!("Request failed with status {}: {}", status, body.detail);
    match serde_json::to_string_pretty(&body) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{{\"detail\": {:?}}}", body.detail),
    }
    std::process::exit(exit_code(error));
}

fn run_simulate(
    cli: &Cli,
    args: &RequestArgs,
    max_points: usize,
    output: Option<&Path>,
    csv: Option<&Path>,
    params_csv: Option<&Path>,
    export_dir: Option<&Path>,
) -> Result<()> {
    let outcome = match args.run(cli)? {
        Ok(outcome) => outcome,
        Err(e) => fail(&e),
    };
    let limit = (max_points > 0).then_some(max_points);
    let response = SimulationResponse::from_outcome(&outcome, limit);

    let json = serde_json::to_string_pretty(&response)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            log::info!("Response written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = csv {
        export_results_csv(&response.time_series, path)?;
    }
    if let Some(path) = params_csv {
        export_parameters_csv(&outcome.params, path)?;
    }
    if let Some(dir) = export_dir {
        export_results_json(&response, dir)?;
    }
    Ok(())
}

/// Run a request and print solver statistics and flux breakdowns
fn run_diagnostics(cli: &Cli, args: &RequestArgs, samples: usize) -> Result<()> {
    println!("=== ACCD Sim - Diagnostics ===\n");

    let start = Instant::now();
    let outcome = match args.run(cli)? {
        Ok(outcome) => outcome,
        Err(e) => fail(&e),
    };
    let elapsed = start.elapsed();

    println!("Mode: {}", outcome.mode);
    println!("Stress profile: {}", outcome.stress_profile.kind());
    println!(
        "Horizon: {} h, {} samples",
        outcome.params.settings.t_end_h, outcome.params.settings.n_points
    );
    println!("Wall time: {:.1} ms\n", elapsed.as_secs_f64() * 1e3);

    for scenario in [Scenario::Control, Scenario::Treatment] {
        let stats = outcome.trajectory(scenario).stats;
        println!(
            "{:<9}  accepted {:>7}  rejected {:>5}  RHS evals {:>8}",
            scenario.to_string(),
            stats.accepted_steps,
            stats.rejected_steps,
            stats.rhs_evaluations
        );
    }

    let kpis = &outcome.kpis;
    let pct = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}%"));
    println!(
        "\nPeak ethylene: {:.4e} -> {:.4e} uM ({})",
        kpis.peak_ctrl_uM,
        kpis.peak_accd_uM,
        pct(kpis.reduction_peak_pct)
    );
    println!(
        "Final ethylene: {:.4e} -> {:.4e} uM ({})",
        kpis.ss_ctrl_uM,
        kpis.ss_accd_uM,
        pct(kpis.reduction_ss_pct)
    );
    println!(
        "Growth: {:.4} -> {:.4} ({})",
        kpis.growth_ctrl,
        kpis.growth_accd,
        pct(kpis.growth_improve_pct)
    );
    println!("Export fraction: {}", pct(kpis.export_fraction_pct));
    let mechanisms: Vec<String> = kpis.active_mechanisms.iter().map(|m| m.to_string()).collect();
    println!("Active mechanisms: [{}]", mechanisms.join(", "));

    println!(
        "\n{:>8}  {:>11}  {:>11}  {:>11}  {:>11}  {:>11}  {:>11}",
        "t (h)", "synthesis", "oxidation", "export", "direct", "rhizo", "C2H4 prod"
    );
    for i in downsample_indices(outcome.treatment.len(), samples) {
        let Some(f) = outcome.fluxes_at(Scenario::Treatment, i) else {
            continue;
        };
        println!(
            "{:>8.2}  {:>11.4e}  {:>11.4e}  {:>11.4e}  {:>11.4e}  {:>11.4e}  {:>11.4e}",
            outcome.treatment.time_h[i],
            f.synthesis,
            f.oxidation,
            f.export,
            f.direct_sink,
            f.rhizosphere_uptake,
            f.ethylene_production
        );
    }

    println!("\n=== Diagnostics Complete ===");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Simulate {
            request,
            max_points,
            output,
            csv,
            params_csv,
            export_dir,
        } => run_simulate(
            &cli,
            request,
            *max_points,
            output.as_deref(),
            csv.as_deref(),
            params_csv.as_deref(),
            export_dir.as_deref(),
        ),
        Commands::Defaults => {
            println!("{}", serde_json::to_string_pretty(&DefaultsCatalog::build())?);
            Ok(())
        }
        Commands::Diagnose { request, samples } => run_diagnostics(&cli, request, *samples),
    }
}

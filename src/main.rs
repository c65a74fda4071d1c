//! stepgraph CLI - run the plan-review loop or the realty valuation pipeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use stepgraph::config::{LlmConfig, SearchConfig};
use stepgraph::plan_review::{self, PlanState};
use stepgraph::realty::{self, RealtyState};
use stepgraph::Ctx;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stepgraph")]
#[command(about = "Run agent step graphs from the command line", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Chat model name
    #[arg(long, global = true, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Sampling temperature (overrides OPENAI_TEMPERATURE)
    #[arg(long, global = true)]
    temperature: Option<f64>,

    /// Timeout for each external call, in seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draft and review a plan until it is approved or attempts run out
    Plan {
        /// Task the plan is for
        task: String,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Research, value and report on a property
    Appraise {
        /// Property address
        address: String,
        /// Property details as a JSON object
        #[arg(long, conflicts_with = "details_file")]
        details: Option<String>,
        /// Read property details from a JSON file
        #[arg(long)]
        details_file: Option<PathBuf>,
        /// What-if scenario for the valuation
        #[arg(long)]
        scenario: Option<String>,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Plan { task, json } => {
            let state = plan_review::run(task.as_str())?;
            if *json {
                print_json(&state)?;
            } else {
                print_plan(&state)?;
            }
        }
        Commands::Appraise {
            address,
            details,
            details_file,
            scenario,
            json,
        } => {
            let mut state = RealtyState::new(address.as_str());
            if let Some(details) = load_details(details.as_deref(), details_file.as_ref())? {
                state = state.with_details(details);
            }
            if let Some(scenario) = scenario {
                state = state.with_scenario(scenario.as_str());
            }

            let mut ctx = build_ctx(&cli);
            let state = realty::run(state, &mut ctx)?;
            if *json {
                print_json(&state)?;
            } else {
                print_realty(&state)?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "stepgraph=debug" } else { "stepgraph=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Environment config with the command-line overrides applied.
fn build_ctx(cli: &Cli) -> Ctx {
    let mut llm = LlmConfig::from_env();
    let mut search = SearchConfig::from_env();

    if let Some(model) = &cli.model {
        llm.model = model.clone();
    }
    if let Some(temperature) = cli.temperature {
        llm.temperature = temperature;
    }
    if let Some(secs) = cli.timeout_secs {
        llm.timeout = Duration::from_secs(secs);
        search.timeout = Duration::from_secs(secs);
    }

    Ctx::from_config(llm, search)
}

fn load_details(inline: Option<&str>, file: Option<&PathBuf>) -> Result<Option<Value>> {
    let text = match (inline, file) {
        (Some(inline), _) => inline.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading details file {}", path.display()))?,
        (None, None) => return Ok(None),
    };
    let details: Value = serde_json::from_str(&text).context("parsing property details JSON")?;
    anyhow::ensure!(details.is_object(), "property details must be a JSON object");
    Ok(Some(details))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_log(log: &[String]) {
    for (i, line) in log.iter().enumerate() {
        println!("{}. {line}", i + 1);
    }
}

fn print_plan(state: &PlanState) -> Result<()> {
    println!("\n==================== FINAL RESULT ====================");
    println!("Task: {}", state.task);
    println!("Approved: {}", state.approved);
    println!("Attempts: {}", state.attempts);

    println!("\n--- Planner Output ---");
    print_json(&state.plan)?;

    println!("\n--- Reviewer Feedback ---");
    print_json(&state.review)?;

    println!("\n--- Interaction Log ---");
    print_log(&state.log);
    println!("======================================================\n");
    Ok(())
}

fn print_realty(state: &RealtyState) -> Result<()> {
    println!("\n==================== FINAL RESULT ====================");
    println!("Property: {}", state.property_address);

    println!("\n--- Research Data ---");
    print_json(&state.research_data)?;

    println!("\n--- Valuation Data ---");
    print_json(&state.valuation_data)?;

    println!("\n--- Final Report ---");
    println!("{}", state.final_report.as_deref().unwrap_or_default());

    println!("\n--- Interaction Log ---");
    print_log(&state.log);

    println!("\n--- Trace ({} entries) ---", state.trace.len());
    print_json(&state.trace)?;

    if state.is_degraded() {
        println!("\nDegraded steps: {}", state.degraded.join(", "));
    }
    println!("======================================================\n");
    Ok(())
}

// Flowrun CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Logs go to stderr so structured output on stdout stays clean.

mod commands;
mod output;
mod telemetry;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use output::OutputFormat;
use telemetry::{init_telemetry, TelemetryConfig};

#[derive(Parser)]
#[command(name = "flowrun")]
#[command(about = "Flowrun CLI - Run sequential workflows with retrying activities")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Only log warnings and errors (overridden by RUST_LOG)
    #[arg(long, short)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a workflow built from activity specs
    Run(commands::run::RunArgs),

    /// Run the built-in demonstration scenarios
    Demo {
        /// Scenario to run
        #[arg(default_value = "all", value_parser = ["retry", "abort", "all"])]
        scenario: String,

        /// Delay between retries in milliseconds
        #[arg(long, default_value_t = 2000)]
        delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "warn" } else { "info" };
    init_telemetry(TelemetryConfig::from_env().with_default_filter(default_filter));

    let format = OutputFormat::parse(&cli.output);

    let succeeded = match cli.command {
        Commands::Run(args) => commands::run::run(args, format).await?,
        Commands::Demo { scenario, delay_ms } => {
            commands::demo::run(&scenario, delay_ms, format).await?
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

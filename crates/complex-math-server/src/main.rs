use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use complex_math_server::app_state::AppState;
use complex_math_server::{handlers, transport};

#[derive(Parser)]
#[command(
    name = "complex-math",
    version,
    about = "Math tools (calculate, quadratic_solve, matrix_det) over line-delimited JSON-RPC"
)]
struct Cli {
    /// Log filter directives. Logs go to stderr; stdout carries protocol frames only.
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer JSON-RPC requests on stdin/stdout until stdin closes (default)
    Serve,

    /// Print the tool schemas reported by `tools/list`
    Tools,

    /// Run a single tool call and print its result
    Call {
        /// Tool name
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(default_value = "{}")]
        arguments: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let state = AppState::default();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!(
                server = state.server_info.name,
                protocol = state.server_info.protocol_version,
                "serving on stdio"
            );

            let summary = transport::serve(
                &state,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await
            .context("stdio transport failed")?;

            tracing::info!(
                lines = summary.lines,
                responses = summary.responses,
                "end of input, shutting down"
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(state.tools.definitions())?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Call { tool, arguments } => {
            let arguments: Map<String, Value> =
                serde_json::from_str(&arguments).context("arguments must be a JSON object")?;

            match handlers::call_tool(&state, &tool, &arguments) {
                Ok(result) => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                    Ok(if result.is_error() {
                        ExitCode::FAILURE
                    } else {
                        ExitCode::SUCCESS
                    })
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    Ok(ExitCode::from(2))
                }
            }
        }
    }
}

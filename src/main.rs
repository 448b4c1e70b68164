//! Shapley Attribution - Main Entry Point
//!
//! Runs exact coalition attribution from the command line.

use clap::Parser;
use shapley_attribution::cli::{cmd_explain, cmd_info, Cli, Commands, ExplainOverrides};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shapley_attribution=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Explain {
            data,
            target,
            coefficients,
            intercept,
            config,
            threads,
            max_features,
            weighting,
            decimals,
            timeout_ms,
            json,
        } => {
            let overrides = ExplainOverrides {
                config,
                threads,
                max_features,
                weighting,
                decimals,
                timeout_ms,
            };
            cmd_explain(&data, &target, &coefficients, intercept, &overrides, json)?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}

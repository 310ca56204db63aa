use std::process;

use clap::Parser;
use vcs_valet::Cli;

#[tokio::main]
async fn main() {
    // Logs go to stderr: stdout belongs to command output and the hook
    // protocol. RUST_LOG overrides the default "warn" filter.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = Cli::parse().execute().await {
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {err}");
            source = err.source();
        }
        process::exit(1);
    }
}

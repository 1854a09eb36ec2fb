//! `jb` — command-line entry point for jbpm, a Git-based vendoring
//! package manager for jsonnet-style configuration modules.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jbpm::cli::Cli;
use jbpm::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let rust_log_exists = std::env::var("RUST_LOG").is_ok();
    let filter = if rust_log_exists {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    } else if cli.verbose() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_thread_ids(false).init();

    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let ctx = user_friendly_error(e);
            ctx.display();
            std::process::exit(1);
        }
    }
}

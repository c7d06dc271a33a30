mod aeronet;
mod app;
mod config;
mod cql2;
mod sql;

use anyhow::Result;
use clap::Parser;

use app::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let start = std::time::Instant::now();
    let output = app::run(&cli)?;
    println!("{}", output);

    tracing::info!("Done in {:.4}s", start.elapsed().as_secs_f64());

    Ok(())
}

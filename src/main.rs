use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    scripmap::logging::init().context("init logging")?;

    let cli = scripmap::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        scripmap::cli::Command::View(args) => {
            scripmap::view::run(&cli.base_url, args)
                .await
                .context("view")?;
        }
        scripmap::cli::Command::Markers(args) => {
            scripmap::plot::run(&cli.base_url, args)
                .await
                .context("markers")?;
        }
    }

    Ok(())
}

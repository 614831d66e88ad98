use clap::Parser;

mod client;
mod commands;
mod http;
mod logging;

use commands::cli;
use maptoposter_core::config;
use maptoposter_core::error::CliError;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = cli::Args::parse();

    let mut cfg = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load_default()?,
    };
    if let Some(level) = &args.log_level {
        cfg.logging.level = level.clone();
    }

    let guard = logging::init_tracing(&cfg.logging)?;
    let exit = dispatch(args.command, cfg).await?;

    // Flush the file appender before exiting.
    drop(guard);
    if exit != 0 {
        std::process::exit(exit);
    }
    Ok(())
}

async fn dispatch(cmd: cli::Commands, cfg: config::AppConfig) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Serve(serve_args) => {
            commands::serve::handle_serve(serve_args, cfg).await?;
            Ok(0)
        }
        cli::Commands::Generate(generate_args) => {
            commands::generate::handle_generate(generate_args, &cfg).await
        }
    }
}

use std::process::ExitCode;

use clap::Parser;

mod client;
mod commands;
mod config;
mod error;
mod output;
mod prompt;

#[derive(Parser, Debug)]
#[command(name = "branchline_admin")]
#[command(about = "Admin forms for branchline: expense types, investments, users and passwords")]
struct Cli {
    #[command(flatten)]
    config: config::ConfigArgs,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match config::load(&cli.config) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "branchline_admin={level},forms={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    match run(&settings, cli.command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("[error] {err}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the command and prints its notices. `Ok(false)` when the command
/// ended in an error notice.
async fn run(settings: &config::AppConfig, command: commands::Command) -> error::Result<bool> {
    let session = settings.session()?;
    let client = client::Client::new(settings)?;
    let notices = commands::run(&client, &session, command).await?;
    for notice in &notices {
        output::print_notice(notice);
    }
    Ok(notices.last().is_none_or(|notice| !notice.is_error()))
}

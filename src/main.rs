//! mdcms - admin toolkit for a Markdown CMS.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, Session};
use mdcms_admin::config::AdminConfig;
use mdcms_admin::{debug, logger};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Slug { text } => {
            cli::slug(text);
            Ok(())
        }
        Commands::Validate { args } => cli::validate(args),
        Commands::Login { username, password } => {
            cli::login(&open_session(&cli)?, username, password.as_deref()).await
        }
        Commands::Logout => {
            cli::logout(&open_session(&cli)?);
            Ok(())
        }
        Commands::Request { args } => cli::request(&open_session(&cli)?, args).await,
        Commands::Files(command) => cli::files(&open_session(&cli)?, command).await,
        Commands::Folders(command) => cli::folders(&open_session(&cli)?, command).await,
        Commands::Edit { args } => cli::edit::run(&open_session(&cli)?, args).await,
    }
}

/// Config and api client for commands that talk to the CMS.
fn open_session(cli: &Cli) -> Result<Session> {
    Ok(Session::new(load_config(cli)?))
}

fn load_config(cli: &Cli) -> Result<AdminConfig> {
    let cwd = std::env::current_dir()?;
    let mut config = AdminConfig::load(&cwd, &cli.config)?;

    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
        config.validate()?;
    }

    match &config.config_path {
        Some(path) => debug!("config"; "loaded {}", path.display()),
        None => debug!("config"; "no {} found, using defaults", cli.config.display()),
    }
    Ok(config)
}

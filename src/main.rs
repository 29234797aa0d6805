mod api;
mod cli;
mod commands;
mod config;
mod form;
mod location;
mod lookup;
mod models;
mod ui;
mod view;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use api::transport::HttpTransport;
use api::ApiClient;
use cli::{Cli, Commands};
use commands::EditArgs;
use config::Config;
use location::{Location, Page};
use lookup::ask_user_confirmation;
use view::controller::TaskController;

fn init_logging(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()?;
        }
        None => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        use clap_complete::{generate, Shell};
        let shell_enum = match shell.to_lowercase().as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "elvish" => Shell::Elvish,
            "powershell" => Shell::PowerShell,
            _ => {
                println!("Unsupported shell: {}", shell);
                return Ok(());
            }
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "todo-client", &mut std::io::stdout());
        return Ok(());
    }

    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    let log_file = config::log_file();
    init_logging(&cli.log_level, interactive.then_some(log_file.as_path()))?;

    let config = Config::load(cli.base_url.as_deref(), cli.config.as_deref())?;

    let page = match &cli.command {
        Some(Commands::Login { .. }) => Page::Login,
        Some(Commands::Signup { .. }) => Page::Signup,
        _ => Page::Main,
    };
    let location = Arc::new(Location::new(page));
    let transport = Arc::new(HttpTransport::new(&config.base_url)?);
    if let Err(e) = transport.load_session(&config.session_file) {
        log::warn!("Ignoring unreadable session: {:#}", e);
    }
    let api = ApiClient::new(transport.clone(), &config.base_url, location.clone());
    let controller = TaskController::new(api.clone(), config.capitalize_names);

    let rt = tokio::runtime::Runtime::new()?;
    let ok = rt.block_on(async {
        match cli.command {
            Some(Commands::Login {
                identifier,
                password,
            }) => commands::login(api, &identifier, password).await,
            Some(Commands::Signup {
                username,
                email,
                password,
            }) => commands::signup(api, &username, &email, password).await,
            Some(Commands::Logout) => commands::logout(controller).await,
            Some(Commands::Status) => commands::status(controller).await,
            Some(Commands::List { format }) => commands::list(controller, format).await,
            Some(Commands::Add { name, date, time }) => {
                commands::add(controller, name, date, time).await
            }
            Some(Commands::Edit {
                task,
                name,
                date,
                time,
                clear_date,
                clear_time,
            }) => {
                let args = EditArgs {
                    task,
                    name,
                    date,
                    time,
                    clear_date,
                    clear_time,
                };
                commands::edit(controller, args, ask_user_confirmation).await
            }
            Some(Commands::Delete { task, yes }) => {
                commands::delete(controller, &task, yes, ask_user_confirmation).await
            }
            Some(Commands::Completions { .. }) => Ok(true),
            Some(Commands::Tui) | None => ui::run_tui(controller, api).await.map(|_| true),
        }
    })?;

    if let Err(e) = transport.save_session(&config.session_file) {
        log::warn!("Could not save session: {:#}", e);
    }

    let notices = location.take_notices();
    for notice in &notices {
        eprintln!("{}", notice);
    }
    if !ok || !notices.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

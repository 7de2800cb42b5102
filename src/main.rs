use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use stepform::app::App;
use stepform::config::Config;
use stepform::logging;
use stepform::rest;
use stepform::ui::install_panic_hook;
use stepform::wizard::{
    CancellationToken, LoadError, OptionSet, RemoteOptionsLoader, WizardDefinition,
};

#[derive(Parser)]
#[command(name = "stepform")]
#[command(about = "Multi-step form wizard with validated steps and remote options")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Wizard definition file (toml, yaml or json) instead of the builtin flow
    #[arg(long, global = true)]
    definition: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dev options server
    Serve {
        /// Port to listen on (default: 3001)
        #[arg(short, long)]
        port: Option<u16>,

        /// Artificial latency per request in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Fetch an option set and print it
    Options {
        /// Endpoint to fetch (default: options.endpoint from config)
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Load a wizard definition and report problems
    ValidateDefinition {
        /// Definition file to check
        file: PathBuf,
    },

    /// Write the effective configuration to .stepform/config.toml
    InitConfig {
        /// Replace an existing project config
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    // TUI mode owns the terminal, so it logs to a file
    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Serve { port, delay_ms }) => {
            cmd_serve(&config, port, delay_ms).await?;
        }
        Some(Commands::Options { endpoint }) => {
            cmd_options(&config, endpoint).await?;
        }
        Some(Commands::ValidateDefinition { file }) => {
            cmd_validate_definition(&file)?;
        }
        Some(Commands::InitConfig { force }) => {
            cmd_init_config(&config, force)?;
        }
        None => {
            let definition = load_definition(&config, cli.definition.as_deref())?;
            run_tui(config, definition, logging_handle.log_file_path)?;
        }
    }

    Ok(())
}

fn load_definition(config: &Config, path: Option<&Path>) -> Result<WizardDefinition> {
    match path {
        Some(path) => WizardDefinition::load(path)
            .with_context(|| format!("Failed to load definition {}", path.display())),
        None => WizardDefinition::builtin(&config.options.endpoint)
            .context("Failed to build builtin definition"),
    }
}

fn run_tui(
    config: Config,
    definition: WizardDefinition,
    log_file_path: Option<PathBuf>,
) -> Result<()> {
    install_panic_hook();

    let app = App::new(config, definition)?;
    let result = app.run();

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }

    match result? {
        Some(answers) => {
            let json = serde_json::to_string_pretty(&answers)
                .context("Failed to serialize submitted answers")?;
            println!("{}", json);
        }
        None => eprintln!("Wizard closed without submitting."),
    }

    Ok(())
}

async fn cmd_serve(config: &Config, port: Option<u16>, delay_ms: Option<u64>) -> Result<()> {
    let port = port.unwrap_or(config.server.port);
    let mut server_config = config.server.clone();
    if let Some(delay_ms) = delay_ms {
        server_config.delay_ms = delay_ms;
    }

    println!("Starting options server...");
    println!("  Port: {}", port);
    println!("  Delay: {}ms", server_config.delay_ms);
    println!("  Endpoints:");
    println!("    GET  /api/colors      Favorite colors ({} values)", server_config.colors.len());
    println!("    GET  /api/v1/health   Health check");
    println!("    GET  /api/v1/status   Server status");
    println!();

    let state = rest::OptionsServerState::from_config(&server_config);
    rest::serve(state, port).await?;

    Ok(())
}

async fn cmd_options(config: &Config, endpoint: Option<String>) -> Result<()> {
    let endpoint = endpoint.unwrap_or_else(|| config.options.endpoint.clone());
    let loader = RemoteOptionsLoader::http(config.options_timeout());
    let token = CancellationToken::new();

    let fetch = loader.load(&endpoint, &token);
    let result = tokio::select! {
        result = fetch => result,
        _ = tokio::signal::ctrl_c() => {
            token.cancel();
            Err(LoadError::Cancelled)
        }
    };

    match result {
        Ok(OptionSet::Loaded(values)) if values.is_empty() => {
            println!("No options available");
        }
        Ok(options) => {
            for value in options.values().unwrap_or_default() {
                println!("{}", value);
            }
        }
        Err(LoadError::Cancelled) => {
            eprintln!("Cancelled.");
        }
        Err(LoadError::Failure(failure)) => {
            return Err(failure).context("Failed to load options");
        }
    }

    Ok(())
}

fn cmd_init_config(config: &Config, force: bool) -> Result<()> {
    let existing = Config::local_config_path();
    if existing.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            existing.display()
        );
    }

    let path = config.save()?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn cmd_validate_definition(file: &Path) -> Result<()> {
    let definition = WizardDefinition::load(file)
        .with_context(|| format!("Invalid definition {}", file.display()))?;

    println!("Definition '{}' is valid", definition.name);
    for (index, step) in definition.steps.iter().enumerate() {
        let terminal = if index + 1 == definition.steps.len() {
            " (terminal)"
        } else {
            ""
        };
        println!("  {}. {} - {}{}", index + 1, step.id, step.title, terminal);
        for field in &step.fields {
            println!(
                "       {} [{:?}] {} rule(s)",
                field.name,
                field.kind,
                field.rules.len()
            );
        }
    }

    Ok(())
}

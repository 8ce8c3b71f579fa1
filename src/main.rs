//! glesys-server CLI entrypoint.
//!
//! This is the main entrypoint for the glesys-server command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use glesys_server::cli::{Cli, Commands, OutputFormatter};
use glesys_server::config::{
    find_config_file, ConfigParser, ConfigValidator, CredentialResolver, ServerConfig, TargetState,
};
use glesys_server::error::Result;
use glesys_server::glesys::{find_server, GlesysClient};
use glesys_server::reconciler::Reconciler;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // One reconciliation per process, every call awaited in turn
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", formatter.error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let config_path = cli.config.as_ref();

    match cli.command {
        Commands::Init { ref path, force } => cmd_init(path, force, formatter),
        Commands::Validate { warnings } => cmd_validate(config_path, warnings, formatter),
        Commands::Plan { detailed } => cmd_plan(&cli, detailed, formatter).await,
        Commands::Apply { check } => cmd_apply(&cli, check, formatter).await,
        Commands::Status => cmd_status(&cli, formatter).await,
        Commands::Destroy { yes, check } => cmd_destroy(&cli, yes, check, formatter).await,
    }
}

/// Writes a starter configuration.
fn cmd_init(path: &Path, force: bool, formatter: &OutputFormatter) -> Result<()> {
    info!("Initializing glesys-server configuration in: {}", path.display());

    let config_path = path.join("server.yaml");
    let env_path = path.join(".env.example");
    let gitignore_path = path.join(".gitignore");

    if !force && config_path.exists() {
        eprintln!("Configuration file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    std::fs::write(&config_path, include_str!("../templates/server.yaml"))?;
    eprintln!("Created: {}", config_path.display());

    std::fs::write(&env_path, include_str!("../templates/.env.example"))?;
    eprintln!("Created: {}", env_path.display());

    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        if !existing.lines().any(|l| l.trim() == ".env") {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&gitignore_path)?;
            writeln!(file, "\n# GleSYS credentials\n.env")?;
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, ".env\n")?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    println!("{}", formatter.success("Configuration initialized"));
    eprintln!("\nNext steps:");
    eprintln!("  1. Copy .env.example to .env and fill in your API key");
    eprintln!("  2. Edit server.yaml");
    eprintln!("  3. Run 'glesys-server plan' to see what would change");
    eprintln!("  4. Run 'glesys-server apply' to reconcile the server");

    Ok(())
}

/// Validates the configuration.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config_file = resolve_config_path(config_path)?;
    info!("Validating configuration: {}", config_file.display());

    let config = ConfigParser::new().load_file(&config_file)?;
    let result = ConfigValidator::new().validate(&config)?;

    println!("{}", formatter.format_validation(&config, &result, show_warnings));
    Ok(())
}

/// Shows what apply would do.
async fn cmd_plan(cli: &Cli, detailed: bool, formatter: &OutputFormatter) -> Result<()> {
    let (config, client) = load_config_and_client(cli)?;

    let plan = Reconciler::new(&client).plan(&config.server).await?;
    println!("{}", formatter.format_plan(&plan, detailed));
    Ok(())
}

/// Reconciles the server.
async fn cmd_apply(cli: &Cli, check: bool, formatter: &OutputFormatter) -> Result<()> {
    let (config, client) = load_config_and_client(cli)?;

    let outcome = Reconciler::new(&client)
        .with_dry_run(check)
        .reconcile(&config.server)
        .await?;

    println!("{}", formatter.format_outcome(&outcome));
    Ok(())
}

/// Shows the current server.
async fn cmd_status(cli: &Cli, formatter: &OutputFormatter) -> Result<()> {
    let (config, client) = load_config_and_client(cli)?;

    let snapshot = find_server(
        &client,
        config.server.serverid.as_deref(),
        config.server.hostname.as_deref(),
    )
    .await?;

    println!("{}", formatter.format_status(snapshot.as_ref()));
    Ok(())
}

/// Deletes the server.
async fn cmd_destroy(
    cli: &Cli,
    auto_approve: bool,
    check: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (config, client) = load_config_and_client(cli)?;
    let desired = config.server.with_state(TargetState::Absent);

    if !auto_approve && !check {
        eprint!(
            "Server {} will be destroyed. This action is IRREVERSIBLE. Type 'destroy' to confirm: ",
            desired.label()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim() != "destroy" {
            eprintln!("Destruction cancelled.");
            return Ok(());
        }
    }

    let outcome = Reconciler::new(&client)
        .with_dry_run(check)
        .reconcile(&desired)
        .await?;

    println!("{}", formatter.format_outcome(&outcome));
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Loads and validates the configuration, then builds an API client from
/// the resolved credentials.
fn load_config_and_client(cli: &Cli) -> Result<(ServerConfig, GlesysClient)> {
    let config_file = resolve_config_path(cli.config.as_ref())?;
    debug!("Loading configuration from: {}", config_file.display());

    let parser = ConfigParser::new().with_base_path(
        config_file
            .parent()
            .unwrap_or_else(|| Path::new(".")),
    );
    parser.load_dotenv()?;

    let config = parser.load_file(&config_file)?;
    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    let credentials = CredentialResolver::new()
        .with_flags(cli.project.clone(), cli.api_key.clone())
        .with_file(&config.credentials)
        .resolve()?;

    let client = GlesysClient::new(&credentials)?;
    Ok((config, client))
}

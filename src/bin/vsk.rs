use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vsk::{
    Error, VskResult,
    config::VskConfig,
    loader::{LoadError, LoadResult, ScriptLoader},
    provider::plugins::host::in_memory::{InMemoryProxy, InMemorySession},
    runtime::{CommandOutcome, ScriptRuntime},
    variable::VariableManager,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, default_value = "vsk.json", global = true)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse scripts and print their diagnostics
    Check(CheckArgs),

    /// Run one command of a script against a simulated proxy
    Run(RunArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Script files or directories of scripts; defaults to the configured
    /// scripts directory
    paths: Vec<PathBuf>,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Script file defining the command
    script: PathBuf,

    /// Name of the invoking player
    #[arg(short, long, default_value = "Player")]
    player: String,

    /// Server the player is connected to
    #[arg(short, long)]
    server: Option<String>,

    /// Additional servers known to the proxy
    #[arg(long = "destination")]
    destinations: Vec<String>,

    /// Permissions granted to the player
    #[arg(long = "permission")]
    permissions: Vec<String>,

    /// Grant every permission
    #[arg(long)]
    op: bool,

    /// Command line to run, e.g. `-- /greet Bob`
    #[arg(last = true, required = true)]
    invocation: Vec<String>,
}

fn load_config(path: &Path) -> VskResult<VskConfig> {
    if path.exists() {
        Ok(VskConfig::from_file(path)?)
    } else {
        debug!("No config at {}, using defaults", path.display());
        Ok(VskConfig::default())
    }
}

fn report(result: &LoadResult) {
    for script in &result.scripts {
        println!(
            "ok    {} ({} command(s), {} event trigger(s))",
            script.name,
            script.commands.len(),
            script.events.len()
        );
    }
    for failure in &result.failures {
        println!("error {}", failure);
        if let LoadError::Parse { errors, .. } = failure {
            for e in errors {
                println!("  {}", e);
            }
        }
    }
}

fn check_paths(args: &CheckArgs, config: &VskConfig) -> Vec<PathBuf> {
    if args.paths.is_empty() {
        vec![config.scripts_dir.clone()]
    } else {
        args.paths.clone()
    }
}

fn check(args: &CheckArgs, config: &VskConfig) -> bool {
    let mut clean = true;
    for path in check_paths(args, config) {
        let result = if path.is_dir() {
            ScriptLoader::new(path).load_all()
        } else {
            let mut result = LoadResult::default();
            match ScriptLoader::parse_file(&path) {
                Ok(script) => result.scripts.push(script),
                Err(e) => result.failures.push(e),
            }
            result
        };
        report(&result);
        clean &= result.is_clean();
    }
    clean
}

fn run_command(args: &RunArgs, config: &VskConfig) -> VskResult<bool> {
    let script = ScriptLoader::parse_file(&args.script)?;

    let store = config.storage.open()?;
    let variables = Arc::new(VariableManager::new(store));
    variables.load_globals();

    let proxy = InMemoryProxy::new();
    for destination in args.server.iter().chain(&args.destinations) {
        proxy.add_destination(destination.as_str());
    }
    let mut session = InMemorySession::new(args.player.as_str());
    if let Some(server) = &args.server {
        session = session.with_destination(server.as_str());
    }
    for permission in &args.permissions {
        session = session.with_permission(permission.as_str());
    }
    if args.op {
        session = session.operator();
    }
    let session = proxy.connect(session);

    let runtime = ScriptRuntime::new(Arc::new(proxy.clone()), Arc::clone(&variables), config);
    runtime.register(std::slice::from_ref(&script));

    let (label, rest) = args
        .invocation
        .split_first()
        .ok_or_else(|| Error::internal("No command given"))?;
    let outcome = runtime.dispatch_command(label, Some(session.clone()), rest);
    info!("/{} finished: {}", label.trim_start_matches('/'), outcome);

    for message in session.messages() {
        println!("[to {}] {}", args.player, message);
    }
    for destination in session.transfers() {
        println!("[transfer] {} -> {}", args.player, destination);
    }
    match outcome {
        CommandOutcome::Unknown => {
            eprintln!("Unknown command: {}", label);
            Ok(false)
        }
        CommandOutcome::Failed => Ok(false),
        _ => Ok(true),
    }
}

fn run(cli: &Cli) -> VskResult<bool> {
    let config = load_config(&cli.config)?;
    debug!("config: {:?}", config);
    match &cli.command {
        Commands::Check(args) => Ok(check(args, &config)),
        Commands::Run(args) => run_command(args, &config),
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_defaults_to_scripts_dir() {
        let config = VskConfig {
            scripts_dir: PathBuf::from("proxy/scripts"),
            ..Default::default()
        };
        let cli = Cli::parse_from(["vsk", "check"]);
        let Commands::Check(args) = &cli.command else {
            panic!("expected check");
        };
        assert_eq!(check_paths(args, &config), vec![PathBuf::from("proxy/scripts")]);

        let cli = Cli::parse_from(["vsk", "check", "a.vsk", "more"]);
        let Commands::Check(args) = &cli.command else {
            panic!("expected check");
        };
        assert_eq!(
            check_paths(args, &config),
            vec![PathBuf::from("a.vsk"), PathBuf::from("more")]
        );
    }
}

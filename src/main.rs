use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use command_gate::config::non_empty_list;
use command_gate::{
    CommandGate, ExecutionRequest, GateDecision, Platform, PolicyConfiguration, PolicyOverrides,
    ProjectConfig,
};

#[derive(Parser)]
#[command(name = "command-gate", version)]
#[command(about = "Policy gate for agent-requested shell commands", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Comma-separated commands that bypass the deny-list
    #[arg(long, global = true)]
    allowed_commands: Option<String>,

    /// Comma-separated deny-list replacing the built-in one
    #[arg(long, global = true)]
    restricted_commands: Option<String>,

    /// Comma-separated roots added to the built-in restricted directories
    #[arg(long, global = true)]
    restricted_directories: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a command and its path arguments are permitted
    Check {
        /// Command, cmdlet or alias name
        name: String,

        /// Path argument to check (repeatable)
        #[arg(short, long = "path")]
        paths: Vec<String>,

        /// Working directory of the request
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the built-in deny-list and restricted roots
    Defaults {
        /// Platform to show (windows, unix); defaults to the host
        #[arg(long)]
        platform: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive("warn".parse().expect("valid log directive"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    fn overrides(&self) -> PolicyOverrides {
        PolicyOverrides {
            allowed_commands: self.allowed_commands.as_deref().and_then(non_empty_list),
            restricted_commands: self.restricted_commands.as_deref().and_then(non_empty_list),
            restricted_directories: self
                .restricted_directories
                .as_deref()
                .and_then(non_empty_list),
        }
    }

    /// Precedence: CLI flags > env > project file > global file > defaults.
    fn load_config(&self) -> Result<ProjectConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = ProjectConfig::load_file(path)?;
                config
                    .policy
                    .merge(command_gate::config::env_overrides(|k| std::env::var(k).ok()));
                config
            }
            None => ProjectConfig::load().context("failed to load configuration")?,
        };
        config.policy.merge(self.overrides());
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Check {
            name,
            paths,
            cwd,
            json,
        } => {
            let config = cli.load_config()?;
            let policy = config
                .policy_configuration()
                .context("invalid policy configuration")?;
            debug!(
                platform = %policy.platform(),
                roots = policy.restricted_roots().len(),
                custom_deny_list = policy.has_custom_deny_list(),
                "policy loaded"
            );

            let working_directory = match cwd {
                Some(dir) => dir.clone(),
                None => std::env::current_dir().context("failed to read current directory")?,
            };
            let gate = CommandGate::new(policy).with_working_directory(working_directory);
            let request = ExecutionRequest::new(name.as_str()).paths(paths.iter().cloned());

            let result = gate.check(&request);
            if *json {
                let decision = GateDecision::from(&result);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&decision).context("failed to serialize decision")?
                );
            }

            match result {
                Ok(()) => {
                    info!(command = %name, "allowed");
                    if !*json {
                        println!("allowed");
                    }
                }
                Err(violation) => {
                    eprintln!("denied: {}", violation);
                    std::process::exit(1);
                }
            }
        }

        Commands::Defaults { platform } => {
            let platform = match platform {
                Some(p) => p.parse::<Platform>()?,
                None => Platform::current(),
            };
            let policy = PolicyConfiguration::defaults(platform);

            println!("platform: {}", platform);
            println!("\nrestricted commands:");
            for name in policy.restricted_commands().sorted() {
                println!("  {}", name);
            }
            println!("\nrestricted roots:");
            for root in policy.restricted_roots() {
                let kind = if root.is_namespace() { "namespace" } else { "directory" };
                println!("  {:<10} {}", kind, root);
            }
        }
    }

    Ok(())
}

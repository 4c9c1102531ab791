// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIP3-SIM CLI - run token scenarios against the message simulator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tip3_vm::SimConfig;

mod commands;

#[derive(Parser)]
#[command(name = "tip3-sim")]
#[command(about = "TIP-3 token simulator - scenarios, code registry, config", long_about = None)]
#[command(version)]
struct Cli {
    /// Simulator config file (TOML). TIP3_SIM_* variables override it.
    #[arg(short, long, env = "TIP3_SIM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the code artifacts a simulator can deploy
    Codes,

    /// Run one or more JSON scenario files
    Run {
        /// Scenario files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Keep going after a failing scenario
        #[arg(long)]
        keep_going: bool,
    },

    /// Run the built-in mint/transfer/burn walkthrough
    Demo,

    /// Print the effective simulator config
    Config,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(cli: &Cli) -> Result<SimConfig, tip3_vm::SimError> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::load_from_file(path)?,
        None => SimConfig::default(),
    };
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    match &cli.command {
        Commands::Codes => commands::codes::handle(cli.json),
        Commands::Run { files, keep_going } => {
            commands::run::handle(&config, files, *keep_going, cli.json)
        }
        Commands::Demo => commands::run::demo(&config, cli.json),
        Commands::Config => commands::codes::show_config(&config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

// ─────────────────────────────────────────────────────────────────
// UNIT TESTS
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_codes() {
        let cli = Cli::try_parse_from(["tip3-sim", "codes"]).unwrap();
        assert!(matches!(cli.command, Commands::Codes));
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_run_files() {
        let cli = Cli::try_parse_from([
            "tip3-sim",
            "run",
            "a.json",
            "b.json",
            "--keep-going",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Run { files, keep_going } => {
                assert_eq!(files, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
                assert!(keep_going);
            }
            _ => panic!("Expected Run"),
        }
    }

    #[test]
    fn test_cli_run_needs_a_file() {
        assert!(Cli::try_parse_from(["tip3-sim", "run"]).is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(["tip3-sim", "demo", "-vv", "--config", "sim.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("sim.toml")));
        assert!(matches!(cli.command, Commands::Demo));
    }

    #[test]
    fn test_cli_unknown_command() {
        assert!(Cli::try_parse_from(["tip3-sim", "deploy"]).is_err());
    }
}

//! invql Command-Line Shell
//!
//! Runs inventory queries from the command line, a script file or an
//! interactive prompt.

mod commands;
mod completer;
mod config;
mod executor;
mod formatter;
mod repl;

use clap::Parser;
use config::ShellConfig;
use executor::Session;
use formatter::OutputFormat;
use invql_core::ScopeOptions;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// invql Command-Line Shell
#[derive(Parser, Debug)]
#[command(name = "invql")]
#[command(version, about = "Query a machine inventory")]
pub struct Args {
    /// JSON inventory file
    #[arg(short = 'i', long, env = "INVQL_INVENTORY", default_value = config::DEFAULT_INVENTORY)]
    pub inventory: PathBuf,

    /// Execute a single query and exit
    #[arg(short = 'c', long)]
    pub command: Option<String>,

    /// Execute queries from file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Include hosts that are not active
    #[arg(long)]
    pub include_inactive: bool,

    /// Include administrative hosts
    #[arg(long)]
    pub include_administrative: bool,

    /// REPL history file
    #[arg(long)]
    pub history: Option<PathBuf>,
}

impl Args {
    fn shell_config(&self) -> ShellConfig {
        let config = ShellConfig::new(&self.inventory)
            .with_format(self.format)
            .with_scope_options(ScopeOptions {
                include_inactive: self.include_inactive,
                include_administrative: self.include_administrative,
            });
        match &self.history {
            Some(path) => config.with_history_path(path),
            None => config,
        }
    }
}

fn main() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "invql_cli=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(args.shell_config())?;

    if let Some(command) = &args.command {
        run_command_mode(&session, command);
        Ok(())
    } else if let Some(file) = &args.file {
        run_script_mode(&session, file)
    } else {
        repl::run(session)
    }
}

/// Execute a single query and exit.
fn run_command_mode(session: &Session, command: &str) {
    let formatter = formatter::create_formatter(session.config().format);

    match session.execute(command, &*formatter) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Execute queries from a file.
fn run_script_mode(session: &Session, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let formatter = formatter::create_formatter(session.config().format);

    for statement in script_statements(&content) {
        match session.execute(statement, &*formatter) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
            Err(e) => {
                eprintln!("Error executing '{}': {}", statement, e);
            }
        }
    }

    Ok(())
}

/// Non-empty lines that are not comments.
fn script_statements(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with("//") && !l.starts_with('#'))
        .collect()
}

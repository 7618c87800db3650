use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// `weavec` accepts both the modern subcommand form and the historical
/// `weavec <FILE> [-c|-t]` invocation the original CLI used — `command`
/// is `None` whenever the caller used the legacy form.
#[derive(Parser, Debug)]
#[command(name = "weavec", version, about = "Compiler and interactive runner for Weave dialogue graphs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Source (`.qsi`) or compiled (`.bsi`) file, legacy form only
    pub file: Option<PathBuf>,

    /// Print disassembly instead of running (legacy form of `compile`)
    #[arg(short = 'c')]
    pub legacy_compile: bool,

    /// Run the VM over stdin/stdout (legacy form of `run`)
    #[arg(short = 't')]
    pub legacy_run: bool,

    /// Raise the tracing filter by one step per occurrence, layered under `RUST_LOG`
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a `.qsi`/`.bsi` file and print its disassembly
    Compile { file: PathBuf },
    /// Compile (or load) a file and run it interactively over stdin/stdout
    Run { file: PathBuf },
}

/// What the resolved CLI invocation, modern or legacy, asks for.
pub enum Action {
    Compile(PathBuf),
    Run(PathBuf),
}

impl Cli {
    pub fn resolve(self) -> Result<Action, String> {
        if let Some(command) = self.command {
            return Ok(match command {
                Command::Compile { file } => Action::Compile(file),
                Command::Run { file } => Action::Run(file),
            });
        }

        let file = self
            .file
            .ok_or_else(|| "usage: weavec <FILE> [-c|-t]  (or: weavec compile|run <FILE>)".to_string())?;
        match (self.legacy_compile, self.legacy_run) {
            (true, false) => Ok(Action::Compile(file)),
            (false, true) => Ok(Action::Run(file)),
            (false, false) => Err("pass -c or -t, or use the `compile`/`run` subcommand".to_string()),
            (true, true) => Err("pass only one of -c or -t".to_string()),
        }
    }
}

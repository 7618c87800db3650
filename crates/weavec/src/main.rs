//! `weavec` — compile and interactively run Weave dialogue graphs.

mod cli;
mod commands;
mod diagnostics;

use clap::Parser;
use colored::Colorize;

use cli::{Action, Cli};

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level(verbose)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = cli.resolve().and_then(|action| match action {
        Action::Compile(path) => commands::compile::run(&path),
        Action::Run(path) => commands::run::run(&path),
    });

    if let Err(message) = result {
        eprintln!("{} {message}", "[weavec]".red());
        std::process::exit(1);
    }
}

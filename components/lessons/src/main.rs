//! Corten async walkthrough CLI
//!
//! Parses CLI arguments, sets up logging and hands the chosen lesson to
//! the Runner.

use clap::Parser;
use lessons::{Cli, Console, LessonConfig, LessonError, Runner};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let config = LessonConfig::from_cli(&cli);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runner = match Runner::new(&config, Console::stdio()) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match runner.run(&cli.lesson) {
        Ok(()) => {}
        Err(LessonError::Uncaught(reason)) => {
            eprintln!("Uncaught (in promise) {}", reason);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "monk")]
#[command(about = "Read-eval-print loop for the Monk language")]
#[command(version)]
pub struct Config {
    /// Program to run as a whole instead of starting the prompt
    pub file: Option<PathBuf>,

    /// Prompt printed before reading each line
    #[arg(long, default_value = ">> ")]
    pub prompt: String,

    /// Log parsing and evaluation details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

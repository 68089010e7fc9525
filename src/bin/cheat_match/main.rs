mod cheat_match;
mod config;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::cheat_match::CheatMatch;

#[derive(Parser)]
#[command(author, version, name = env!("CARGO_BIN_NAME"), about = "Copy cheat files renamed to match ROM filenames")]
struct Args {
    /// ROM directory
    #[arg(value_hint = clap::ValueHint::DirPath, required_unless_present = "SHELL")]
    roms: Option<PathBuf>,

    /// Cheat file directory
    #[arg(value_hint = clap::ValueHint::DirPath, required_unless_present = "SHELL")]
    cheats: Option<PathBuf>,

    /// Name of the output subdirectory created under the cheat directory
    #[arg(short, long, name = "NAME", default_value = "output")]
    output: String,

    /// Print debug information
    #[arg(short = 'D', long)]
    debug: bool,

    /// Only print matches without resetting the output directory or copying files
    #[arg(short, long)]
    print: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        cheat_tools::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        CheatMatch::new(args)?.run()
    }
}

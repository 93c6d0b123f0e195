//! `music-generate`

use std::process::ExitCode;

use audiogen_cli::args::MusicGenerateArgs;
use audiogen_cli::{commands, logging};
use clap::Parser;

fn main() -> ExitCode {
    let args = MusicGenerateArgs::parse();
    logging::init();
    commands::music::generate(&args)
}

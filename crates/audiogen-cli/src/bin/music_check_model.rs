//! `music-check-model`

use std::process::ExitCode;

use audiogen_cli::args::MusicCheckArgs;
use audiogen_cli::{commands, logging};
use clap::Parser;

fn main() -> ExitCode {
    let args = MusicCheckArgs::parse();
    logging::init();
    commands::music::check(&args)
}

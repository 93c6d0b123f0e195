//! `tts-check-model`

use std::process::ExitCode;

use audiogen_cli::args::TtsCheckArgs;
use audiogen_cli::{commands, logging};
use clap::Parser;

fn main() -> ExitCode {
    let args = TtsCheckArgs::parse();
    logging::init();
    commands::tts::check(&args)
}

//! `tts-generate`

use std::process::ExitCode;

use audiogen_cli::args::TtsGenerateArgs;
use audiogen_cli::{commands, logging};
use clap::Parser;

fn main() -> ExitCode {
    let args = TtsGenerateArgs::parse();
    logging::init();
    commands::tts::generate(args)
}

//! `tts-download-model`

use std::process::ExitCode;

use audiogen_cli::args::TtsDownloadArgs;
use audiogen_cli::{commands, logging};
use clap::Parser;

fn main() -> ExitCode {
    let args = TtsDownloadArgs::parse();
    logging::init();
    commands::tts::download(&args)
}

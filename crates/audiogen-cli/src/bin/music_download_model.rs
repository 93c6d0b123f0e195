//! `music-download-model`

use std::process::ExitCode;

use audiogen_cli::args::MusicDownloadArgs;
use audiogen_cli::{commands, logging};
use clap::Parser;

fn main() -> ExitCode {
    let args = MusicDownloadArgs::parse();
    logging::init();
    commands::music::download(&args)
}

//! # Audiogen Core
//!
//! Model cache, download and generation core for the Audiogen speech and
//! music command-line tools.
//!
//! ## Features
//!
//! - Presence checks against the Hugging Face hub cache and plain checkpoint directories
//! - Model downloads through `hf-hub`, including the ONNX Runtime shared library
//! - Kokoro and KittenTTS speech synthesis on ONNX Runtime
//! - 16-bit PCM WAV output
//!
//! ## Example
//!
//! ```rust,no_run
//! use audiogen_core::{load_speech_model, synthesize_to_wav, AudiogenConfig, ModelId, SpeechRequest};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = AudiogenConfig::load()?;
//!     let hf_home = audiogen_core::config::require_hf_home()?;
//!     let mut model = load_speech_model(ModelId::Kokoro, &hf_home, &config)?;
//!     let request = SpeechRequest::new("Hello, world!", "af_nova");
//!     synthesize_to_wav(model.as_mut(), &request, "hello.wav".as_ref())?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod audio;
pub mod config;
pub mod error;
pub mod model;
pub mod music;
pub mod ort_runtime;
pub mod pipeline;
pub mod speech;
pub mod wav_writer;

// Re-export main types for convenience
pub use audio::AudioBuffer;
pub use config::AudiogenConfig;
pub use error::{AudiogenError, AudiogenResult};
pub use model::{DownloadReport, ModelId, ModelInfo, ModelKind, ModelManager, ModelStatus};
pub use music::{load_music_model, GeneratedTrack, MusicModel, MusicRequest};
pub use pipeline::{compose_to_wav, synthesize_to_wav, WrittenAudio};
pub use speech::{load_speech_model, SpeechModel, SpeechRequest};

/// Version information for the audiogen-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sample rate of every speech backend (24 kHz)
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Sample rate of the music backend when it does not report one (44.1 kHz)
pub const MUSIC_SAMPLE_RATE: u32 = 44_100;
